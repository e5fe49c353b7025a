use glam::Vec2;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tileworld_common::{ChunkCoord, EntityId, TileType};
use tileworld_kernel::{DecorationKind, Entity, KernelError, TerrainChunk};

use crate::outbound::WireVec2;

/// Errors from decoding an inbound text frame.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("message has no packet_type")]
    MissingPacketType,
    #[error("unknown packet type: {0}")]
    UnknownPacketType(String),
    #[error("malformed {packet_type} packet: {source}")]
    Malformed {
        packet_type: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("unknown entity kind: {0}")]
    UnknownEntityKind(String),
    #[error(transparent)]
    Chunk(#[from] KernelError),
}

/// Every message the server can send.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundPacket {
    PlayerRegistered {
        id: EntityId,
        position: Option<Vec2>,
    },
    TerrainChunk(TerrainChunk),
    EntityLoad(Entity),
    EntityMove {
        id: EntityId,
        new_position: Vec2,
    },
    EntityDestroyed {
        id: EntityId,
    },
    ChatMessage {
        id: EntityId,
        username: String,
        message: String,
    },
    SystemMessage {
        message: String,
    },
    /// The discriminator-less `{error}` reply.
    ServerError {
        error: String,
    },
}

impl InboundPacket {
    pub fn packet_type(&self) -> &'static str {
        match self {
            InboundPacket::PlayerRegistered { .. } => "player_registered",
            InboundPacket::TerrainChunk(_) => "terrain_chunk",
            InboundPacket::EntityLoad(_) => "entity_load",
            InboundPacket::EntityMove { .. } => "entity_move",
            InboundPacket::EntityDestroyed { .. } => "entity_destroyed",
            InboundPacket::ChatMessage { .. } => "chat_message",
            InboundPacket::SystemMessage { .. } => "system_message",
            InboundPacket::ServerError { .. } => "error",
        }
    }
}

#[derive(Deserialize)]
struct RawRegistered {
    id: EntityId,
    #[serde(default)]
    position: Option<WireVec2>,
}

#[derive(Deserialize)]
struct RawChunkPacket {
    chunk: RawChunk,
}

#[derive(Deserialize)]
struct RawChunk {
    position: ChunkCoord,
    contents: Vec<TileType>,
}

#[derive(Deserialize)]
struct RawEntityLoad {
    entity: RawEntity,
}

#[derive(Deserialize)]
struct RawEntity {
    id: EntityId,
    position: WireVec2,
    value: Value,
}

#[derive(Deserialize)]
struct RawPlayerFields {
    username: String,
    #[serde(default)]
    skin: u8,
}

#[derive(Deserialize)]
struct RawMove {
    id: EntityId,
    new_position: WireVec2,
}

#[derive(Deserialize)]
struct RawDestroyed {
    id: EntityId,
}

#[derive(Deserialize)]
struct RawChat {
    id: EntityId,
    username: String,
    message: String,
}

#[derive(Deserialize)]
struct RawSystem {
    message: String,
}

/// Decode one inbound text frame.
pub fn decode(text: &str) -> Result<InboundPacket, DecodeError> {
    let value: Value = serde_json::from_str(text)?;

    if let Some(error) = value.get("error").and_then(Value::as_str) {
        return Ok(InboundPacket::ServerError {
            error: error.to_owned(),
        });
    }

    let packet_type = value
        .get("packet_type")
        .and_then(Value::as_str)
        .ok_or(DecodeError::MissingPacketType)?
        .to_owned();

    match packet_type.as_str() {
        "player_registered" => {
            let raw: RawRegistered = fields("player_registered", value)?;
            Ok(InboundPacket::PlayerRegistered {
                id: raw.id,
                position: raw.position.map(Vec2::from),
            })
        }
        "terrain_chunk" => {
            let raw: RawChunkPacket = fields("terrain_chunk", value)?;
            let chunk = TerrainChunk::from_tiles(raw.chunk.position, raw.chunk.contents)?;
            Ok(InboundPacket::TerrainChunk(chunk))
        }
        "entity_load" => {
            let raw: RawEntityLoad = fields("entity_load", value)?;
            Ok(InboundPacket::EntityLoad(entity_from_wire(raw.entity)?))
        }
        "entity_move" => {
            let raw: RawMove = fields("entity_move", value)?;
            Ok(InboundPacket::EntityMove {
                id: raw.id,
                new_position: raw.new_position.into(),
            })
        }
        "entity_destroyed" => {
            let raw: RawDestroyed = fields("entity_destroyed", value)?;
            Ok(InboundPacket::EntityDestroyed { id: raw.id })
        }
        "chat_message" => {
            let raw: RawChat = fields("chat_message", value)?;
            Ok(InboundPacket::ChatMessage {
                id: raw.id,
                username: raw.username,
                message: raw.message,
            })
        }
        "system_message" => {
            let raw: RawSystem = fields("system_message", value)?;
            Ok(InboundPacket::SystemMessage {
                message: raw.message,
            })
        }
        _ => Err(DecodeError::UnknownPacketType(packet_type)),
    }
}

fn fields<T: DeserializeOwned>(packet_type: &'static str, value: Value) -> Result<T, DecodeError> {
    serde_json::from_value(value).map_err(|source| DecodeError::Malformed {
        packet_type,
        source,
    })
}

/// `value` is either a bare decoration tag or a single-key `{tag: fields}`
/// object.
fn entity_from_wire(raw: RawEntity) -> Result<Entity, DecodeError> {
    let position = Vec2::from(raw.position);
    match raw.value {
        Value::String(tag) => decoration(raw.id, position, &tag),
        Value::Object(map) => {
            let len = map.len();
            let mut entries = map.into_iter();
            match (entries.next(), entries.next()) {
                (Some((tag, payload)), None) if tag == "player" => {
                    let p: RawPlayerFields = fields("entity_load", payload)?;
                    Ok(Entity::player(raw.id, position, p.username, p.skin))
                }
                (Some((tag, _)), None) => decoration(raw.id, position, &tag),
                _ => Err(DecodeError::UnknownEntityKind(format!(
                    "object with {len} keys"
                ))),
            }
        }
        other => Err(DecodeError::UnknownEntityKind(other.to_string())),
    }
}

fn decoration(id: EntityId, position: Vec2, tag: &str) -> Result<Entity, DecodeError> {
    let kind = tag
        .parse::<DecorationKind>()
        .map_err(|_| DecodeError::UnknownEntityKind(tag.to_owned()))?;
    Ok(Entity::decoration(id, position, kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tileworld_common::Direction;
    use tileworld_kernel::{EntityKind, IDLE_FRAME};

    #[test]
    fn decodes_registration_with_and_without_position() {
        let p = decode(r#"{"packet_type":"player_registered","id":"p1"}"#).unwrap();
        assert_eq!(
            p,
            InboundPacket::PlayerRegistered {
                id: "p1".into(),
                position: None
            }
        );
        let p = decode(r#"{"packet_type":"player_registered","id":"p1","position":{"x":2,"y":-3}}"#)
            .unwrap();
        assert_eq!(
            p,
            InboundPacket::PlayerRegistered {
                id: "p1".into(),
                position: Some(Vec2::new(2.0, -3.0))
            }
        );
    }

    #[test]
    fn decodes_decoration_string_value() {
        let p = decode(
            r#"{"packet_type":"entity_load","entity":{"id":"t1","position":{"x":3,"y":4},"value":"forest_tree"}}"#,
        )
        .unwrap();
        let InboundPacket::EntityLoad(e) = p else {
            panic!("expected entity_load");
        };
        assert_eq!(e.id, EntityId::from("t1"));
        assert_eq!(e.position, Vec2::new(3.0, 4.0));
        assert_eq!(e.kind, EntityKind::Decoration(DecorationKind::ForestTree));
        assert!(e.as_player().is_none());
    }

    #[test]
    fn decodes_player_object_value() {
        let p = decode(
            r#"{"packet_type":"entity_load","entity":{"id":"p2","position":{"x":1.5,"y":0},"value":{"player":{"username":"bob","skin":2}}}}"#,
        )
        .unwrap();
        let InboundPacket::EntityLoad(e) = p else {
            panic!("expected entity_load");
        };
        let player = e.as_player().unwrap();
        assert_eq!(player.username, "bob");
        assert_eq!(player.skin, 2);
        assert_eq!(player.direction, Direction::S);
        assert_eq!(player.animation_frame, IDLE_FRAME);
        assert_eq!(player.previous_position, Vec2::new(1.5, 0.0));
    }

    #[test]
    fn unknown_entity_kind_is_typed() {
        let err = decode(
            r#"{"packet_type":"entity_load","entity":{"id":"x","position":{"x":0,"y":0},"value":"dragon"}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, DecodeError::UnknownEntityKind(k) if k == "dragon"));
    }

    #[test]
    fn decodes_terrain_chunk() {
        let tiles = vec!["Grass"; 64];
        let text = serde_json::json!({
            "packet_type": "terrain_chunk",
            "chunk": {"position": {"x": -1, "y": 2}, "contents": tiles},
        })
        .to_string();
        let InboundPacket::TerrainChunk(chunk) = decode(&text).unwrap() else {
            panic!("expected terrain_chunk");
        };
        assert_eq!(chunk.position(), ChunkCoord::new(-1, 2));
        assert_eq!(chunk.tile(7, 7), Some(TileType::Grass));
    }

    #[test]
    fn short_chunk_is_rejected() {
        let text = serde_json::json!({
            "packet_type": "terrain_chunk",
            "chunk": {"position": {"x": 0, "y": 0}, "contents": ["Water", "Water"]},
        })
        .to_string();
        assert!(matches!(
            decode(&text),
            Err(DecodeError::Chunk(KernelError::ChunkSize { len: 2, .. }))
        ));
    }

    #[test]
    fn unknown_packet_type_is_typed() {
        let err = decode(r#"{"packet_type":"weather_update","rain":true}"#).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownPacketType(t) if t == "weather_update"));
    }

    #[test]
    fn missing_discriminator_and_bad_json() {
        assert!(matches!(decode(r#"{"id":"p1"}"#), Err(DecodeError::MissingPacketType)));
        assert!(matches!(decode("{not json"), Err(DecodeError::Json(_))));
    }

    #[test]
    fn malformed_fields_name_the_packet() {
        let err = decode(r#"{"packet_type":"entity_move","id":"p1"}"#).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Malformed {
                packet_type: "entity_move",
                ..
            }
        ));
    }

    #[test]
    fn error_reply_has_no_discriminator() {
        let p = decode(r#"{"error":"game not found"}"#).unwrap();
        assert_eq!(
            p,
            InboundPacket::ServerError {
                error: "game not found".into()
            }
        );
        assert_eq!(p.packet_type(), "error");
    }

    #[test]
    fn decodes_chat_and_system_messages() {
        let chat = decode(r#"{"packet_type":"chat_message","id":"p2","username":"bob","message":"hi"}"#)
            .unwrap();
        assert_eq!(chat.packet_type(), "chat_message");
        let sys = decode(r#"{"packet_type":"system_message","message":"bob joined"}"#).unwrap();
        assert_eq!(
            sys,
            InboundPacket::SystemMessage {
                message: "bob joined".into()
            }
        );
        let gone = decode(r#"{"packet_type":"entity_destroyed","id":"t1"}"#).unwrap();
        assert_eq!(gone, InboundPacket::EntityDestroyed { id: "t1".into() });
    }
}
