use glam::Vec2;
use serde::{Deserialize, Serialize};
use tileworld_common::EntityId;

/// Keep-alive payload: an empty text frame.
pub const HEARTBEAT: &str = "";

/// `{x, y}` object form of a position on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WireVec2 {
    pub x: f32,
    pub y: f32,
}

impl From<WireVec2> for Vec2 {
    fn from(v: WireVec2) -> Self {
        Vec2::new(v.x, v.y)
    }
}

impl From<Vec2> for WireVec2 {
    fn from(v: Vec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

/// Messages the client sends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "packet_type", rename_all = "snake_case")]
pub enum OutboundPacket {
    PlayerRegister {
        game_name: String,
        username: String,
        skin: u8,
    },
    EntityMove {
        id: EntityId,
        new_position: WireVec2,
    },
    ChatMessageSend {
        message: String,
    },
}

impl OutboundPacket {
    pub fn entity_move(id: EntityId, position: Vec2) -> Self {
        OutboundPacket::EntityMove {
            id,
            new_position: position.into(),
        }
    }

    /// Serialize to a single-line JSON text frame.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn register_packet_shape() {
        let text = OutboundPacket::PlayerRegister {
            game_name: "g".into(),
            username: "alice".into(),
            skin: 0,
        }
        .encode()
        .unwrap();
        let v: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            v,
            json!({"packet_type": "player_register", "game_name": "g", "username": "alice", "skin": 0})
        );
    }

    #[test]
    fn move_packet_uses_object_positions() {
        let text = OutboundPacket::entity_move("p1".into(), Vec2::new(1.5, -2.0))
            .encode()
            .unwrap();
        let v: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v["packet_type"], "entity_move");
        assert_eq!(v["id"], "p1");
        assert_eq!(v["new_position"], json!({"x": 1.5, "y": -2.0}));
        assert!(!text.contains('\n'));
    }

    #[test]
    fn chat_packet_tag() {
        let text = OutboundPacket::ChatMessageSend {
            message: "hi".into(),
        }
        .encode()
        .unwrap();
        assert_eq!(text, r#"{"packet_type":"chat_message_send","message":"hi"}"#);
    }

    #[test]
    fn heartbeat_is_empty() {
        assert!(HEARTBEAT.is_empty());
    }
}
