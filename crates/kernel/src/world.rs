use glam::Vec2;
use std::collections::BTreeMap;
use std::fmt;
use tileworld_common::{ChunkCoord, EntityId, TileType};

use crate::entity::Entity;
use crate::terrain::TerrainChunk;

/// A recoverable inconsistency between the mirror and an incoming update.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreWarning {
    /// An update referenced an entity that has not been loaded (or was evicted).
    UnknownEntity {
        id: EntityId,
        operation: &'static str,
    },
}

impl fmt::Display for StoreWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreWarning::UnknownEntity { id, operation } => {
                write!(f, "{operation}: entity {id} does not exist")
            }
        }
    }
}

/// Record of every mutation applied to the mirror.
#[derive(Debug, Clone, PartialEq)]
pub enum WorldEvent {
    EntityLoaded { id: EntityId },
    EntityMoved { id: EntityId, from: Vec2, to: Vec2 },
    EntityRemoved { id: EntityId },
    ChunkLoaded { coord: ChunkCoord },
    Evicted { entities: usize, chunks: usize },
    Warning(StoreWarning),
}

/// What one eviction pass removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Eviction {
    pub entities: Vec<EntityId>,
    pub chunks: Vec<ChunkCoord>,
}

impl Eviction {
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.chunks.is_empty()
    }
}

/// The local world mirror.
///
/// Entities are keyed by server id and chunks by grid coordinate; each key
/// holds exactly one record. BTreeMap keeps iteration (and therefore draw and
/// collision order) deterministic.
#[derive(Debug, Clone, Default)]
pub struct World {
    entities: BTreeMap<EntityId, Entity>,
    chunks: BTreeMap<ChunkCoord, TerrainChunk>,
    local_player: Option<EntityId>,
    event_log: Vec<WorldEvent>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn entities(&self) -> &BTreeMap<EntityId, Entity> {
        &self.entities
    }

    pub fn chunks(&self) -> &BTreeMap<ChunkCoord, TerrainChunk> {
        &self.chunks
    }

    pub fn get(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn get_mut(&mut self, id: &EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    pub fn entities_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.values_mut()
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<&TerrainChunk> {
        self.chunks.get(&coord)
    }

    /// Read-only access to the mutation log.
    pub fn events(&self) -> &[WorldEvent] {
        &self.event_log
    }

    /// Drain and return the mutation log.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Warnings still held in the log.
    pub fn warnings(&self) -> impl Iterator<Item = &StoreWarning> {
        self.event_log.iter().filter_map(|e| match e {
            WorldEvent::Warning(w) => Some(w),
            _ => None,
        })
    }

    pub fn set_local_player(&mut self, id: EntityId) {
        self.local_player = Some(id);
    }

    pub fn local_player_id(&self) -> Option<&EntityId> {
        self.local_player.as_ref()
    }

    pub fn local_player(&self) -> Option<&Entity> {
        self.local_player.as_ref().and_then(|id| self.entities.get(id))
    }

    /// Insert or overwrite an entity. Returns the record it replaced.
    pub fn load_entity(&mut self, entity: Entity) -> Option<Entity> {
        let id = entity.id.clone();
        let previous = self.entities.insert(id.clone(), entity);
        self.event_log.push(WorldEvent::EntityLoaded { id });
        previous
    }

    /// Move an entity. An unknown id is a logged race, not an error; the
    /// store is left untouched and `false` returned.
    pub fn move_entity(&mut self, id: &EntityId, to: Vec2) -> bool {
        let Some(entity) = self.entities.get_mut(id) else {
            self.warn_unknown(id, "entity_move");
            return false;
        };
        let from = entity.position;
        entity.position = to;
        self.event_log.push(WorldEvent::EntityMoved {
            id: id.clone(),
            from,
            to,
        });
        true
    }

    /// Remove an entity. Unknown ids are logged like unknown moves.
    pub fn remove_entity(&mut self, id: &EntityId) -> Option<Entity> {
        let removed = self.entities.remove(id);
        match removed {
            Some(_) => self
                .event_log
                .push(WorldEvent::EntityRemoved { id: id.clone() }),
            None => self.warn_unknown(id, "entity_destroyed"),
        }
        removed
    }

    /// Insert or overwrite a chunk. Returns the chunk it replaced.
    pub fn load_chunk(&mut self, chunk: TerrainChunk) -> Option<TerrainChunk> {
        let coord = chunk.position();
        let previous = self.chunks.insert(coord, chunk);
        self.event_log.push(WorldEvent::ChunkLoaded { coord });
        previous
    }

    /// Tile under a world position, `None` when its chunk is not streamed.
    pub fn tile_at(&self, pos: Vec2) -> Option<TileType> {
        let coord = ChunkCoord::containing(pos);
        let chunk = self.chunks.get(&coord)?;
        let local = (pos + Vec2::splat(0.5) - coord.origin()).floor();
        chunk.tile(local.x as i32, local.y as i32)
    }

    /// Entities within `radius` of `center` (inclusive).
    pub fn entities_near(&self, center: Vec2, radius: f32) -> impl Iterator<Item = &Entity> {
        self.entities
            .values()
            .filter(move |e| e.position.distance(center) <= radius)
    }

    /// Distance-cutoff eviction around `center`.
    ///
    /// Chunks are measured from their grid centre. Players are never evicted
    /// here; only decorations are.
    // TODO: evict remote players too once the server re-sends them on approach.
    pub fn evict(&mut self, center: Vec2, radius: f32) -> Eviction {
        let _span = tracing::debug_span!("evict", radius).entered();

        let entities: Vec<EntityId> = self
            .entities
            .values()
            .filter(|e| !e.is_player())
            .filter(|e| e.position.distance(center) > radius)
            .map(|e| e.id.clone())
            .collect();
        let chunks: Vec<ChunkCoord> = self
            .chunks
            .keys()
            .filter(|c| c.center().distance(center) > radius)
            .copied()
            .collect();

        for id in &entities {
            self.entities.remove(id);
        }
        for coord in &chunks {
            self.chunks.remove(coord);
        }

        if !entities.is_empty() || !chunks.is_empty() {
            tracing::debug!(
                entities = entities.len(),
                chunks = chunks.len(),
                "evicted out-of-range state"
            );
            self.event_log.push(WorldEvent::Evicted {
                entities: entities.len(),
                chunks: chunks.len(),
            });
        }

        Eviction { entities, chunks }
    }

    fn warn_unknown(&mut self, id: &EntityId, operation: &'static str) {
        tracing::warn!(%id, operation, "update for unknown entity ignored");
        self.event_log
            .push(WorldEvent::Warning(StoreWarning::UnknownEntity {
                id: id.clone(),
                operation,
            }));
    }
}
