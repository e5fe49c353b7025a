use glam::Vec2;
use serde::{Deserialize, Serialize};
use tileworld_common::{EntityId, TileType};
use tileworld_input::InputState;
use tileworld_kernel::World;

use crate::collision;

/// Movement tunables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Units per second without the run modifier.
    pub walk_speed: f32,
    /// Units per second with the run modifier held.
    pub run_speed: f32,
    /// Edge length of the square collision body.
    pub entity_size: f32,
    /// Only entities within this distance take part in collision.
    pub collision_radius: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            walk_speed: 8.0,
            run_speed: 80.0,
            entity_size: 0.75,
            collision_radius: 8.0,
        }
    }
}

/// Water blocks movement; everything else is walkable.
pub fn is_walkable(tile: TileType) -> bool {
    !tile.is_water()
}

/// Unit intent from the held axes, scaled by the active speed tier and `dt`.
pub fn intent(input: &InputState, dt: f32, config: &MovementConfig) -> Vec2 {
    let speed = if input.running() {
        config.run_speed
    } else {
        config.walk_speed
    };
    input.axes().normalize_or_zero() * speed * dt
}

/// Zero each axis of `delta` whose single-axis destination is not walkable.
/// Tiles in chunks that have not streamed in count as walkable.
pub fn gate(world: &World, position: Vec2, delta: Vec2) -> Vec2 {
    let walkable = |p: Vec2| world.tile_at(p).is_none_or(is_walkable);
    Vec2::new(
        if walkable(position + Vec2::new(delta.x, 0.0)) {
            delta.x
        } else {
            0.0
        },
        if walkable(position + Vec2::new(0.0, delta.y)) {
            delta.y
        } else {
            0.0
        },
    )
}

/// One resolved movement step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub from: Vec2,
    pub to: Vec2,
}

/// Resolve one frame of movement for `mover`.
///
/// Returns `None` when the mover is not in the world or no movement key is
/// held. A returned step may still have `from == to` when walls or
/// neighbours absorb the whole delta.
pub fn step(
    world: &World,
    mover: &EntityId,
    input: &InputState,
    dt: f32,
    config: &MovementConfig,
) -> Option<Step> {
    let entity = world.get(mover)?;
    let raw = intent(input, dt, config);
    if raw == Vec2::ZERO {
        return None;
    }
    let from = entity.position;
    let candidate = from + gate(world, from, raw);
    let to = collision::resolve(world, mover, candidate, config);
    Some(Step { from, to })
}
