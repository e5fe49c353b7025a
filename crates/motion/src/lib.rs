//! Motion: turning held input into a resolved local-player position, and
//! deriving facing and walk-cycle frames from position history.
//!
//! # Invariants
//! - Terrain gating is per axis, so blocked movement slides along walls.
//! - Collision is a single minimum-translation pass against nearby entities.
//! - Facing only changes on animation ticks, never per physics step.

pub mod animation;
pub mod collision;
pub mod movement;

pub use animation::{WALK_CYCLE, animate, direction_from_delta, walk_frame};
pub use collision::resolve;
pub use movement::{MovementConfig, Step, gate, intent, is_walkable, step};
