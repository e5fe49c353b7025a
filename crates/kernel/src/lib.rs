//! World kernel: the local mirror of server-pushed state.
//!
//! # Invariants
//! - The server owns truth; the kernel only applies what it is told and the
//!   local player's optimistic moves.
//! - All state mutations flow through explicit operations and are logged.
//! - Races (moves for entities not yet loaded) are warnings, never errors.

pub mod entity;
pub mod terrain;
pub mod world;

pub use entity::{DecorationKind, Entity, EntityKind, IDLE_FRAME, PlayerState};
pub use terrain::{FALLBACK_TILE, KernelError, TerrainChunk};
pub use world::{Eviction, StoreWarning, World, WorldEvent};
