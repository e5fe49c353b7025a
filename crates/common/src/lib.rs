//! Shared vocabulary for the tileworld client: identifiers, grid coordinates,
//! tile and direction enums, and the 2-D transform kernel.
//!
//! # Invariants
//! - Tiles are centred on integer world coordinates.
//! - A chunk is `CHUNK_SIZE` x `CHUNK_SIZE` tiles.

pub mod math;
pub mod types;

pub use math::{MathError, Transform2};
pub use types::{CHUNK_AREA, CHUNK_SIZE, ChunkCoord, Direction, EntityId, TileType};
