use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Edge length of a terrain chunk, in tiles.
pub const CHUNK_SIZE: i32 = 8;

/// Number of tiles in one chunk.
pub const CHUNK_AREA: usize = (CHUNK_SIZE * CHUNK_SIZE) as usize;

/// Server-assigned entity identifier. Opaque to the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// Integer grid coordinate of a terrain chunk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
}

impl ChunkCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chunk holding the tile under a world position.
    pub fn containing(pos: Vec2) -> Self {
        let p = pos + Vec2::splat(0.5);
        let size = CHUNK_SIZE as f32;
        Self {
            x: (p.x / size).floor() as i32,
            y: (p.y / size).floor() as i32,
        }
    }

    /// World position of tile (0, 0) of this chunk.
    pub fn origin(self) -> Vec2 {
        Vec2::new((self.x * CHUNK_SIZE) as f32, (self.y * CHUNK_SIZE) as f32)
    }

    /// Representative point used for distance checks.
    pub fn center(self) -> Vec2 {
        self.origin() + Vec2::splat((CHUNK_SIZE / 2) as f32)
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Wire/map key in `cx:cy` form.
    pub fn key(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.x, self.y)
    }
}

/// Terrain tile kinds, in palette order. The discriminant is the value
/// stored in chunk tile textures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TileType {
    DeepWater,
    Water,
    Beach,
    Grass,
    Forest,
    Desert,
    Savanna,
    Tundra,
    Snow,
    Stone,
    Jungle,
    Swamp,
    Ice,
}

impl TileType {
    pub const COUNT: usize = 13;

    pub const ALL: [TileType; Self::COUNT] = [
        TileType::DeepWater,
        TileType::Water,
        TileType::Beach,
        TileType::Grass,
        TileType::Forest,
        TileType::Desert,
        TileType::Savanna,
        TileType::Tundra,
        TileType::Snow,
        TileType::Stone,
        TileType::Jungle,
        TileType::Swamp,
        TileType::Ice,
    ];

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn is_water(self) -> bool {
        matches!(self, TileType::DeepWater | TileType::Water)
    }
}

/// Eight-way facing of a player sprite. The discriminant is the sprite
/// sheet column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::N,
        Direction::NE,
        Direction::E,
        Direction::SE,
        Direction::S,
        Direction::SW,
        Direction::W,
        Direction::NW,
    ];

    pub fn index(self) -> u8 {
        self as u8
    }

    /// Exact lookup from a `(sign(dx), sign(dy))` pair. `None` for `(0, 0)`
    /// and for anything that is not a sign.
    pub fn from_signs(sx: i8, sy: i8) -> Option<Direction> {
        match (sx, sy) {
            (0, 1) => Some(Direction::N),
            (1, 1) => Some(Direction::NE),
            (1, 0) => Some(Direction::E),
            (1, -1) => Some(Direction::SE),
            (0, -1) => Some(Direction::S),
            (-1, -1) => Some(Direction::SW),
            (-1, 0) => Some(Direction::W),
            (-1, 1) => Some(Direction::NW),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_containing_uses_tile_centres() {
        assert_eq!(ChunkCoord::containing(Vec2::new(0.0, 0.0)), ChunkCoord::new(0, 0));
        assert_eq!(ChunkCoord::containing(Vec2::new(7.4, 7.4)), ChunkCoord::new(0, 0));
        assert_eq!(ChunkCoord::containing(Vec2::new(7.5, 0.0)), ChunkCoord::new(1, 0));
        assert_eq!(ChunkCoord::containing(Vec2::new(-0.6, -9.0)), ChunkCoord::new(-1, -2));
    }

    #[test]
    fn chunk_center_and_key() {
        let c = ChunkCoord::new(2, -1);
        assert_eq!(c.center(), Vec2::new(20.0, -4.0));
        assert_eq!(c.key(), "2:-1");
    }

    #[test]
    fn tile_indices_follow_palette_order() {
        for (i, tile) in TileType::ALL.iter().enumerate() {
            assert_eq!(tile.index() as usize, i);
        }
        assert!(TileType::Water.is_water());
        assert!(!TileType::Beach.is_water());
    }

    #[test]
    fn tile_type_wire_names() {
        let tile: TileType = serde_json::from_str("\"DeepWater\"").unwrap();
        assert_eq!(tile, TileType::DeepWater);
    }

    #[test]
    fn direction_sign_table() {
        let table = [
            ((0, 1), Some(Direction::N)),
            ((1, 1), Some(Direction::NE)),
            ((1, 0), Some(Direction::E)),
            ((1, -1), Some(Direction::SE)),
            ((0, -1), Some(Direction::S)),
            ((-1, -1), Some(Direction::SW)),
            ((-1, 0), Some(Direction::W)),
            ((-1, 1), Some(Direction::NW)),
            ((0, 0), None),
        ];
        for ((sx, sy), expected) in table {
            assert_eq!(Direction::from_signs(sx, sy), expected, "signs ({sx}, {sy})");
        }
    }
}
