use tileworld_common::{CHUNK_AREA, CHUNK_SIZE, ChunkCoord, TileType};

/// Tile assumed wherever a neighbouring chunk has not been streamed in.
pub const FALLBACK_TILE: TileType = TileType::Ice;

/// Errors from building kernel records out of untrusted input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum KernelError {
    #[error("chunk {coord} has {len} tiles, expected {expected}")]
    ChunkSize {
        coord: ChunkCoord,
        len: usize,
        expected: usize,
    },
    #[error("unknown decoration kind: {0}")]
    UnknownDecoration(String),
}

/// An 8x8 block of terrain. Tile `i` sits at local `(i % 8, i / 8)`.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainChunk {
    position: ChunkCoord,
    contents: [TileType; CHUNK_AREA],
}

impl TerrainChunk {
    pub fn new(position: ChunkCoord, contents: [TileType; CHUNK_AREA]) -> Self {
        Self { position, contents }
    }

    pub fn filled(position: ChunkCoord, tile: TileType) -> Self {
        Self::new(position, [tile; CHUNK_AREA])
    }

    /// Build from a tile list of unchecked length.
    pub fn from_tiles(position: ChunkCoord, tiles: Vec<TileType>) -> Result<Self, KernelError> {
        let len = tiles.len();
        let contents: [TileType; CHUNK_AREA] =
            tiles.try_into().map_err(|_| KernelError::ChunkSize {
                coord: position,
                len,
                expected: CHUNK_AREA,
            })?;
        Ok(Self::new(position, contents))
    }

    pub fn position(&self) -> ChunkCoord {
        self.position
    }

    pub fn contents(&self) -> &[TileType; CHUNK_AREA] {
        &self.contents
    }

    /// Tile at local coordinates, `None` outside `0..8`.
    pub fn tile(&self, lx: i32, ly: i32) -> Option<TileType> {
        if !(0..CHUNK_SIZE).contains(&lx) || !(0..CHUNK_SIZE).contains(&ly) {
            return None;
        }
        Some(self.contents[(ly * CHUNK_SIZE + lx) as usize])
    }

    pub fn set_tile(&mut self, lx: i32, ly: i32, tile: TileType) {
        if (0..CHUNK_SIZE).contains(&lx) && (0..CHUNK_SIZE).contains(&ly) {
            self.contents[(ly * CHUNK_SIZE + lx) as usize] = tile;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_tiles_rejects_wrong_length() {
        let err = TerrainChunk::from_tiles(ChunkCoord::new(1, 2), vec![TileType::Grass; 63]);
        assert_eq!(
            err,
            Err(KernelError::ChunkSize {
                coord: ChunkCoord::new(1, 2),
                len: 63,
                expected: 64
            })
        );
    }

    #[test]
    fn tile_index_is_row_major() {
        let mut tiles = vec![TileType::Grass; CHUNK_AREA];
        tiles[3 * 8 + 5] = TileType::Stone;
        let chunk = TerrainChunk::from_tiles(ChunkCoord::default(), tiles).unwrap();
        assert_eq!(chunk.tile(5, 3), Some(TileType::Stone));
        assert_eq!(chunk.tile(3, 5), Some(TileType::Grass));
        assert_eq!(chunk.tile(8, 0), None);
        assert_eq!(chunk.tile(0, -1), None);
    }
}
