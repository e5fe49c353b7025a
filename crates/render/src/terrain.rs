use tileworld_common::{CHUNK_SIZE, ChunkCoord, TileType};
use tileworld_kernel::{FALLBACK_TILE, World};

/// Edge length of one tile layer: a chunk plus a one-tile border.
pub const LAYER_SIZE: usize = CHUNK_SIZE as usize + 2;

pub const LAYER_AREA: usize = LAYER_SIZE * LAYER_SIZE;

/// Upper bound on chunks drawn per frame.
pub const MAX_CHUNK_LAYERS: usize = 512;

/// Base colour per tile type, in palette order.
pub const TILE_COLORS: [[u8; 3]; TileType::COUNT] = [
    [0, 0, 70],      // DeepWater
    [25, 50, 150],   // Water
    [230, 220, 170], // Beach
    [50, 180, 50],   // Grass
    [20, 100, 20],   // Forest
    [237, 151, 125], // Desert
    [189, 183, 107], // Savanna
    [0, 50, 0],      // Tundra
    [240, 240, 255], // Snow
    [130, 130, 130], // Stone
    [0, 150, 0],     // Jungle
    [40, 60, 20],    // Swamp
    [180, 220, 255], // Ice
];

/// Tile indices for one chunk with its border, row-major from local
/// `(-1, -1)` to `(8, 8)`. Border cells come from the eight neighbouring
/// chunks, or [`FALLBACK_TILE`] where a neighbour is not loaded.
pub fn chunk_layer(world: &World, coord: ChunkCoord) -> [u8; LAYER_AREA] {
    let mut layer = [FALLBACK_TILE.index(); LAYER_AREA];
    let mut i = 0;
    for y in -1..=CHUNK_SIZE {
        for x in -1..=CHUNK_SIZE {
            let source = coord.offset(neighbour_step(x), neighbour_step(y));
            let tile = world
                .chunk(source)
                .and_then(|c| c.tile(x.rem_euclid(CHUNK_SIZE), y.rem_euclid(CHUNK_SIZE)))
                .unwrap_or(FALLBACK_TILE);
            layer[i] = tile.index();
            i += 1;
        }
    }
    layer
}

fn neighbour_step(local: i32) -> i32 {
    if local < 0 {
        -1
    } else if local >= CHUNK_SIZE {
        1
    } else {
        0
    }
}

/// One drawn chunk: where it sits and which texture layer holds its tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerrainInstance {
    pub chunk: ChunkCoord,
    pub layer: u32,
}

/// Per-frame terrain upload: instance `i` reads `layers[i]`.
#[derive(Debug, Clone, Default)]
pub struct TerrainBatch {
    pub instances: Vec<TerrainInstance>,
    pub layers: Vec<[u8; LAYER_AREA]>,
}

impl TerrainBatch {
    /// Assign layers to streamed chunks with an incrementing counter, up to
    /// `max_layers`.
    pub fn build(world: &World, max_layers: usize) -> Self {
        let mut batch = Self::default();
        batch.rebuild(world, max_layers);
        batch
    }

    pub fn rebuild(&mut self, world: &World, max_layers: usize) {
        self.instances.clear();
        self.layers.clear();
        for (layer, &coord) in world.chunks().keys().take(max_layers).enumerate() {
            self.instances.push(TerrainInstance {
                chunk: coord,
                layer: layer as u32,
            });
            self.layers.push(chunk_layer(world, coord));
        }
        if world.chunk_count() > max_layers {
            tracing::debug!(
                loaded = world.chunk_count(),
                drawn = max_layers,
                "terrain layer cap reached"
            );
        }
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tileworld_kernel::TerrainChunk;

    fn at(layer: &[u8; LAYER_AREA], x: i32, y: i32) -> u8 {
        layer[((y + 1) as usize) * LAYER_SIZE + (x + 1) as usize]
    }

    #[test]
    fn palette_covers_every_tile() {
        assert_eq!(TILE_COLORS.len(), TileType::ALL.len());
        assert_eq!(TILE_COLORS[TileType::Ice.index() as usize], [180, 220, 255]);
    }

    #[test]
    fn lone_chunk_is_bordered_with_fallback() {
        let mut w = World::new();
        w.load_chunk(TerrainChunk::filled(ChunkCoord::new(0, 0), TileType::Grass));
        let layer = chunk_layer(&w, ChunkCoord::new(0, 0));

        let grass = TileType::Grass.index();
        let ice = TileType::Ice.index();
        assert_eq!(at(&layer, 0, 0), grass);
        assert_eq!(at(&layer, 7, 7), grass);
        assert_eq!(at(&layer, -1, 3), ice);
        assert_eq!(at(&layer, 8, 8), ice);
        assert_eq!(at(&layer, 3, -1), ice);
        assert_eq!(layer.iter().filter(|&&t| t == ice).count(), LAYER_AREA - 64);
    }

    #[test]
    fn border_samples_neighbour_edges() {
        let mut w = World::new();
        let centre = ChunkCoord::new(0, 0);
        w.load_chunk(TerrainChunk::filled(centre, TileType::Grass));

        let mut east = TerrainChunk::filled(ChunkCoord::new(1, 0), TileType::Stone);
        east.set_tile(0, 4, TileType::Water);
        w.load_chunk(east);

        let mut south_west = TerrainChunk::filled(ChunkCoord::new(-1, -1), TileType::Snow);
        south_west.set_tile(7, 7, TileType::DeepWater);
        w.load_chunk(south_west);

        let layer = chunk_layer(&w, centre);
        assert_eq!(at(&layer, 8, 4), TileType::Water.index());
        assert_eq!(at(&layer, 8, 3), TileType::Stone.index());
        assert_eq!(at(&layer, -1, -1), TileType::DeepWater.index());
        assert_eq!(at(&layer, 0, -1), TileType::Ice.index());
    }

    #[test]
    fn layers_are_assigned_sequentially_and_capped() {
        let mut w = World::new();
        for x in 0..5 {
            w.load_chunk(TerrainChunk::filled(ChunkCoord::new(x, 0), TileType::Beach));
        }
        let batch = TerrainBatch::build(&w, 3);
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.layers.len(), 3);
        let layers: Vec<u32> = batch.instances.iter().map(|i| i.layer).collect();
        assert_eq!(layers, vec![0, 1, 2]);
    }
}
