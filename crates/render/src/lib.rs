//! Rendering adapter: everything a frame needs that does not touch a GPU.
//!
//! Backends receive a borrowed [`Scene`] and turn it into draw calls. This
//! crate derives the per-frame data they upload: terrain tile layers with
//! neighbour borders, sprite instance batches per atlas, username labels,
//! rasterized label images and hitbox outlines.
//!
//! # Invariants
//! - Renderers never mutate world state; a [`Scene`] only borrows the world.
//! - The camera's view-projection is the single source for drawing and for
//!   screen-to-world picking.

pub mod camera;
pub mod font;
pub mod hitbox;
pub mod labels;
mod renderer;
pub mod scene;
pub mod sprites;
pub mod terrain;

pub use camera::Camera;
pub use font::{FontError, LABEL_FONT_FILE, LabelFont, TextImage, TextRasterizer};
pub use hitbox::{Hitbox, cursor_tile};
pub use labels::{Label, PIXELS_PER_UNIT, TextCache, player_labels};
pub use renderer::{DebugTextRenderer, Renderer};
pub use scene::Scene;
pub use sprites::{SheetId, SpriteBatches, SpriteCell, SpriteInstance};
pub use terrain::{
    LAYER_AREA, LAYER_SIZE, MAX_CHUNK_LAYERS, TILE_COLORS, TerrainBatch, TerrainInstance, chunk_layer,
};
