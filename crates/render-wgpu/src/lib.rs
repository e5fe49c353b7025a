//! wgpu render backend for the tile world.
//!
//! One render pass per frame, four instanced pipelines in draw order:
//! terrain chunks, sprites per atlas, username labels, hitbox outlines.
//! Every pipeline reads the camera's 2-D view-projection from bind group 0.
//!
//! # Invariants
//! - Renderer never mutates world state.
//! - Each frame uploads only the instance bytes in use.
//! - GPU object creation failures surface as [`RenderError`], never panics.

mod error;
mod gpu;
mod hitbox;
mod shaders;
mod sprite;
mod terrain;
mod text;

pub use error::RenderError;
pub use gpu::{CLEAR_COLOR, WgpuFrame, WgpuRenderer};
pub use sprite::SheetImage;
