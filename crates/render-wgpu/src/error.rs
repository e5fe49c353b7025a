use tileworld_render::{FontError, SheetId};

/// Errors from the wgpu backend.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// A GPU object could not be created. `message` is the wgpu error text.
    #[error("failed to create {what}: {message}")]
    Gpu { what: &'static str, message: String },
    #[error("label text: {0}")]
    Font(#[from] FontError),
    #[error("sprite sheet {sheet:?} is {width}x{height}, not a multiple of its {cols}x{rows} grid")]
    SheetGrid {
        sheet: SheetId,
        width: u32,
        height: u32,
        cols: u32,
        rows: u32,
    },
    #[error("sprite sheet {sheet:?} has {len} bytes, expected {expected}")]
    SheetData {
        sheet: SheetId,
        len: usize,
        expected: usize,
    },
}
