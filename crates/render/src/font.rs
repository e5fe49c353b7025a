//! Label rasterization.
//!
//! [`LabelFont`] draws white text with a black outline from real font
//! outlines via `ab_glyph`. Faces are tried in order per character: an
//! optional font from the asset directory first, then the faces bundled
//! with egui. Width comes from the glyph advances, rounded up, plus a fixed
//! margin, so any script the loaded faces cover comes out intact.

use ab_glyph::{Font, FontArc, GlyphId, PxScale, ScaleFont, point};
use std::path::{Path, PathBuf};

/// Pixel height labels are drawn at.
pub const LABEL_FONT_SIZE: f32 = 10.0;

/// Font looked up in the asset directory by [`LabelFont::load_dir`].
pub const LABEL_FONT_FILE: &str = "label_font.ttf";

/// Margin on every side; covers the outline.
const PADDING: u32 = 2;

#[derive(Debug, thiserror::Error)]
pub enum FontError {
    #[error("cannot read font {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid font data: {0}")]
    Invalid(#[from] ab_glyph::InvalidFont),
    #[error("no font face loaded")]
    NoFaces,
}

/// An RGBA8 image, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl TextImage {
    fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; (width * height * 4) as usize],
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * self.width + x) * 4) as usize;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    fn put(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let i = ((y * self.width + x) * 4) as usize;
        self.pixels[i..i + 4].copy_from_slice(&rgba);
    }
}

/// Turns a string into an image sized to its measured bounds plus padding,
/// never wider than `max_width`.
pub trait TextRasterizer {
    fn rasterize(&self, text: &str, max_width: u32) -> Result<TextImage, FontError>;
}

#[derive(Clone)]
pub struct LabelFont {
    faces: Vec<FontArc>,
    size: f32,
}

impl std::fmt::Debug for LabelFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabelFont")
            .field("faces", &self.faces.len())
            .field("size", &self.size)
            .finish()
    }
}

impl Default for LabelFont {
    fn default() -> Self {
        Self::builtin()
    }
}

impl LabelFont {
    /// The faces egui ships: Ubuntu Light, then Noto Emoji and Hack.
    pub fn builtin() -> Self {
        let faces = [
            epaint_default_fonts::UBUNTU_LIGHT,
            epaint_default_fonts::NOTO_EMOJI_REGULAR,
            epaint_default_fonts::HACK_REGULAR,
        ]
        .into_iter()
        .filter_map(|data| match FontArc::try_from_slice(data) {
            Ok(face) => Some(face),
            Err(err) => {
                tracing::warn!(error = %err, "bundled font rejected");
                None
            }
        })
        .collect();
        Self {
            faces,
            size: LABEL_FONT_SIZE,
        }
    }

    /// `data` as the primary face, backed by the built-in faces.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, FontError> {
        let face = FontArc::try_from_vec(data)?;
        let mut font = Self::builtin();
        font.faces.insert(0, face);
        Ok(font)
    }

    pub fn from_file(path: &Path) -> Result<Self, FontError> {
        let data = std::fs::read(path).map_err(|source| FontError::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::from_bytes(data)
    }

    /// [`LABEL_FONT_FILE`] from `dir`, or the built-in faces alone.
    pub fn load_dir(dir: &Path) -> Self {
        let path = dir.join(LABEL_FONT_FILE);
        match Self::from_file(&path) {
            Ok(font) => {
                tracing::info!(path = %path.display(), "label font loaded");
                font
            }
            Err(err) => {
                tracing::warn!(error = %err, "using built-in label font");
                Self::builtin()
            }
        }
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    fn scale(&self) -> PxScale {
        PxScale::from(self.size)
    }

    /// First face with a glyph for `c`, else the primary face's missing glyph.
    fn face_for(&self, c: char) -> Option<(&FontArc, GlyphId)> {
        self.faces
            .iter()
            .find_map(|face| {
                let id = face.glyph_id(c);
                (id.0 != 0).then_some((face, id))
            })
            .or_else(|| self.faces.first().map(|face| (face, face.glyph_id(c))))
    }

    /// Measured text bounds in pixels, without padding.
    pub fn measure(&self, text: &str) -> (u32, u32) {
        let scale = self.scale();
        let width: f32 = text
            .chars()
            .filter_map(|c| self.face_for(c))
            .map(|(face, id)| face.as_scaled(scale).h_advance(id))
            .sum();
        (width.ceil() as u32, self.size.ceil() as u32)
    }
}

impl TextRasterizer for LabelFont {
    fn rasterize(&self, text: &str, max_width: u32) -> Result<TextImage, FontError> {
        if self.faces.is_empty() {
            return Err(FontError::NoFaces);
        }
        let scale = self.scale();
        let (w, h) = self.measure(text);
        let width = (w + PADDING * 2).min(max_width.max(1));
        let height = h + PADDING * 2;

        let mut coverage = vec![0.0f32; (width * height) as usize];
        let mut pen = PADDING as f32;
        for c in text.chars() {
            let Some((face, id)) = self.face_for(c) else {
                continue;
            };
            let scaled = face.as_scaled(scale);
            // centre the ascent..descent box in the line
            let line = scaled.ascent() - scaled.descent();
            let baseline = PADDING as f32 + (h as f32 - line) / 2.0 + scaled.ascent();
            let glyph = id.with_scale_and_position(scale, point(pen, baseline));
            pen += scaled.h_advance(id);

            let Some(outline) = face.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outline.px_bounds();
            outline.draw(|gx, gy, amount| {
                let x = bounds.min.x as i32 + gx as i32;
                let y = bounds.min.y as i32 + gy as i32;
                if x >= 0 && y >= 0 && (x as u32) < width && (y as u32) < height {
                    let i = (y as u32 * width + x as u32) as usize;
                    coverage[i] = (coverage[i] + amount).min(1.0);
                }
            });
        }
        Ok(outlined(&coverage, width, height))
    }
}

/// White fill composited over a one-pixel black outline.
fn outlined(coverage: &[f32], width: u32, height: u32) -> TextImage {
    let mut image = TextImage::blank(width, height);
    let at = |x: u32, y: u32| coverage[(y * width + x) as usize];
    for y in 0..height {
        for x in 0..width {
            let fill = at(x, y);
            let mut edge = 0.0f32;
            for ny in y.saturating_sub(1)..=(y + 1).min(height - 1) {
                for nx in x.saturating_sub(1)..=(x + 1).min(width - 1) {
                    edge = edge.max(at(nx, ny));
                }
            }
            let alpha = fill + edge * (1.0 - fill);
            if alpha <= 0.0 {
                continue;
            }
            let shade = (255.0 * fill / alpha).round() as u8;
            image.put(x, y, [shade, shade, shade, (255.0 * alpha).round() as u8]);
        }
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIDE: u32 = 4096;

    fn render(text: &str) -> TextImage {
        LabelFont::builtin().rasterize(text, WIDE).unwrap()
    }

    #[test]
    fn builtin_faces_all_load() {
        assert_eq!(LabelFont::builtin().face_count(), 3);
    }

    #[test]
    fn image_is_measured_bounds_plus_padding() {
        let font = LabelFont::builtin();
        let (w, h) = font.measure("bob");
        assert!(w > 0);
        assert_eq!(h, 10);
        let img = font.rasterize("bob", WIDE).unwrap();
        assert_eq!((img.width, img.height), (w + 4, h + 4));
        assert_eq!(img.pixels.len(), (img.width * img.height * 4) as usize);
    }

    #[test]
    fn width_follows_glyph_advances() {
        let font = LabelFont::builtin();
        assert!(font.measure("WWWW").0 > font.measure("iiii").0);
        assert!(font.measure("bobby").0 > font.measure("bob").0);
    }

    #[test]
    fn text_has_fill_and_outline() {
        let img = render("Hello");
        assert!(img.pixels.chunks(4).any(|p| p[3] > 0 && p[0] > 0));
        assert!(img.pixels.chunks(4).any(|p| p[3] > 0 && p[0] == 0));
        // the padding corner stays clear
        assert_eq!(img.pixel(0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn non_ascii_names_keep_their_glyphs() {
        assert_ne!(render("Zoë"), render("Zo?"));
        assert_ne!(render("小明"), render("??"));
    }

    #[test]
    fn space_is_transparent() {
        let img = render(" ");
        assert!(img.pixels.chunks(4).all(|p| p[3] == 0));
    }

    #[test]
    fn empty_string_still_has_an_image() {
        let img = render("");
        assert_eq!((img.width, img.height), (4, 14));
    }

    #[test]
    fn width_is_clamped() {
        let img = LabelFont::builtin().rasterize(&"w".repeat(200), 64).unwrap();
        assert_eq!(img.width, 64);
        assert_eq!(img.pixels.len(), (64 * img.height * 4) as usize);
    }

    #[test]
    fn no_faces_is_an_error() {
        let font = LabelFont {
            faces: Vec::new(),
            size: LABEL_FONT_SIZE,
        };
        assert!(matches!(font.rasterize("bob", WIDE), Err(FontError::NoFaces)));
    }

    #[test]
    fn garbage_font_data_is_rejected() {
        assert!(matches!(
            LabelFont::from_bytes(vec![1, 2, 3]),
            Err(FontError::Invalid(_))
        ));
    }

    #[test]
    fn missing_font_file_falls_back_to_builtin() {
        let font = LabelFont::load_dir(Path::new("/nonexistent/tileworld-assets"));
        assert_eq!(font.face_count(), 3);
    }
}
