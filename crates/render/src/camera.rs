use glam::Vec2;
use tileworld_common::{MathError, Transform2};

/// Default zoom in pixels per world unit.
pub const DEFAULT_SCALE: f32 = 32.0;

/// 2-D camera: a world-space centre and a zoom in pixels per unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec2,
    pub scale: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            scale: DEFAULT_SCALE,
        }
    }
}

impl Camera {
    pub fn new(position: Vec2, scale: f32) -> Self {
        Self { position, scale }
    }

    /// World-to-clip transform for a viewport of `viewport` pixels.
    pub fn view_projection(&self, viewport: Vec2) -> Transform2 {
        Transform2::ortho(viewport, self.position, self.scale)
    }

    /// Window pixel (origin top-left, y down) to normalized device coordinates.
    pub fn screen_to_ndc(screen: Vec2, viewport: Vec2) -> Vec2 {
        Vec2::new(
            screen.x / viewport.x * 2.0 - 1.0,
            1.0 - screen.y / viewport.y * 2.0,
        )
    }

    /// Normalized device coordinates back to a window pixel.
    pub fn ndc_to_screen(ndc: Vec2, viewport: Vec2) -> Vec2 {
        Vec2::new(
            (ndc.x + 1.0) / 2.0 * viewport.x,
            (1.0 - ndc.y) / 2.0 * viewport.y,
        )
    }

    pub fn world_to_screen(&self, world: Vec2, viewport: Vec2) -> Vec2 {
        Self::ndc_to_screen(self.view_projection(viewport).apply(world), viewport)
    }

    /// Unproject a window pixel through the inverse view-projection.
    ///
    /// A collapsed viewport or a zero zoom has no inverse.
    pub fn screen_to_world(&self, screen: Vec2, viewport: Vec2) -> Result<Vec2, MathError> {
        if viewport.x <= 0.0 || viewport.y <= 0.0 {
            return Err(MathError::Singular);
        }
        let inverse = self.view_projection(viewport).invert()?;
        Ok(inverse.apply(Self::screen_to_ndc(screen, viewport)))
    }
}
