use glam::{Mat3, Vec2, Vec3};
use std::ops::Mul;

/// Errors from the transform kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MathError {
    #[error("matrix is not invertible (determinant is zero)")]
    Singular,
}

/// 2-D affine/projection transform backed by a column-major 3x3 matrix.
///
/// Builder calls right-multiply into the current matrix, so
/// `IDENTITY.translate(t).rotate(a)` rotates a point first and then
/// translates it: chained calls compose in call order, like a scene graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2 {
    matrix: Mat3,
}

impl Default for Transform2 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform2 {
    pub const IDENTITY: Self = Self {
        matrix: Mat3::IDENTITY,
    };

    pub fn from_matrix(matrix: Mat3) -> Self {
        Self { matrix }
    }

    pub fn matrix(&self) -> Mat3 {
        self.matrix
    }

    pub fn translate(self, offset: Vec2) -> Self {
        self * Self::from_matrix(Mat3::from_translation(offset))
    }

    pub fn scale(self, factor: Vec2) -> Self {
        self * Self::from_matrix(Mat3::from_scale(factor))
    }

    /// Rotate by `angle` radians, counter-clockwise.
    pub fn rotate(self, angle: f32) -> Self {
        self * Self::from_matrix(Mat3::from_angle(angle))
    }

    /// Inverse transform. A determinant of exactly zero is an error.
    pub fn invert(self) -> Result<Self, MathError> {
        if self.matrix.determinant() == 0.0 {
            return Err(MathError::Singular);
        }
        Ok(Self::from_matrix(self.matrix.inverse()))
    }

    /// Apply to a point (implicit `z = 1`).
    pub fn apply(self, point: Vec2) -> Vec2 {
        self.matrix.transform_point2(point)
    }

    /// Orthographic world-to-clip projection for a `view` of `(width, height)`
    /// pixels centred on `center`. `zoom` is pixels per world unit.
    ///
    /// Per axis: `scale = 2 / dimension * zoom`, `translate = -center * scale`.
    pub fn ortho(view: Vec2, center: Vec2, zoom: f32) -> Self {
        let s = Vec2::new(2.0 / view.x * zoom, 2.0 / view.y * zoom);
        let t = -center * s;
        Self::from_matrix(Mat3::from_cols(
            Vec3::new(s.x, 0.0, 0.0),
            Vec3::new(0.0, s.y, 0.0),
            Vec3::new(t.x, t.y, 1.0),
        ))
    }
}

impl Mul for Transform2 {
    type Output = Transform2;

    fn mul(self, rhs: Transform2) -> Transform2 {
        Transform2::from_matrix(self.matrix * rhs.matrix)
    }
}
