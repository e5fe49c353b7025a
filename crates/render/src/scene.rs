use glam::Vec2;
use tileworld_common::Transform2;
use tileworld_kernel::World;

use crate::camera::Camera;
use crate::hitbox::{self, Hitbox};
use crate::labels::{self, Label};

/// Default edge length of debug entity outlines.
pub const DEFAULT_HITBOX_SIZE: f32 = 0.75;

/// Everything a renderer may read for one frame.
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    pub world: &'a World,
    pub camera: Camera,
    /// Surface size in pixels.
    pub viewport: Vec2,
    pub cursor_tile: Option<Vec2>,
    pub show_hitboxes: bool,
    pub hitbox_size: f32,
}

impl<'a> Scene<'a> {
    pub fn new(world: &'a World, camera: Camera, viewport: Vec2) -> Self {
        Self {
            world,
            camera,
            viewport,
            cursor_tile: None,
            show_hitboxes: false,
            hitbox_size: DEFAULT_HITBOX_SIZE,
        }
    }

    pub fn view_projection(&self) -> Transform2 {
        self.camera.view_projection(self.viewport)
    }

    pub fn labels(&self) -> Vec<Label> {
        labels::player_labels(self.world)
    }

    pub fn hitboxes(&self) -> Vec<Hitbox> {
        hitbox::hitboxes(self)
    }
}
