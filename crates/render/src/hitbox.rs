use glam::Vec2;

use crate::scene::Scene;

/// An unfilled rectangle outline in world units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hitbox {
    pub center: Vec2,
    pub size: Vec2,
}

/// Tile under a world point. Tiles are centred on integer coordinates.
pub fn cursor_tile(world_point: Vec2) -> Vec2 {
    (world_point + Vec2::splat(0.5)).floor()
}

/// Outlines for a frame: the cursor tile, then entity bodies when hitbox
/// debugging is on.
pub fn hitboxes(scene: &Scene<'_>) -> Vec<Hitbox> {
    let mut out = Vec::new();
    if let Some(tile) = scene.cursor_tile {
        out.push(Hitbox {
            center: tile,
            size: Vec2::ONE,
        });
    }
    if scene.show_hitboxes {
        out.extend(scene.world.entities().values().map(|e| Hitbox {
            center: e.position,
            size: Vec2::splat(scene.hitbox_size),
        }));
    }
    out
}
