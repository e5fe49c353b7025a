use glam::Vec2;
use std::fmt::Write;

use crate::scene::Scene;
use crate::sprites::SpriteBatches;
use crate::terrain::{MAX_CHUNK_LAYERS, TerrainBatch};

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads a borrowed scene and produces output. It never mutates
/// the world.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Current surface size in pixels.
    fn viewport(&self) -> Vec2;

    /// Render one frame.
    fn render(&mut self, scene: &Scene<'_>) -> Self::Output;
}

/// Headless renderer that describes each frame as text.
///
/// Builds the same terrain and sprite batches a GPU backend would, so it
/// doubles as a check on frame building in tests and the CLI.
#[derive(Debug)]
pub struct DebugTextRenderer {
    viewport: Vec2,
    frames: u64,
}

impl Default for DebugTextRenderer {
    fn default() -> Self {
        Self::new(Vec2::new(800.0, 600.0))
    }
}

impl DebugTextRenderer {
    pub fn new(viewport: Vec2) -> Self {
        Self {
            viewport,
            frames: 0,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn viewport(&self) -> Vec2 {
        self.viewport
    }

    fn render(&mut self, scene: &Scene<'_>) -> String {
        self.frames += 1;
        let terrain = TerrainBatch::build(scene.world, MAX_CHUNK_LAYERS);
        let sprites = SpriteBatches::build(scene.world);
        let labels = scene.labels();
        let hitboxes = scene.hitboxes();

        let mut out = String::new();
        let _ = writeln!(out, "=== Frame {} ===", self.frames);
        let _ = writeln!(
            out,
            "Camera: pos=({:.2}, {:.2}) scale={:.1}",
            scene.camera.position.x, scene.camera.position.y, scene.camera.scale
        );
        let _ = writeln!(
            out,
            "Chunks: {} Entities: {} Sprites: {} Labels: {} Hitboxes: {}",
            terrain.len(),
            scene.world.entity_count(),
            sprites.total(),
            labels.len(),
            hitboxes.len()
        );
        for entity in scene.world.entities().values() {
            let p = entity.position;
            let _ = write!(out, "  [{}] {} pos=({:.2}, {:.2})", entity.id, entity.tag(), p.x, p.y);
            if let Some(player) = entity.as_player() {
                let _ = write!(
                    out,
                    " user={} dir={:?} frame={}",
                    player.username, player.direction, player.animation_frame
                );
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use tileworld_common::{ChunkCoord, TileType};
    use tileworld_kernel::{DecorationKind, Entity, TerrainChunk, World};

    #[test]
    fn debug_renderer_empty_world() {
        let world = World::new();
        let mut renderer = DebugTextRenderer::default();
        let scene = Scene::new(&world, Camera::default(), renderer.viewport());
        let output = renderer.render(&scene);

        assert!(output.contains("Frame 1"));
        assert!(output.contains("Chunks: 0 Entities: 0"));
    }

    #[test]
    fn debug_renderer_with_entities() {
        let mut world = World::new();
        world.load_chunk(TerrainChunk::filled(ChunkCoord::new(0, 0), TileType::Grass));
        world.load_entity(Entity::decoration("t1".into(), Vec2::new(3.0, 4.0), DecorationKind::ForestTree));
        world.load_entity(Entity::player("p2".into(), Vec2::ZERO, "bob", 0));

        let mut renderer = DebugTextRenderer::default();
        let scene = Scene::new(&world, Camera::default(), renderer.viewport());
        let output = renderer.render(&scene);

        assert!(output.contains("Chunks: 1 Entities: 2 Sprites: 2 Labels: 1"));
        assert!(output.contains("[t1] forest_tree pos=(3.00, 4.00)"));
        assert!(output.contains("user=bob dir=S frame=1"));
        assert_eq!(renderer.frames(), 1);
    }
}
