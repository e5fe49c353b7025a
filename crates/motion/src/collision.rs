use glam::Vec2;
use tileworld_common::EntityId;
use tileworld_kernel::World;

use crate::movement::MovementConfig;

/// Push `candidate` out of every entity it overlaps, one entity at a time.
///
/// Each overlapping neighbour within `collision_radius` moves the candidate
/// along the axis of smaller penetration by exactly that penetration. The
/// pass is not iterated; later pushes see earlier corrections. An axis
/// distance of exactly zero has no sign and produces no push.
pub fn resolve(world: &World, mover: &EntityId, candidate: Vec2, config: &MovementConfig) -> Vec2 {
    let mut corrected = candidate;
    for other in world.entities().values() {
        if &other.id == mover {
            continue;
        }
        let d = corrected - other.position;
        if d.length() > config.collision_radius {
            continue;
        }
        let overlap = Vec2::splat(config.entity_size) - d.abs();
        if overlap.x <= 0.0 || overlap.y <= 0.0 {
            continue;
        }
        if overlap.x < overlap.y {
            corrected.x += sign(d.x) * overlap.x;
        } else {
            corrected.y += sign(d.y) * overlap.y;
        }
    }
    corrected
}

/// Sign with `sign(0) = 0`, unlike `f32::signum`.
pub(crate) fn sign(v: f32) -> f32 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tileworld_kernel::{DecorationKind, Entity};

    fn world_with(obstacles: &[(f32, f32)]) -> World {
        let mut w = World::new();
        w.load_entity(Entity::player("me".into(), Vec2::ZERO, "alice", 0));
        for (i, &(x, y)) in obstacles.iter().enumerate() {
            w.load_entity(Entity::decoration(
                EntityId::new(format!("rock{i}")),
                Vec2::new(x, y),
                DecorationKind::Stone,
            ));
        }
        w
    }

    fn cfg() -> MovementConfig {
        MovementConfig::default()
    }

    #[test]
    fn pushes_out_along_smaller_overlap() {
        let w = world_with(&[(1.0, 0.0)]);
        // dx = -0.5, dy = 0.1: overlapX 0.25 < overlapY 0.65
        let out = resolve(&w, &"me".into(), Vec2::new(0.5, 0.1), &cfg());
        assert!((out.x - 0.25).abs() < 1e-6);
        assert_eq!(out.y, 0.1);
    }

    #[test]
    fn vertical_push_when_y_overlap_is_smaller() {
        let w = world_with(&[(0.0, 0.0)]);
        let out = resolve(&w, &"me".into(), Vec2::new(0.1, 0.6), &cfg());
        assert_eq!(out.x, 0.1);
        assert!((out.y - 0.75).abs() < 1e-6);
    }

    #[test]
    fn exactly_entity_size_apart_is_not_corrected() {
        let w = world_with(&[(0.75, 0.0)]);
        let p = Vec2::new(0.0, 0.0);
        assert_eq!(resolve(&w, &"me".into(), p, &cfg()), p);
    }

    #[test]
    fn resolution_is_idempotent_once_clear() {
        let w = world_with(&[(1.0, 0.0), (-1.0, 0.3)]);
        let once = resolve(&w, &"me".into(), Vec2::new(0.5, 0.1), &cfg());
        let twice = resolve(&w, &"me".into(), once, &cfg());
        assert_eq!(once, twice);
    }

    #[test]
    fn mover_never_collides_with_itself() {
        let w = world_with(&[]);
        let p = Vec2::new(0.1, 0.1);
        assert_eq!(resolve(&w, &"me".into(), p, &cfg()), p);
    }

    #[test]
    fn colocated_entity_produces_no_push() {
        let w = world_with(&[(2.0, 2.0)]);
        let p = Vec2::new(2.0, 2.0);
        assert_eq!(resolve(&w, &"me".into(), p, &cfg()), p);
    }

    #[test]
    fn distant_entities_are_ignored() {
        let config = MovementConfig {
            entity_size: 20.0,
            ..MovementConfig::default()
        };
        let w = world_with(&[(9.0, 0.0)]);
        let p = Vec2::ZERO;
        assert_eq!(resolve(&w, &"me".into(), p, &config), p);
    }
}
