use glam::Vec2;
use std::time::Duration;
use tileworld_common::Direction;
use tileworld_kernel::{IDLE_FRAME, World};

use crate::collision::sign;

/// Walk-cycle frames, one per 100 ms step.
pub const WALK_CYCLE: [u8; 4] = [0, 1, 2, 1];

const CYCLE_STEP_MICROS: u128 = 100_000;

/// Facing for a position delta, `None` when the entity did not move.
pub fn direction_from_delta(delta: Vec2) -> Option<Direction> {
    Direction::from_signs(sign(delta.x) as i8, sign(delta.y) as i8)
}

/// Walk-cycle frame for a monotonic clock reading.
pub fn walk_frame(clock: Duration) -> u8 {
    let phase = (clock.as_micros() / CYCLE_STEP_MICROS) % WALK_CYCLE.len() as u128;
    WALK_CYCLE[phase as usize]
}

/// One animation tick over every player.
///
/// Movement since the last tick picks the facing and a walk-cycle frame;
/// no movement keeps the facing and shows the idle frame. The sampling point
/// then advances to the current position. Returns the number of players that
/// were moving.
pub fn animate(world: &mut World, clock: Duration) -> usize {
    let frame = walk_frame(clock);
    let mut moving = 0;
    for entity in world.entities_mut() {
        let position = entity.position;
        let Some(player) = entity.as_player_mut() else {
            continue;
        };
        match direction_from_delta(position - player.previous_position) {
            Some(direction) => {
                player.direction = direction;
                player.animation_frame = frame;
                moving += 1;
            }
            None => player.animation_frame = IDLE_FRAME,
        }
        player.previous_position = position;
    }
    tracing::trace!(moving, "animation tick");
    moving
}

#[cfg(test)]
mod tests {
    use super::*;
    use tileworld_kernel::{DecorationKind, Entity};

    #[test]
    fn all_nine_sign_pairs() {
        let cases = [
            (Vec2::new(0.0, 0.3), Some(Direction::N)),
            (Vec2::new(0.2, 5.0), Some(Direction::NE)),
            (Vec2::new(1.0, 0.0), Some(Direction::E)),
            (Vec2::new(0.01, -0.01), Some(Direction::SE)),
            (Vec2::new(0.0, -2.0), Some(Direction::S)),
            (Vec2::new(-1.0, -1.0), Some(Direction::SW)),
            (Vec2::new(-0.5, 0.0), Some(Direction::W)),
            (Vec2::new(-3.0, 0.1), Some(Direction::NW)),
            (Vec2::ZERO, None),
        ];
        for (delta, expected) in cases {
            assert_eq!(direction_from_delta(delta), expected, "delta {delta:?}");
        }
    }

    #[test]
    fn walk_cycle_follows_clock() {
        let frames: Vec<u8> = [0, 99, 100, 250, 399, 400, 510]
            .into_iter()
            .map(|ms| walk_frame(Duration::from_millis(ms)))
            .collect();
        assert_eq!(frames, vec![0, 0, 1, 2, 1, 0, 1]);
    }

    #[test]
    fn zero_delta_keeps_direction_and_idles() {
        let mut w = World::new();
        let mut e = Entity::player("p".into(), Vec2::ZERO, "a", 0);
        if let Some(p) = e.as_player_mut() {
            p.direction = Direction::E;
            p.animation_frame = 2;
        }
        w.load_entity(e);

        assert_eq!(animate(&mut w, Duration::from_millis(200)), 0);
        let p = w.get(&"p".into()).unwrap().as_player().unwrap();
        assert_eq!(p.direction, Direction::E);
        assert_eq!(p.animation_frame, IDLE_FRAME);
    }

    #[test]
    fn movement_sets_direction_and_advances_sample() {
        let mut w = World::new();
        w.load_entity(Entity::player("p".into(), Vec2::ZERO, "a", 0));
        w.load_entity(Entity::decoration("t".into(), Vec2::ZERO, DecorationKind::Bush));
        w.move_entity(&"p".into(), Vec2::new(-0.4, 0.8));

        assert_eq!(animate(&mut w, Duration::from_millis(250)), 1);
        let p = w.get(&"p".into()).unwrap().as_player().unwrap();
        assert_eq!(p.direction, Direction::NW);
        assert_eq!(p.animation_frame, 2);
        assert_eq!(p.previous_position, Vec2::new(-0.4, 0.8));

        // no movement since the last tick
        animate(&mut w, Duration::from_millis(350));
        let p = w.get(&"p".into()).unwrap().as_player().unwrap();
        assert_eq!(p.direction, Direction::NW);
        assert_eq!(p.animation_frame, IDLE_FRAME);
    }
}
