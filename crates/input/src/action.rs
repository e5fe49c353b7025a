use glam::Vec2;
use std::collections::HashSet;

/// A movement action a platform key binding can produce.
///
/// World logic consumes actions, never raw key codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    /// Run modifier: switches to the fast speed tier while held.
    Run,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::MoveUp,
        Action::MoveDown,
        Action::MoveLeft,
        Action::MoveRight,
        Action::Run,
    ];
}

/// Held actions plus the last known cursor position in window pixels.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: HashSet<Action>,
    cursor: Option<Vec2>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an action held. Returns `true` on the transition to held.
    pub fn press(&mut self, action: Action) -> bool {
        let fresh = self.held.insert(action);
        if fresh {
            tracing::trace!(?action, "pressed");
        }
        fresh
    }

    /// Mark an action released. Returns `true` if it was held.
    pub fn release(&mut self, action: Action) -> bool {
        self.held.remove(&action)
    }

    /// Drop every held action, e.g. when the window loses focus or a text
    /// field takes the keyboard.
    pub fn release_all(&mut self) {
        self.held.clear();
    }

    pub fn is_held(&self, action: Action) -> bool {
        self.held.contains(&action)
    }

    pub fn running(&self) -> bool {
        self.is_held(Action::Run)
    }

    /// Raw, unnormalized movement axes in world orientation (`+y` is up).
    pub fn axes(&self) -> Vec2 {
        let axis = |pos: Action, neg: Action| -> f32 {
            (self.is_held(pos) as i8 - self.is_held(neg) as i8) as f32
        };
        Vec2::new(
            axis(Action::MoveRight, Action::MoveLeft),
            axis(Action::MoveUp, Action::MoveDown),
        )
    }

    pub fn set_cursor(&mut self, cursor: Option<Vec2>) {
        self.cursor = cursor;
    }

    pub fn cursor(&self) -> Option<Vec2> {
        self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_keys_no_axes() {
        assert_eq!(InputState::new().axes(), Vec2::ZERO);
    }

    #[test]
    fn up_is_positive_y() {
        let mut input = InputState::new();
        input.press(Action::MoveUp);
        input.press(Action::MoveLeft);
        assert_eq!(input.axes(), Vec2::new(-1.0, 1.0));
    }

    #[test]
    fn opposing_keys_cancel() {
        let mut input = InputState::new();
        input.press(Action::MoveUp);
        input.press(Action::MoveDown);
        input.press(Action::MoveRight);
        assert_eq!(input.axes(), Vec2::new(1.0, 0.0));
    }

    #[test]
    fn press_reports_transitions_only() {
        let mut input = InputState::new();
        assert!(input.press(Action::Run));
        assert!(!input.press(Action::Run));
        assert!(input.running());
        assert!(input.release(Action::Run));
        assert!(!input.release(Action::Run));
        assert!(!input.running());
    }

    #[test]
    fn release_all_clears_held_keys() {
        let mut input = InputState::new();
        for action in Action::ALL {
            input.press(action);
        }
        input.release_all();
        assert_eq!(input.axes(), Vec2::ZERO);
        assert!(!input.running());
    }

    #[test]
    fn cursor_is_optional() {
        let mut input = InputState::new();
        assert_eq!(input.cursor(), None);
        input.set_cursor(Some(Vec2::new(10.0, 20.0)));
        assert_eq!(input.cursor(), Some(Vec2::new(10.0, 20.0)));
    }
}
