//! Keyboard mapping
//!
//! Raw key names (as reported by `KeyboardEvent.key`) become [`Key`]s, and
//! [`Controls`] folds down/up events into one [`TickInput`] per frame.
//! Direction keys are level-triggered: they push for as long as they are held.

use glam::Vec2;

use crate::sim::TickInput;

/// Keys the game reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    /// Start from the menu or restart after a run
    Space,
    /// Back to the menu after a run
    Menu,
    /// End the current run
    Quit,
    Mute,
}

impl Key {
    /// Map a `KeyboardEvent.key` value; anything else is ignored
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "ArrowUp" => Some(Key::Up),
            "ArrowDown" => Some(Key::Down),
            "ArrowLeft" => Some(Key::Left),
            "ArrowRight" => Some(Key::Right),
            " " => Some(Key::Space),
            "s" => Some(Key::Menu),
            "q" => Some(Key::Quit),
            "m" => Some(Key::Mute),
            _ => None,
        }
    }

    /// Steering direction, for direction keys
    pub fn direction(self) -> Option<Vec2> {
        match self {
            Key::Up => Some(Vec2::Y),
            Key::Down => Some(Vec2::NEG_Y),
            Key::Left => Some(Vec2::NEG_X),
            Key::Right => Some(Vec2::X),
            _ => None,
        }
    }
}

/// Held keys plus the one-shot presses waiting for the next frame
#[derive(Debug, Clone, Default)]
pub struct Controls {
    up: bool,
    down: bool,
    left: bool,
    right: bool,
    start: bool,
    menu: bool,
    quit: bool,
    mute: bool,
    pub autopilot: bool,
}

impl Controls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false for keys the game doesn't use
    pub fn on_key_down(&mut self, code: &str) -> bool {
        let Some(key) = Key::from_code(code) else {
            return false;
        };
        match key {
            Key::Up => self.up = true,
            Key::Down => self.down = true,
            Key::Left => self.left = true,
            Key::Right => self.right = true,
            Key::Space => self.start = true,
            Key::Menu => self.menu = true,
            Key::Quit => self.quit = true,
            Key::Mute => self.mute = true,
        }
        true
    }

    pub fn on_key_up(&mut self, code: &str) -> bool {
        let Some(key) = Key::from_code(code) else {
            return false;
        };
        match key {
            Key::Up => self.up = false,
            Key::Down => self.down = false,
            Key::Left => self.left = false,
            Key::Right => self.right = false,
            // One-shot keys fire on press only
            _ => {}
        }
        true
    }

    /// Sum of the held direction keys; opposite keys cancel
    pub fn steer(&self) -> Vec2 {
        [
            (self.up, Key::Up),
            (self.down, Key::Down),
            (self.left, Key::Left),
            (self.right, Key::Right),
        ]
        .into_iter()
        .filter(|(held, _)| *held)
        .filter_map(|(_, key)| key.direction())
        .sum()
    }

    /// This frame's simulation input; one-shot presses are consumed
    pub fn take_input(&mut self) -> TickInput {
        let input = TickInput {
            steer: self.steer(),
            start: self.start,
            menu: self.menu,
            quit: self.quit,
            autopilot: self.autopilot,
        };
        self.start = false;
        self.menu = false;
        self.quit = false;
        input
    }

    /// Whether mute was pressed since the last call
    pub fn take_mute_toggle(&mut self) -> bool {
        std::mem::take(&mut self.mute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_table() {
        assert_eq!(Key::from_code("ArrowLeft"), Some(Key::Left));
        assert_eq!(Key::from_code(" "), Some(Key::Space));
        assert_eq!(Key::from_code("m"), Some(Key::Mute));
        assert_eq!(Key::from_code("Enter"), None);
        assert_eq!(Key::from_code("x"), None);
    }

    #[test]
    fn test_unmapped_keys_ignored() {
        let mut c = Controls::new();
        assert!(!c.on_key_down("Tab"));
        assert!(!c.on_key_up("Tab"));
        let input = c.take_input();
        assert_eq!(input.steer, Vec2::ZERO);
        assert!(!input.start);
    }

    #[test]
    fn test_held_direction_persists_until_release() {
        let mut c = Controls::new();
        c.on_key_down("ArrowRight");
        c.on_key_down("ArrowUp");
        assert_eq!(c.take_input().steer, Vec2::new(1.0, 1.0));
        assert_eq!(c.take_input().steer, Vec2::new(1.0, 1.0));
        c.on_key_up("ArrowRight");
        assert_eq!(c.take_input().steer, Vec2::Y);
        c.on_key_up("ArrowUp");
        assert_eq!(c.take_input().steer, Vec2::ZERO);
    }

    #[test]
    fn test_opposites_cancel() {
        let mut c = Controls::new();
        c.on_key_down("ArrowLeft");
        c.on_key_down("ArrowRight");
        assert_eq!(c.take_input().steer, Vec2::ZERO);
    }

    #[test]
    fn test_one_shots_fire_once() {
        let mut c = Controls::new();
        c.on_key_down(" ");
        c.on_key_down("q");
        let input = c.take_input();
        assert!(input.start && input.quit);
        let input = c.take_input();
        assert!(!input.start && !input.quit);
    }

    #[test]
    fn test_mute_toggle_consumed() {
        let mut c = Controls::new();
        assert!(!c.take_mute_toggle());
        c.on_key_down("m");
        assert!(c.take_mute_toggle());
        assert!(!c.take_mute_toggle());
    }
}
