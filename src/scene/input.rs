use std::collections::HashSet;

use winit::keyboard::KeyCode;

/// Keys the camera reads directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
}

/// Analog stick deflection, each axis in `[-1, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StickPosition {
    pub x: f32,
    pub y: f32,
}

impl StickPosition {
    pub const CENTER: StickPosition = StickPosition { x: 0.0, y: 0.0 };
}

pub trait InputSource {
    fn is_key_down(&self, key: Key) -> bool;
    fn stick(&self, index: usize) -> StickPosition;
}

/// Keyboard state fed from winit events.
///
/// Stick 0 is W/A/S/D, stick 1 is I/J/K/L. Pressing both directions of an
/// axis cancels out.
#[derive(Debug, Default)]
pub struct KeyboardInput {
    pressed: HashSet<KeyCode>,
}

impl KeyboardInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process_key(&mut self, key: KeyCode, pressed: bool) {
        if pressed {
            self.pressed.insert(key);
        } else {
            self.pressed.remove(&key);
        }
    }

    pub fn release_all(&mut self) {
        self.pressed.clear();
    }

    fn axis(&self, negative: KeyCode, positive: KeyCode) -> f32 {
        let mut value = 0.0;
        if self.pressed.contains(&positive) {
            value += 1.0;
        }
        if self.pressed.contains(&negative) {
            value -= 1.0;
        }
        value
    }
}

impl InputSource for KeyboardInput {
    fn is_key_down(&self, key: Key) -> bool {
        let code = match key {
            Key::Up => KeyCode::ArrowUp,
            Key::Down => KeyCode::ArrowDown,
            Key::Left => KeyCode::ArrowLeft,
            Key::Right => KeyCode::ArrowRight,
        };
        self.pressed.contains(&code)
    }

    fn stick(&self, index: usize) -> StickPosition {
        match index {
            0 => StickPosition {
                x: self.axis(KeyCode::KeyA, KeyCode::KeyD),
                y: self.axis(KeyCode::KeyS, KeyCode::KeyW),
            },
            1 => StickPosition {
                x: self.axis(KeyCode::KeyJ, KeyCode::KeyL),
                y: self.axis(KeyCode::KeyK, KeyCode::KeyI),
            },
            _ => StickPosition::CENTER,
        }
    }
}
