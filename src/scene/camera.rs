use super::input::{InputSource, Key};

/// Degrees per second applied by the arrow keys.
pub const KEY_ANGLE_RATE: f32 = 180.0;
/// Degrees per second at full deflection of the look stick.
pub const LOOK_RATE: f32 = 90.0;
/// Units per second at full deflection of the move stick.
pub const MOVE_RATE: f32 = 30.0;
/// Degrees per second of the mesh spin.
pub const SPIN_RATE: f32 = 45.0;

/// First-person camera on the ground plane (y is always 0).
///
/// Angles are in degrees and accumulate without clamping.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CameraState {
    pub yaw: f32,
    pub pitch: f32,
    pub x: f32,
    pub z: f32,
    pub gamma: f32,
    // Arrow-key angles. Tracked, never rendered.
    pub alpha: f32,
    pub beta: f32,
}

impl CameraState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, dt: f32, input: &dyn InputSource) {
        let step = KEY_ANGLE_RATE * dt;
        if input.is_key_down(Key::Up) {
            self.alpha += step;
        }
        if input.is_key_down(Key::Down) {
            self.alpha -= step;
        }
        if input.is_key_down(Key::Left) {
            self.beta -= step;
        }
        if input.is_key_down(Key::Right) {
            self.beta += step;
        }

        let look = input.stick(1);
        self.yaw += look.x * dt * LOOK_RATE;
        self.pitch += look.y * dt * LOOK_RATE;

        // Movement is rotated by the heading computed after this frame's look.
        let movement = input.stick(0);
        let (sin, cos) = (-self.yaw.to_radians()).sin_cos();
        let (dx, dy) = (movement.x * dt * MOVE_RATE, movement.y * dt * MOVE_RATE);
        self.x -= cos * dx - sin * dy;
        self.z += cos * dy + sin * dx;

        self.gamma += SPIN_RATE * dt;
    }

    /// Keeps yaw and pitch in `[0, 360)`.
    pub fn wrap_angles(&mut self) {
        self.yaw = self.yaw.rem_euclid(360.0);
        self.pitch = self.pitch.rem_euclid(360.0);
    }
}
