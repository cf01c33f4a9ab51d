pub mod camera;
pub mod input;
pub mod transform;
#[cfg(test)]
mod tests;

pub use camera::CameraState;
pub use input::{InputSource, Key, KeyboardInput, StickPosition};
pub use transform::FrameTransforms;

use winit::keyboard::KeyCode;

/// A switch flipped by [`Toggles::on_key_press`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleChange {
    Fullscreen(bool),
    NormalMapping(bool),
    CaptureArmed,
    VideoCapture(bool),
    Quit,
}

/// Boolean switches flipped from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Toggles {
    pub fullscreen: bool,
    pub capture_armed: bool,
    pub video_capture: bool,
    pub normal_mapping: bool,
    pub quit_requested: bool,
}

impl Default for Toggles {
    fn default() -> Self {
        Self {
            fullscreen: false,
            capture_armed: false,
            video_capture: false,
            normal_mapping: true,
            quit_requested: false,
        }
    }
}

impl Toggles {
    /// Returns and clears the single-frame capture request.
    pub fn take_capture(&mut self) -> bool {
        std::mem::take(&mut self.capture_armed)
    }

    /// Consumes an armed capture once a frame has been presented. A skipped
    /// frame leaves it armed for the next one.
    pub fn settle_capture(&mut self, presented: bool) -> bool {
        presented && self.take_capture()
    }

    /// F, N, G, V, Escape and Q; every other key is left to the camera.
    pub fn on_key_press(&mut self, key: KeyCode) -> Option<ToggleChange> {
        let change = match key {
            KeyCode::KeyF => {
                self.fullscreen = !self.fullscreen;
                ToggleChange::Fullscreen(self.fullscreen)
            }
            KeyCode::KeyN => {
                self.normal_mapping = !self.normal_mapping;
                ToggleChange::NormalMapping(self.normal_mapping)
            }
            KeyCode::KeyG => {
                self.capture_armed = true;
                ToggleChange::CaptureArmed
            }
            KeyCode::KeyV => {
                self.video_capture = !self.video_capture;
                ToggleChange::VideoCapture(self.video_capture)
            }
            KeyCode::Escape | KeyCode::KeyQ => {
                self.quit_requested = true;
                ToggleChange::Quit
            }
            _ => return None,
        };
        Some(change)
    }
}
