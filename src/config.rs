use std::path::PathBuf;

pub const DEFAULT_WIDTH: u32 = 1280;
pub const DEFAULT_HEIGHT: u32 = 720;
pub const DEFAULT_MESH: &str = "media/teapot.obj";
pub const DEFAULT_MEDIA_DIR: &str = "media";

/// Startup settings for the viewer window and its assets.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub width: u32,
    pub height: u32,
    pub mesh_path: PathBuf,
    /// Holds the cube textures and the six skybox faces.
    pub media_dir: PathBuf,
    pub capture_dir: PathBuf,
    pub fullscreen: bool,
    pub normal_mapping: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            mesh_path: PathBuf::from(DEFAULT_MESH),
            media_dir: PathBuf::from(DEFAULT_MEDIA_DIR),
            capture_dir: PathBuf::from("."),
            fullscreen: false,
            normal_mapping: true,
        }
    }
}

impl ViewerConfig {
    /// Replaces zero window dimensions with the defaults.
    pub fn sanitized(mut self) -> Self {
        if self.width == 0 {
            log::warn!("Window width 0 is invalid; using {}", DEFAULT_WIDTH);
            self.width = DEFAULT_WIDTH;
        }
        if self.height == 0 {
            log::warn!("Window height 0 is invalid; using {}", DEFAULT_HEIGHT);
            self.height = DEFAULT_HEIGHT;
        }
        self
    }
}
