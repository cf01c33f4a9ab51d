use thiserror::Error;

use crate::model::{MeshError, TangentError, TextureError};
use crate::renderer::PassKind;
use crate::shader::{BindingError, ShaderError};

/// Anything that stops the viewer before the first frame.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("no compatible GPU adapter found")]
    NoAdapter,
    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("failed to open device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error(transparent)]
    Shader(#[from] ShaderError),
    #[error(transparent)]
    Binding(#[from] BindingError),
    #[error(transparent)]
    Texture(#[from] TextureError),
    #[error(transparent)]
    Mesh(#[from] MeshError),
    #[error(transparent)]
    Tangent(#[from] TangentError),
    #[error("passes must run in order {expected:?}, got {actual:?}")]
    PassOrder {
        expected: Vec<PassKind>,
        actual: Vec<PassKind>,
    },
}
