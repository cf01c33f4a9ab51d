mod program;
mod reflect;

pub use program::{ProgramDescriptor, ShaderProgram, DEPTH_FORMAT, FRAGMENT_ENTRY, VERTEX_ENTRY};
pub use reflect::{
    compile_stage, link_stages, CompiledStage, ProgramInterface, ResourceKind, ResourceSlot, ShaderStage,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("{stage} shader failed to compile:\n{log}")]
    Compile { stage: ShaderStage, log: String },
    #[error("program failed to link:\n{log}")]
    Link { log: String },
    #[error(transparent)]
    Binding(#[from] BindingError),
}

/// A named attribute or resource that does not line up with what a pass binds.
#[derive(Debug, Error, PartialEq)]
pub enum BindingError {
    #[error("shader input `{name}` (location {location}) has no matching vertex field")]
    MissingVertexField { name: String, location: u32 },
    #[error("vertex field `{name}` at offset {offset} overruns the {stride}-byte stride")]
    FieldOverrun { name: String, offset: u64, stride: u64 },
    #[error("vertex type is {actual} bytes but the layout stride is {expected}")]
    StrideMismatch { expected: u64, actual: u64 },
    #[error("program `{program}` has no resource named `{name}`")]
    MissingResource { program: String, name: String },
    #[error("resource `{name}` is {actual:?}, expected {expected:?}")]
    SlotMismatch {
        name: String,
        expected: ResourceSlot,
        actual: ResourceSlot,
    },
    #[error("buffer set `{label}` has {vertices} vertices and {indices} indices; both must be non-empty")]
    EmptyGeometry { label: String, vertices: usize, indices: usize },
    #[error("buffer set `{buffers}` was not built with the vertex layout of program `{program}`")]
    LayoutMismatch { program: String, buffers: String },
}
