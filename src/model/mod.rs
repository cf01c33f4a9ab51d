pub mod buffer;
pub mod geometry;
pub mod mesh;
pub mod tangent;
pub mod texture;
mod vertex;

pub use buffer::{BoundLayout, GpuBuffer, GpuBufferSet, IndexElement};
pub use mesh::{Bounds, Mesh, MeshError};
pub use tangent::{DegeneratePolicy, TangentError};
pub use texture::{CubeFace, CubemapFaces, CubemapResource, TextureError, TextureKind, TextureResource};
pub use vertex::{position_only_layout, MeshVertex, Vertex, VertexField, VertexLayout};

#[cfg(test)]
mod tests;
