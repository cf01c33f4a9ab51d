use std::mem::{offset_of, size_of};

/// Interleaved vertex record for the normal-mapped quads.
///
/// The same struct drives both the CPU array and the GPU attribute table,
/// so offsets and stride can never drift apart.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 3], // z unused
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
    pub face_normal: [f32; 3],
    pub _padding: [f32; 14],
}

impl Vertex {
    pub const STRIDE: usize = size_of::<Vertex>();

    pub const fn new(position: [f32; 3], normal: [f32; 3], tex_coords: [f32; 3]) -> Self {
        Self {
            position,
            normal,
            tex_coords,
            tangent: [0.0; 3],
            bitangent: [0.0; 3],
            face_normal: [0.0; 3],
            _padding: [0.0; 14],
        }
    }

    pub fn layout() -> VertexLayout {
        VertexLayout {
            stride: Self::STRIDE as wgpu::BufferAddress,
            fields: vec![
                VertexField::new("vertex", wgpu::VertexFormat::Float32x3, offset_of!(Vertex, position)),
                VertexField::new("normal", wgpu::VertexFormat::Float32x3, offset_of!(Vertex, normal)),
                VertexField::new("texcoord", wgpu::VertexFormat::Float32x3, offset_of!(Vertex, tex_coords)),
                VertexField::new("tangent", wgpu::VertexFormat::Float32x3, offset_of!(Vertex, tangent)),
                VertexField::new("bitangent", wgpu::VertexFormat::Float32x3, offset_of!(Vertex, bitangent)),
                VertexField::new("face_normal", wgpu::VertexFormat::Float32x3, offset_of!(Vertex, face_normal)),
            ],
        }
    }
}

/// Position + normal record used by the external mesh.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl MeshVertex {
    pub fn layout() -> VertexLayout {
        VertexLayout {
            stride: size_of::<MeshVertex>() as wgpu::BufferAddress,
            fields: vec![
                VertexField::new("vertex", wgpu::VertexFormat::Float32x3, offset_of!(MeshVertex, position)),
                VertexField::new("normal", wgpu::VertexFormat::Float32x3, offset_of!(MeshVertex, normal)),
            ],
        }
    }
}

/// Tightly packed position-only record used by the skybox cube.
pub fn position_only_layout() -> VertexLayout {
    VertexLayout {
        stride: size_of::<[f32; 3]>() as wgpu::BufferAddress,
        fields: vec![VertexField::new("vertex", wgpu::VertexFormat::Float32x3, 0)],
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VertexField {
    pub name: &'static str,
    pub format: wgpu::VertexFormat,
    pub offset: wgpu::BufferAddress,
}

impl VertexField {
    pub fn new(name: &'static str, format: wgpu::VertexFormat, offset: usize) -> Self {
        Self {
            name,
            format,
            offset: offset as wgpu::BufferAddress,
        }
    }
}

/// Named attribute table describing one interleaved vertex buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexLayout {
    pub stride: wgpu::BufferAddress,
    pub fields: Vec<VertexField>,
}

impl VertexLayout {
    pub fn field(&self, name: &str) -> Option<&VertexField> {
        self.fields.iter().find(|f| f.name == name)
    }
}
