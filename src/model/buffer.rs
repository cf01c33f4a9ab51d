use std::mem::size_of;

use wgpu::util::DeviceExt;

use super::vertex::VertexLayout;
use crate::shader::{BindingError, ProgramInterface};

/// A GPU buffer with exactly one owner. Dropping it destroys the buffer.
pub struct GpuBuffer {
    label: String,
    buffer: wgpu::Buffer,
}

impl GpuBuffer {
    /// Copies `contents` into a new buffer. The caller keeps its memory.
    pub fn upload(device: &wgpu::Device, label: &str, contents: &[u8], usage: wgpu::BufferUsages) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents,
            usage,
        });
        log::trace!("Uploaded buffer {} ({} bytes)", label, contents.len());
        Self {
            label: label.to_string(),
            buffer,
        }
    }

    /// Zeroed uniform buffer that is rewritten every frame.
    pub fn uniform(device: &wgpu::Device, label: &str, size: wgpu::BufferAddress) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self {
            label: label.to_string(),
            buffer,
        }
    }

    pub fn write(&self, queue: &wgpu::Queue, offset: wgpu::BufferAddress, data: &[u8]) {
        queue.write_buffer(&self.buffer, offset, data);
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn size(&self) -> wgpu::BufferAddress {
        self.buffer.size()
    }

    pub fn raw(&self) -> &wgpu::Buffer {
        &self.buffer
    }
}

impl Drop for GpuBuffer {
    fn drop(&mut self) {
        log::trace!("Destroying buffer {}", self.label);
        self.buffer.destroy();
    }
}

pub trait IndexElement: bytemuck::Pod {
    const FORMAT: wgpu::IndexFormat;
}

impl IndexElement for u16 {
    const FORMAT: wgpu::IndexFormat = wgpu::IndexFormat::Uint16;
}

impl IndexElement for u32 {
    const FORMAT: wgpu::IndexFormat = wgpu::IndexFormat::Uint32;
}

/// A vertex buffer, its index buffer and the layout the vertices were written with.
pub struct GpuBufferSet {
    label: String,
    layout: VertexLayout,
    index_format: wgpu::IndexFormat,
    index_count: u32,
    // Index buffer was created last, so it goes first.
    indices: GpuBuffer,
    vertices: GpuBuffer,
}

impl GpuBufferSet {
    pub fn new<V: bytemuck::Pod, I: IndexElement>(
        device: &wgpu::Device,
        label: &str,
        layout: VertexLayout,
        vertices: &[V],
        indices: &[I],
    ) -> Result<Self, BindingError> {
        if vertices.is_empty() || indices.is_empty() {
            return Err(BindingError::EmptyGeometry {
                label: label.to_string(),
                vertices: vertices.len(),
                indices: indices.len(),
            });
        }
        if size_of::<V>() as u64 != layout.stride {
            return Err(BindingError::StrideMismatch {
                expected: layout.stride,
                actual: size_of::<V>() as u64,
            });
        }

        let vertex_buffer = GpuBuffer::upload(
            device,
            &format!("{} Vertex Buffer", label),
            bytemuck::cast_slice(vertices),
            wgpu::BufferUsages::VERTEX,
        );
        let index_buffer = GpuBuffer::upload(
            device,
            &format!("{} Index Buffer", label),
            bytemuck::cast_slice(indices),
            wgpu::BufferUsages::INDEX,
        );

        Ok(Self {
            label: label.to_string(),
            layout,
            index_format: I::FORMAT,
            index_count: indices.len() as u32,
            indices: index_buffer,
            vertices: vertex_buffer,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn vertex_bytes(&self) -> wgpu::BufferAddress {
        self.vertices.size()
    }

    /// Binds both buffers to slot 0 of the active pipeline.
    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.vertices.raw().slice(..));
        pass.set_index_buffer(self.indices.raw().slice(..), self.index_format);
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

/// A vertex layout whose fields have been matched to shader locations.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundLayout {
    pub stride: wgpu::BufferAddress,
    pub attributes: Vec<wgpu::VertexAttribute>,
}

impl BoundLayout {
    pub fn buffer_layout(&self) -> wgpu::VertexBufferLayout<'_> {
        wgpu::VertexBufferLayout {
            array_stride: self.stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &self.attributes,
        }
    }
}

impl VertexLayout {
    /// Resolves every field against the program's attribute table.
    ///
    /// A shader input with no field is an error. A field the shader never
    /// reads is skipped with a warning.
    pub fn bind(&self, interface: &ProgramInterface) -> Result<BoundLayout, BindingError> {
        for (name, location) in interface.attributes() {
            if self.field(name).is_none() {
                return Err(BindingError::MissingVertexField {
                    name: name.to_string(),
                    location,
                });
            }
        }

        let mut attributes = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            if field.offset + field.format.size() > self.stride {
                return Err(BindingError::FieldOverrun {
                    name: field.name.to_string(),
                    offset: field.offset,
                    stride: self.stride,
                });
            }
            match interface.attribute_location(field.name) {
                Some(shader_location) => attributes.push(wgpu::VertexAttribute {
                    format: field.format,
                    offset: field.offset,
                    shader_location,
                }),
                None => log::warn!("Vertex field `{}` is not read by the shader; skipping it", field.name),
            }
        }

        Ok(BoundLayout {
            stride: self.stride,
            attributes,
        })
    }
}
