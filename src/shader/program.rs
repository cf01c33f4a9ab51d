use std::borrow::Cow;

use super::reflect::{compile_stage, link_stages, ProgramInterface, ResourceSlot, ShaderStage};
use super::{BindingError, ShaderError};
use crate::model::{BoundLayout, GpuBufferSet, VertexLayout};

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

pub struct ProgramDescriptor<'a> {
    pub label: &'a str,
    pub vertex_source: &'a str,
    pub fragment_source: &'a str,
    pub vertex_layout: &'a VertexLayout,
    pub bind_group_layouts: &'a [&'a wgpu::BindGroupLayout],
    pub color_format: wgpu::TextureFormat,
    pub depth_compare: wgpu::CompareFunction,
}

/// A linked vertex + fragment pair and the pipeline built from it.
///
/// Attribute and resource lookups go through the reflected interface, so a
/// pass never has to hard-code a location the shader might not declare.
pub struct ShaderProgram {
    label: String,
    interface: ProgramInterface,
    vertex_layout: VertexLayout,
    bound: BoundLayout,
    pipeline: wgpu::RenderPipeline,
}

impl ShaderProgram {
    pub fn create(device: &wgpu::Device, desc: &ProgramDescriptor<'_>) -> Result<Self, ShaderError> {
        let vertex = compile_stage(ShaderStage::Vertex, desc.vertex_source)?;
        let fragment = compile_stage(ShaderStage::Fragment, desc.fragment_source)?;
        let interface = link_stages(&vertex, &fragment)?;
        let bound = desc.vertex_layout.bind(&interface)?;

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let vertex_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{} Vertex Shader", desc.label)),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(desc.vertex_source)),
        });
        let fragment_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{} Fragment Shader", desc.label)),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(desc.fragment_source)),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{} Pipeline Layout", desc.label)),
            bind_group_layouts: desc.bind_group_layouts,
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(desc.label),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex_module,
                entry_point: Some(VERTEX_ENTRY),
                buffers: &[bound.buffer_layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &fragment_module,
                entry_point: Some(FRAGMENT_ENTRY),
                targets: &[Some(wgpu::ColorTargetState {
                    format: desc.color_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // Quads and the skybox are seen from both sides.
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: desc.depth_compare,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(ShaderError::Link {
                log: error.to_string(),
            });
        }

        log::debug!(
            "Linked program {} ({} attributes, {} resources)",
            desc.label,
            interface.attributes().count(),
            interface.resources().count()
        );

        Ok(Self {
            label: desc.label.to_string(),
            interface,
            vertex_layout: desc.vertex_layout.clone(),
            bound,
            pipeline,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn interface(&self) -> &ProgramInterface {
        &self.interface
    }

    pub fn bound_layout(&self) -> &BoundLayout {
        &self.bound
    }

    pub fn attribute_location(&self, name: &str) -> Option<u32> {
        self.interface.attribute_location(name)
    }

    pub fn resource(&self, name: &str) -> Option<ResourceSlot> {
        self.interface.resource(name)
    }

    /// Checks that `name` is declared at exactly the slot a pass binds it to.
    pub fn require_resource(&self, name: &str, expected: ResourceSlot) -> Result<(), BindingError> {
        match self.interface.resource(name) {
            None => Err(BindingError::MissingResource {
                program: self.label.clone(),
                name: name.to_string(),
            }),
            Some(actual) if actual != expected => Err(BindingError::SlotMismatch {
                name: name.to_string(),
                expected,
                actual,
            }),
            Some(_) => Ok(()),
        }
    }

    pub fn check_buffers(&self, buffers: &GpuBufferSet) -> Result<(), BindingError> {
        if buffers.layout() != &self.vertex_layout {
            return Err(BindingError::LayoutMismatch {
                program: self.label.clone(),
                buffers: buffers.label().to_string(),
            });
        }
        Ok(())
    }

    /// Makes this program current for subsequent draws in `pass`.
    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        log::debug!("Releasing program {}", self.label);
    }
}
