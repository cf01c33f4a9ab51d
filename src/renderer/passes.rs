use std::mem::size_of;
use std::num::NonZeroU64;
use std::path::Path;

use image::RgbaImage;

use super::{FrameContext, PassKind, RenderError};
use crate::error::InitError;
use crate::model::geometry::{build_quad_vertices, quads_to_triangles, QUAD_INDICES, SKYBOX_QUAD_INDICES, SKYBOX_VERTICES};
use crate::model::texture::create_sampler;
use crate::model::{
    position_only_layout, CubemapFaces, CubemapResource, DegeneratePolicy, GpuBuffer, GpuBufferSet, Mesh, MeshError,
    TextureKind, TextureResource, Vertex,
};
use crate::scene::transform::{CUBE_LIGHT_POSITION, INSTANCE_COUNT, MESH_LIGHT_POSITION};
use crate::shader::{ProgramDescriptor, ResourceKind, ResourceSlot, ShaderProgram};

/// One set-pipeline / bind / draw sequence of a frame.
pub trait Pass {
    fn kind(&self) -> PassKind;

    /// Writes every uniform the pass reads this frame.
    fn prepare(&self, queue: &wgpu::Queue, frame: &FrameContext);

    fn record(&self, pass: &mut wgpu::RenderPass<'_>) -> Result<(), RenderError>;
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages, dynamic: bool, size: u64) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: dynamic,
            min_binding_size: NonZeroU64::new(size),
        },
        count: None,
    }
}

fn texture_entry(binding: u32, view_dimension: wgpu::TextureViewDimension) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

fn slot(group: u32, binding: u32, kind: ResourceKind) -> ResourceSlot {
    ResourceSlot { group, binding, kind }
}

/// Rounds `size` up to the device's dynamic uniform offset alignment.
pub fn dynamic_stride(device: &wgpu::Device, size: u64) -> u64 {
    let align = device.limits().min_uniform_buffer_offset_alignment as u64;
    size.div_ceil(align) * align
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct MeshUniform {
    projection: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    light_position: [f32; 4],
}

/// The spinning external mesh, lit by one point light.
pub struct MeshPass {
    scene_bind_group: wgpu::BindGroup,
    uniforms: GpuBuffer,
    program: ShaderProgram,
    mesh: Mesh,
}

impl MeshPass {
    pub fn new(device: &wgpu::Device, color_format: wgpu::TextureFormat, mut mesh: Mesh) -> Result<Self, InitError> {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Mesh Scene Layout"),
            entries: &[uniform_entry(
                0,
                wgpu::ShaderStages::VERTEX,
                false,
                size_of::<MeshUniform>() as u64,
            )],
        });

        let vertex_layout = Mesh::vertex_layout();
        let program = ShaderProgram::create(
            device,
            &ProgramDescriptor {
                label: "Mesh Program",
                vertex_source: include_str!("../shaders/mesh.vert.wgsl"),
                fragment_source: include_str!("../shaders/mesh.frag.wgsl"),
                vertex_layout: &vertex_layout,
                bind_group_layouts: &[&layout],
                color_format,
                depth_compare: wgpu::CompareFunction::Less,
            },
        )?;
        program.require_resource("scene", slot(0, 0, ResourceKind::Uniform))?;

        mesh.setup_buffer_objects(device)?;
        let buffers = mesh.buffers().ok_or_else(|| MeshError::NotUploaded(mesh.name.clone()))?;
        program.check_buffers(buffers)?;

        let uniforms = GpuBuffer::uniform(device, "Mesh Uniforms", size_of::<MeshUniform>() as u64);
        let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Mesh Scene Bind Group"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniforms.raw().as_entire_binding(),
            }],
        });

        Ok(Self {
            scene_bind_group,
            uniforms,
            program,
            mesh,
        })
    }
}

impl Pass for MeshPass {
    fn kind(&self) -> PassKind {
        PassKind::ExternalMesh
    }

    fn prepare(&self, queue: &wgpu::Queue, frame: &FrameContext) {
        let t = &frame.transforms;
        let uniform = MeshUniform {
            projection: t.projection.to_cols_array_2d(),
            view: t.view.to_cols_array_2d(),
            model: t.mesh_model.to_cols_array_2d(),
            light_position: MESH_LIGHT_POSITION.extend(1.0).to_array(),
        };
        self.uniforms.write(queue, 0, bytemuck::bytes_of(&uniform));
    }

    fn record(&self, pass: &mut wgpu::RenderPass<'_>) -> Result<(), RenderError> {
        self.program.bind(pass);
        pass.set_bind_group(0, &self.scene_bind_group, &[]);
        self.mesh.render(pass)?;
        Ok(())
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct CubeSceneUniform {
    projection: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    light_position: [f32; 4],
    normal_mapping: u32,
    _padding: [u32; 3],
}

pub const CUBE_TEXTURE_FILE: &str = "texture_4.png";
pub const CUBE_NORMAL_MAP_FILE: &str = "normal_4.png";

/// Six instances of the normal-mapped quads. Only the model offset changes
/// between draws.
pub struct CubePass {
    material_bind_group: wgpu::BindGroup,
    model_bind_group: wgpu::BindGroup,
    scene_bind_group: wgpu::BindGroup,
    model_stride: u64,
    model_uniforms: GpuBuffer,
    scene_uniforms: GpuBuffer,
    _sampler: wgpu::Sampler,
    _normal_map: TextureResource,
    _texture: TextureResource,
    buffers: GpuBufferSet,
    program: ShaderProgram,
}

impl CubePass {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color_format: wgpu::TextureFormat,
        media_dir: &Path,
    ) -> Result<Self, InitError> {
        let texture = TextureResource::from_path(device, queue, &media_dir.join(CUBE_TEXTURE_FILE), TextureKind::Color)?;
        let normal_map =
            TextureResource::from_path(device, queue, &media_dir.join(CUBE_NORMAL_MAP_FILE), TextureKind::Data)?;
        Self::with_textures(device, color_format, texture, normal_map)
    }

    pub fn from_images(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color_format: wgpu::TextureFormat,
        color: &RgbaImage,
        normal: &RgbaImage,
    ) -> Result<Self, InitError> {
        let texture = TextureResource::from_image(device, queue, color, TextureKind::Color, "Cube Texture");
        let normal_map = TextureResource::from_image(device, queue, normal, TextureKind::Data, "Cube Normal Map");
        Self::with_textures(device, color_format, texture, normal_map)
    }

    fn with_textures(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        texture: TextureResource,
        normal_map: TextureResource,
    ) -> Result<Self, InitError> {
        let scene_size = size_of::<CubeSceneUniform>() as u64;
        let model_size = size_of::<[[f32; 4]; 4]>() as u64;

        let scene_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Cube Scene Layout"),
            entries: &[uniform_entry(
                0,
                wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                false,
                scene_size,
            )],
        });
        let model_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Cube Model Layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX, true, model_size)],
        });
        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Cube Material Layout"),
            entries: &[
                texture_entry(0, wgpu::TextureViewDimension::D2),
                texture_entry(1, wgpu::TextureViewDimension::D2),
                sampler_entry(2),
            ],
        });

        let vertex_layout = Vertex::layout();
        let program = ShaderProgram::create(
            device,
            &ProgramDescriptor {
                label: "Cube Program",
                vertex_source: include_str!("../shaders/cube.vert.wgsl"),
                fragment_source: include_str!("../shaders/cube.frag.wgsl"),
                vertex_layout: &vertex_layout,
                bind_group_layouts: &[&scene_layout, &model_layout, &material_layout],
                color_format,
                depth_compare: wgpu::CompareFunction::Less,
            },
        )?;
        program.require_resource("scene", slot(0, 0, ResourceKind::Uniform))?;
        program.require_resource("model", slot(1, 0, ResourceKind::Uniform))?;
        program.require_resource("texture_sample", slot(2, 0, ResourceKind::Texture))?;
        program.require_resource("normal_sample", slot(2, 1, ResourceKind::Texture))?;
        program.require_resource("material_sampler", slot(2, 2, ResourceKind::Sampler))?;

        let vertices = build_quad_vertices(DegeneratePolicy::Reject)?;
        let indices = quads_to_triangles(&QUAD_INDICES);
        let buffers = GpuBufferSet::new(device, "Cube", vertex_layout, &vertices, &indices)?;
        program.check_buffers(&buffers)?;

        let scene_uniforms = GpuBuffer::uniform(device, "Cube Scene Uniforms", scene_size);
        let model_stride = dynamic_stride(device, model_size);
        let model_uniforms = GpuBuffer::uniform(device, "Cube Model Uniforms", model_stride * INSTANCE_COUNT as u64);
        let sampler = create_sampler(device, "Cube Sampler");

        let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Cube Scene Bind Group"),
            layout: &scene_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene_uniforms.raw().as_entire_binding(),
            }],
        });
        let model_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Cube Model Bind Group"),
            layout: &model_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: model_uniforms.raw(),
                    offset: 0,
                    size: NonZeroU64::new(model_size),
                }),
            }],
        });
        let material_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Cube Material Bind Group"),
            layout: &material_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&normal_map.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        Ok(Self {
            material_bind_group,
            model_bind_group,
            scene_bind_group,
            model_stride,
            model_uniforms,
            scene_uniforms,
            _sampler: sampler,
            _normal_map: normal_map,
            _texture: texture,
            buffers,
            program,
        })
    }
}

impl Pass for CubePass {
    fn kind(&self) -> PassKind {
        PassKind::CubeInstances
    }

    fn prepare(&self, queue: &wgpu::Queue, frame: &FrameContext) {
        let t = &frame.transforms;
        let scene = CubeSceneUniform {
            projection: t.projection.to_cols_array_2d(),
            view: t.view.to_cols_array_2d(),
            light_position: CUBE_LIGHT_POSITION.extend(1.0).to_array(),
            normal_mapping: frame.normal_mapping as u32,
            _padding: [0; 3],
        };
        self.scene_uniforms.write(queue, 0, bytemuck::bytes_of(&scene));

        for (i, model) in t.instance_models.iter().enumerate() {
            let matrix: [[f32; 4]; 4] = model.to_cols_array_2d();
            self.model_uniforms
                .write(queue, i as u64 * self.model_stride, bytemuck::bytes_of(&matrix));
        }
    }

    fn record(&self, pass: &mut wgpu::RenderPass<'_>) -> Result<(), RenderError> {
        self.program.bind(pass);
        pass.set_bind_group(0, &self.scene_bind_group, &[]);
        pass.set_bind_group(2, &self.material_bind_group, &[]);
        self.buffers.bind(pass);
        for instance in 0..INSTANCE_COUNT as u64 {
            let offset = (instance * self.model_stride) as wgpu::DynamicOffset;
            pass.set_bind_group(1, &self.model_bind_group, &[offset]);
            self.buffers.draw(pass);
        }
        Ok(())
    }
}

/// A scaled cube around the camera sampled by direction.
pub struct SkyboxPass {
    cubemap_bind_group: wgpu::BindGroup,
    pvm_bind_group: wgpu::BindGroup,
    uniforms: GpuBuffer,
    _sampler: wgpu::Sampler,
    cubemap: CubemapResource,
    buffers: GpuBufferSet,
    program: ShaderProgram,
}

impl SkyboxPass {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color_format: wgpu::TextureFormat,
        media_dir: &Path,
    ) -> Result<Self, InitError> {
        let faces = CubemapFaces::load_dir(media_dir)?;
        Self::from_faces(device, queue, color_format, &faces)
    }

    pub fn from_faces(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color_format: wgpu::TextureFormat,
        faces: &CubemapFaces,
    ) -> Result<Self, InitError> {
        let pvm_size = size_of::<[[f32; 4]; 4]>() as u64;
        let pvm_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Skybox PVM Layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX, false, pvm_size)],
        });
        let cubemap_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Skybox Cubemap Layout"),
            entries: &[texture_entry(0, wgpu::TextureViewDimension::Cube), sampler_entry(1)],
        });

        let vertex_layout = position_only_layout();
        let program = ShaderProgram::create(
            device,
            &ProgramDescriptor {
                label: "Skybox Program",
                vertex_source: include_str!("../shaders/skybox.vert.wgsl"),
                fragment_source: include_str!("../shaders/skybox.frag.wgsl"),
                vertex_layout: &vertex_layout,
                bind_group_layouts: &[&pvm_layout, &cubemap_layout],
                color_format,
                depth_compare: wgpu::CompareFunction::LessEqual,
            },
        )?;
        program.require_resource("pvm", slot(0, 0, ResourceKind::Uniform))?;
        program.require_resource("cubemap", slot(1, 0, ResourceKind::CubeTexture))?;
        program.require_resource("cubemap_sampler", slot(1, 1, ResourceKind::Sampler))?;

        let indices = quads_to_triangles(&SKYBOX_QUAD_INDICES);
        let buffers = GpuBufferSet::new(device, "Skybox", vertex_layout, &SKYBOX_VERTICES, &indices)?;
        program.check_buffers(&buffers)?;

        let cubemap = CubemapResource::upload(device, queue, faces);
        let sampler = create_sampler(device, "Skybox Sampler");
        let uniforms = GpuBuffer::uniform(device, "Skybox Uniforms", pvm_size);

        let pvm_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Skybox PVM Bind Group"),
            layout: &pvm_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniforms.raw().as_entire_binding(),
            }],
        });
        let cubemap_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Skybox Cubemap Bind Group"),
            layout: &cubemap_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&cubemap.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        Ok(Self {
            cubemap_bind_group,
            pvm_bind_group,
            uniforms,
            _sampler: sampler,
            cubemap,
            buffers,
            program,
        })
    }

    pub fn face_count(&self) -> u32 {
        self.cubemap.face_count()
    }
}

impl Pass for SkyboxPass {
    fn kind(&self) -> PassKind {
        PassKind::Skybox
    }

    fn prepare(&self, queue: &wgpu::Queue, frame: &FrameContext) {
        let pvm: [[f32; 4]; 4] = frame.transforms.skybox_pvm.to_cols_array_2d();
        self.uniforms.write(queue, 0, bytemuck::bytes_of(&pvm));
    }

    fn record(&self, pass: &mut wgpu::RenderPass<'_>) -> Result<(), RenderError> {
        self.program.bind(pass);
        pass.set_bind_group(0, &self.pvm_bind_group, &[]);
        pass.set_bind_group(1, &self.cubemap_bind_group, &[]);
        self.buffers.bind(pass);
        self.buffers.draw(pass);
        Ok(())
    }
}
