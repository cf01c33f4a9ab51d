pub mod capture;
mod passes;
pub mod readback;

pub use capture::FrameCapture;
pub use passes::{dynamic_stride, CubePass, MeshPass, Pass, SkyboxPass, CUBE_NORMAL_MAP_FILE, CUBE_TEXTURE_FILE};

use thiserror::Error;

use crate::error::InitError;
use crate::gpu::GpuContext;
use crate::model::MeshError;
use crate::scene::FrameTransforms;
use crate::shader::DEPTH_FORMAT;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    ExternalMesh,
    CubeInstances,
    Skybox,
}

impl PassKind {
    pub fn phase(self) -> FramePhase {
        match self {
            PassKind::ExternalMesh => FramePhase::ExternalMesh,
            PassKind::CubeInstances => FramePhase::CubeInstances,
            PassKind::Skybox => FramePhase::Skybox,
        }
    }
}

/// Draw order of a frame. The skybox goes last so it only fills pixels
/// nothing else has covered.
pub const PASS_ORDER: [PassKind; 3] = [PassKind::ExternalMesh, PassKind::CubeInstances, PassKind::Skybox];

pub fn validate_pass_order(kinds: &[PassKind]) -> Result<(), InitError> {
    if kinds != PASS_ORDER {
        return Err(InitError::PassOrder {
            expected: PASS_ORDER.to_vec(),
            actual: kinds.to_vec(),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePhase {
    Idle,
    Cleared,
    ExternalMesh,
    CubeInstances,
    Skybox,
    Presented,
}

impl FramePhase {
    pub fn next(self) -> FramePhase {
        match self {
            FramePhase::Idle => FramePhase::Cleared,
            FramePhase::Cleared => FramePhase::ExternalMesh,
            FramePhase::ExternalMesh => FramePhase::CubeInstances,
            FramePhase::CubeInstances => FramePhase::Skybox,
            FramePhase::Skybox => FramePhase::Presented,
            FramePhase::Presented => FramePhase::Idle,
        }
    }
}

/// Per-frame inputs shared by every pass.
#[derive(Debug, Clone, Copy)]
pub struct FrameContext {
    pub transforms: FrameTransforms,
    pub normal_mapping: bool,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("out of GPU memory while acquiring the surface")]
    OutOfMemory,
    #[error("frame moved from {from:?} to {to:?}")]
    PhaseOrder { from: FramePhase, to: FramePhase },
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

#[derive(Debug)]
pub enum FrameStatus {
    /// The frame was shown; `pixels` holds RGBA data when a capture was requested.
    Presented { pixels: Option<Vec<u8>> },
    /// The surface had to be reconfigured; nothing was drawn.
    Skipped,
}

/// How the frame loop reacts to a failed surface acquire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceErrorAction {
    Reconfigure,
    SkipFrame,
    Fatal,
}

pub fn surface_error_action(error: &wgpu::SurfaceError) -> SurfaceErrorAction {
    match error {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => SurfaceErrorAction::Reconfigure,
        wgpu::SurfaceError::Timeout => SurfaceErrorAction::SkipFrame,
        wgpu::SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
    }
}

pub const CLEAR_COLOR: wgpu::Color = wgpu::Color::BLACK;

struct DepthTarget {
    view: wgpu::TextureView,
    texture: wgpu::Texture,
}

impl DepthTarget {
    fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { view, texture }
    }
}

impl Drop for DepthTarget {
    fn drop(&mut self) {
        self.texture.destroy();
    }
}

/// Runs the ordered pass list once per frame.
pub struct FrameRenderer {
    phase: FramePhase,
    depth: DepthTarget,
    passes: Vec<Box<dyn Pass>>,
}

impl FrameRenderer {
    pub fn new(device: &wgpu::Device, width: u32, height: u32, passes: Vec<Box<dyn Pass>>) -> Result<Self, InitError> {
        let kinds: Vec<PassKind> = passes.iter().map(|p| p.kind()).collect();
        validate_pass_order(&kinds)?;
        Ok(Self {
            phase: FramePhase::Idle,
            depth: DepthTarget::new(device, width, height),
            passes,
        })
    }

    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth = DepthTarget::new(device, width, height);
    }

    fn advance(&mut self, to: FramePhase) -> Result<(), RenderError> {
        if self.phase.next() != to {
            return Err(RenderError::PhaseOrder { from: self.phase, to });
        }
        log::trace!("Frame phase {:?} -> {:?}", self.phase, to);
        self.phase = to;
        Ok(())
    }

    /// Records clear + every pass into one command buffer targeting `target`.
    fn encode(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &wgpu::TextureView,
        frame: &FrameContext,
    ) -> Result<wgpu::CommandBuffer, RenderError> {
        for pass in &self.passes {
            pass.prepare(queue, frame);
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Frame Encoder"),
        });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Frame Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            self.advance(FramePhase::Cleared)?;

            for pass in &self.passes {
                let to = pass.kind().phase();
                if self.phase.next() != to {
                    return Err(RenderError::PhaseOrder { from: self.phase, to });
                }
                pass.record(&mut render_pass)?;
                self.phase = to;
            }
        }
        Ok(encoder.finish())
    }

    fn finish(&mut self) -> Result<(), RenderError> {
        self.advance(FramePhase::Presented)?;
        self.advance(FramePhase::Idle)
    }

    /// Draws into an arbitrary colour target, e.g. an offscreen texture.
    pub fn render_to(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &wgpu::TextureView,
        frame: &FrameContext,
    ) -> Result<(), RenderError> {
        let commands = self.encode(device, queue, target, frame);
        let commands = self.recover(commands)?;
        queue.submit(std::iter::once(commands));
        self.finish()
    }

    pub fn render_frame(
        &mut self,
        gpu: &GpuContext,
        frame: &FrameContext,
        capture: bool,
    ) -> Result<FrameStatus, RenderError> {
        let output = match gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(error) => match surface_error_action(&error) {
                SurfaceErrorAction::Reconfigure => {
                    log::warn!("Surface acquire failed ({}); reconfiguring and skipping frame", error);
                    gpu.reconfigure();
                    return Ok(FrameStatus::Skipped);
                }
                SurfaceErrorAction::SkipFrame => {
                    log::warn!("Surface acquire failed ({}); skipping frame", error);
                    return Ok(FrameStatus::Skipped);
                }
                SurfaceErrorAction::Fatal => return Err(RenderError::OutOfMemory),
            },
        };
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let commands = self.encode(&gpu.device, &gpu.queue, &view, frame);
        let commands = self.recover(commands)?;
        gpu.queue.submit(std::iter::once(commands));

        let pixels = if capture && gpu.capture_supported {
            match readback::read_texture_rgba(&gpu.device, &gpu.queue, &output.texture) {
                Ok(pixels) => Some(pixels),
                Err(e) => {
                    log::error!("Frame read-back failed: {:#}", e);
                    None
                }
            }
        } else {
            if capture {
                log::warn!("Surface does not support COPY_SRC; capture skipped");
            }
            None
        };

        output.present();
        self.finish()?;
        Ok(FrameStatus::Presented { pixels })
    }

    // A failed frame starts over from Idle next time.
    fn recover<T>(&mut self, result: Result<T, RenderError>) -> Result<T, RenderError> {
        if result.is_err() {
            self.phase = FramePhase::Idle;
        }
        result
    }
}
