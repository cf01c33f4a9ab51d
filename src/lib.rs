use std::sync::Arc;

use winit::keyboard::KeyCode;
use winit::window::{Fullscreen, Window};

pub mod config;
pub mod error;
pub mod gpu;
pub mod model;
pub mod renderer;
pub mod scene;
pub mod shader;
pub mod timer;

use config::ViewerConfig;
use error::InitError;
use gpu::GpuContext;
use model::Mesh;
use renderer::{CubePass, FrameCapture, FrameContext, FrameRenderer, FrameStatus, MeshPass, Pass, RenderError, SkyboxPass};
use scene::{CameraState, FrameTransforms, KeyboardInput, ToggleChange, Toggles};
use timer::{CaptureCadence, FrameTimer};

/// Everything the viewer owns between frames.
pub struct App {
    window: Arc<Window>,
    gpu: GpuContext,
    renderer: FrameRenderer,
    camera: CameraState,
    toggles: Toggles,
    input: KeyboardInput,
    frame_timer: FrameTimer,
    cadence: CaptureCadence,
    capture: FrameCapture,
    last_dt: f64,
}

impl App {
    pub fn new(window: Arc<Window>, config: &ViewerConfig) -> Result<Self, InitError> {
        let gpu = GpuContext::new(window.clone())?;
        let format = gpu.format();

        let mesh = Mesh::load(&config.mesh_path)?;
        let passes: Vec<Box<dyn Pass>> = vec![
            Box::new(MeshPass::new(&gpu.device, format, mesh)?),
            Box::new(CubePass::new(&gpu.device, &gpu.queue, format, &config.media_dir)?),
            Box::new(SkyboxPass::new(&gpu.device, &gpu.queue, format, &config.media_dir)?),
        ];
        let (width, height) = gpu.size();
        let renderer = FrameRenderer::new(&gpu.device, width, height, passes)?;

        let toggles = Toggles {
            fullscreen: config.fullscreen,
            normal_mapping: config.normal_mapping,
            ..Toggles::default()
        };
        if toggles.fullscreen {
            window.set_fullscreen(Some(Fullscreen::Borderless(None)));
        }

        log::info!("Viewer ready ({}x{})", width, height);
        Ok(Self {
            window,
            gpu,
            renderer,
            camera: CameraState::new(),
            toggles,
            input: KeyboardInput::new(),
            frame_timer: FrameTimer::new(),
            cadence: CaptureCadence::default(),
            capture: FrameCapture::new(config.capture_dir.clone()),
            last_dt: 0.0,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn quit_requested(&self) -> bool {
        self.toggles.quit_requested
    }

    pub fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        self.input.process_key(key, pressed);
        if !pressed {
            return;
        }
        match self.toggles.on_key_press(key) {
            Some(ToggleChange::Fullscreen(on)) => {
                self.window.set_fullscreen(on.then_some(Fullscreen::Borderless(None)));
            }
            Some(ToggleChange::NormalMapping(on)) => log::info!("Normal mapping {}", if on { "on" } else { "off" }),
            Some(ToggleChange::VideoCapture(on)) => {
                self.cadence.reset();
                log::info!("Video capture {}", if on { "started" } else { "stopped" });
            }
            Some(ToggleChange::CaptureArmed) => log::debug!("Capture armed for next frame"),
            Some(ToggleChange::Quit) | None => {}
        }
    }

    /// Keys held while focus leaves the window never report a release.
    pub fn focus_lost(&mut self) {
        self.input.release_all();
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if self.gpu.resize(width, height) {
            self.renderer.resize(&self.gpu.device, width, height);
        }
    }

    pub fn update(&mut self) {
        self.last_dt = self.frame_timer.elapsed(true);
        self.camera.update(self.last_dt as f32, &self.input);
        self.camera.wrap_angles();
    }

    pub fn render(&mut self) -> Result<(), RenderError> {
        let single = self.toggles.capture_armed;
        let video = self.toggles.video_capture && self.cadence.tick(self.last_dt);

        let frame = FrameContext {
            transforms: FrameTransforms::new(&self.camera, self.gpu.aspect()),
            normal_mapping: self.toggles.normal_mapping,
        };

        let status = self.renderer.render_frame(&self.gpu, &frame, single || video)?;
        let single = single && self.toggles.settle_capture(matches!(status, FrameStatus::Presented { .. }));
        if let FrameStatus::Presented { pixels: Some(pixels) } = status {
            let (width, height) = self.gpu.size();
            for (wanted, as_video) in [(single, false), (video, true)] {
                if !wanted {
                    continue;
                }
                if let Err(e) = self.capture.save_frame(&pixels, width, height, as_video) {
                    log::error!("Frame capture failed: {:#}", e);
                }
            }
        }
        Ok(())
    }
}
