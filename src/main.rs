use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use winit::{
    dpi::PhysicalSize,
    event::*,
    event_loop::EventLoop,
    keyboard::PhysicalKey,
    window::WindowBuilder,
};
use wgpu_normalmap_viewer::{config::ViewerConfig, App};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Window width in pixels
    #[arg(long, default_value_t = wgpu_normalmap_viewer::config::DEFAULT_WIDTH)]
    width: u32,

    /// Window height in pixels
    #[arg(long, default_value_t = wgpu_normalmap_viewer::config::DEFAULT_HEIGHT)]
    height: u32,

    /// Mesh drawn in front of the camera (.obj, .gltf or .glb)
    #[arg(long, default_value = wgpu_normalmap_viewer::config::DEFAULT_MESH)]
    mesh: PathBuf,

    /// Directory with the cube textures and skybox faces
    #[arg(long, default_value = wgpu_normalmap_viewer::config::DEFAULT_MEDIA_DIR)]
    media: PathBuf,

    /// Where captured frames are written
    #[arg(long, default_value = ".")]
    capture_dir: PathBuf,

    /// Start in borderless fullscreen
    #[arg(long)]
    fullscreen: bool,

    /// Start with normal mapping disabled
    #[arg(long)]
    no_normal_mapping: bool,
}

impl From<Args> for ViewerConfig {
    fn from(args: Args) -> Self {
        ViewerConfig {
            width: args.width,
            height: args.height,
            mesh_path: args.mesh,
            media_dir: args.media,
            capture_dir: args.capture_dir,
            fullscreen: args.fullscreen,
            normal_mapping: !args.no_normal_mapping,
        }
        .sanitized()
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = ViewerConfig::from(Args::parse());

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    let window = WindowBuilder::new()
        .with_title("Normal Mapping Viewer")
        .with_inner_size(PhysicalSize::new(config.width, config.height))
        .build(&event_loop)?;

    let mut app = App::new(Arc::new(window), &config).context("failed to initialize viewer")?;

    event_loop.run(move |event, elwt| {
        if app.quit_requested() {
            elwt.exit();
            return;
        }
        match event {
            Event::WindowEvent { window_id, event } if window_id == app.window().id() => match event {
                WindowEvent::KeyboardInput {
                    event:
                        KeyEvent {
                            physical_key: PhysicalKey::Code(key_code),
                            state,
                            repeat: false,
                            ..
                        },
                    ..
                } => app.handle_key(key_code, state == ElementState::Pressed),
                WindowEvent::Focused(false) => app.focus_lost(),
                WindowEvent::CloseRequested => elwt.exit(),
                WindowEvent::Resized(size) => app.resize(size.width, size.height),
                WindowEvent::RedrawRequested => {
                    app.update();
                    if let Err(e) = app.render() {
                        log::error!("Render error: {}", e);
                        elwt.exit();
                    }
                }
                _ => {}
            },
            Event::AboutToWait => app.window().request_redraw(),
            _ => {}
        }
    })?;

    Ok(())
}
