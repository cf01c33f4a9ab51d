use anyhow::{anyhow, bail, ensure, Result};
use futures_intrusive::channel::shared::oneshot_channel;

fn align_bytes_per_row(value: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    value.div_ceil(align) * align
}

/// Whether a format stores blue before red.
fn is_bgra(format: wgpu::TextureFormat) -> Result<bool> {
    match format {
        wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb => Ok(false),
        wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb => Ok(true),
        other => bail!("frame read-back does not support {:?}", other),
    }
}

/// Removes row padding and reorders channels to RGBA.
pub fn unpad_rows(data: &[u8], width: u32, height: u32, padded_row: u32, bgra: bool) -> Vec<u8> {
    let tight_row = (width * 4) as usize;
    let mut pixels = Vec::with_capacity(tight_row * height as usize);
    for row in data.chunks(padded_row as usize).take(height as usize) {
        pixels.extend_from_slice(&row[..tight_row]);
    }
    if bgra {
        for pixel in pixels.chunks_exact_mut(4) {
            pixel.swap(0, 2);
        }
    }
    pixels
}

/// Copies a single-sample RGBA8/BGRA8 texture into tightly packed RGBA bytes.
/// Blocks until the GPU has finished.
pub fn read_texture_rgba(device: &wgpu::Device, queue: &wgpu::Queue, texture: &wgpu::Texture) -> Result<Vec<u8>> {
    let (width, height) = (texture.width(), texture.height());
    ensure!(width > 0 && height > 0, "read-back size must be positive");
    ensure!(
        texture.usage().contains(wgpu::TextureUsages::COPY_SRC),
        "texture was not created with COPY_SRC"
    );
    let bgra = is_bgra(texture.format())?;

    let padded_row = align_bytes_per_row(width * 4);
    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Frame Read-back Buffer"),
        size: padded_row as wgpu::BufferAddress * height as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Frame Read-back Encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::ImageCopyTexture {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::ImageCopyBuffer {
            buffer: &staging,
            layout: wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(padded_row),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let slice = staging.slice(..);
    let (sender, receiver) = oneshot_channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });
    device.poll(wgpu::Maintain::Wait);

    pollster::block_on(receiver.receive()).ok_or_else(|| anyhow!("read-back channel closed"))??;

    let pixels = {
        let data = slice.get_mapped_range();
        unpad_rows(&data, width, height, padded_row, bgra)
    };
    staging.unmap();
    staging.destroy();

    Ok(pixels)
}
