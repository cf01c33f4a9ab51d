use std::path::{Path, PathBuf};

use image::RgbaImage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("cubemap face {face:?} is {actual:?}, expected {expected:?}")]
    FaceMismatch {
        face: CubeFace,
        expected: (u32, u32),
        actual: (u32, u32),
    },
    #[error("cubemap face {face:?} is {width}x{height}; faces must be square")]
    NotSquare { face: CubeFace, width: u32, height: u32 },
}

/// How texel values are interpreted when sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureKind {
    /// sRGB colour data.
    Color,
    /// Linear data such as a tangent-space normal map.
    Data,
}

impl TextureKind {
    fn format(self) -> wgpu::TextureFormat {
        match self {
            TextureKind::Color => wgpu::TextureFormat::Rgba8UnormSrgb,
            TextureKind::Data => wgpu::TextureFormat::Rgba8Unorm,
        }
    }
}

fn decode(path: &Path) -> Result<RgbaImage, TextureError> {
    image::open(path)
        .map(|img| img.to_rgba8())
        .map_err(|source| TextureError::Decode {
            path: path.to_path_buf(),
            source,
        })
}

fn write_layer(queue: &wgpu::Queue, texture: &wgpu::Texture, layer: u32, image: &RgbaImage) {
    let (width, height) = image.dimensions();
    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d { x: 0, y: 0, z: layer },
            aspect: wgpu::TextureAspect::All,
        },
        image.as_raw(),
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
}

/// A sampled 2D texture. The GPU texture is destroyed on drop.
pub struct TextureResource {
    label: String,
    pub view: wgpu::TextureView,
    texture: wgpu::Texture,
}

impl TextureResource {
    pub fn from_path(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: &Path,
        kind: TextureKind,
    ) -> Result<Self, TextureError> {
        let image = decode(path)?;
        let label = path.display().to_string();
        Ok(Self::from_image(device, queue, &image, kind, &label))
    }

    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &RgbaImage,
        kind: TextureKind,
        label: &str,
    ) -> Self {
        let (width, height) = image.dimensions();
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: kind.format(),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        write_layer(queue, &texture, 0, image);

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        log::debug!("Uploaded texture {} ({}x{})", label, width, height);

        Self {
            label: label.to_string(),
            view,
            texture,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.texture.width(), self.texture.height())
    }
}

impl Drop for TextureResource {
    fn drop(&mut self) {
        log::trace!("Destroying texture {}", self.label);
        self.texture.destroy();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CubeFace {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

impl CubeFace {
    /// Layer order of a wgpu cube texture.
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];

    pub fn file_stem(self) -> &'static str {
        match self {
            CubeFace::PositiveX => "xpos",
            CubeFace::NegativeX => "xneg",
            CubeFace::PositiveY => "ypos",
            CubeFace::NegativeY => "yneg",
            CubeFace::PositiveZ => "zpos",
            CubeFace::NegativeZ => "zneg",
        }
    }
}

/// Six decoded square faces of equal size, in [`CubeFace::ALL`] order.
#[derive(Debug)]
pub struct CubemapFaces {
    faces: Vec<RgbaImage>,
}

impl CubemapFaces {
    /// Decodes every face before anything is allocated on the GPU.
    pub fn load<P: AsRef<Path>>(paths: [P; 6]) -> Result<Self, TextureError> {
        let mut faces: Vec<RgbaImage> = Vec::with_capacity(6);
        for (face, path) in CubeFace::ALL.into_iter().zip(paths.iter()) {
            let image = decode(path.as_ref())?;
            let (width, height) = image.dimensions();
            if width != height {
                return Err(TextureError::NotSquare { face, width, height });
            }
            if let Some(first) = faces.first() {
                if first.dimensions() != image.dimensions() {
                    return Err(TextureError::FaceMismatch {
                        face,
                        expected: first.dimensions(),
                        actual: image.dimensions(),
                    });
                }
            }
            faces.push(image);
        }
        Ok(Self { faces })
    }

    /// Loads `xpos.png`, `xneg.png`, ... from `dir`.
    pub fn load_dir(dir: &Path) -> Result<Self, TextureError> {
        Self::load(CubeFace::ALL.map(|face| dir.join(format!("{}.png", face.file_stem()))))
    }

    pub fn face_size(&self) -> (u32, u32) {
        self.faces.first().map(|f| f.dimensions()).unwrap_or((0, 0))
    }

    pub fn face(&self, face: CubeFace) -> &RgbaImage {
        &self.faces[face as usize]
    }
}

pub struct CubemapResource {
    pub view: wgpu::TextureView,
    texture: wgpu::Texture,
}

impl CubemapResource {
    pub fn upload(device: &wgpu::Device, queue: &wgpu::Queue, faces: &CubemapFaces) -> Self {
        let (width, height) = faces.face_size();
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Skybox Cubemap"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TextureKind::Color.format(),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (layer, face) in CubeFace::ALL.into_iter().enumerate() {
            write_layer(queue, &texture, layer as u32, faces.face(face));
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Skybox Cubemap View"),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        log::debug!("Uploaded cubemap ({}x{} per face)", width, height);

        Self { view, texture }
    }

    pub fn face_count(&self) -> u32 {
        self.texture.depth_or_array_layers()
    }
}

impl Drop for CubemapResource {
    fn drop(&mut self) {
        log::trace!("Destroying cubemap");
        self.texture.destroy();
    }
}

/// Linear, clamped sampler shared by every pass.
pub fn create_sampler(device: &wgpu::Device, label: &str) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}
