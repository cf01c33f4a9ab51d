use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use glam::Vec3;
use thiserror::Error;

use super::buffer::GpuBufferSet;
use super::vertex::{MeshVertex, VertexLayout};
use crate::shader::BindingError;

#[derive(Debug, Error)]
pub enum MeshError {
    #[error("mesh file not found: {0}")]
    NotFound(String),
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("unsupported mesh format: {0}")]
    Unsupported(String),
    #[error("failed to import glTF: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("mesh `{0}` already has GPU buffers")]
    AlreadyUploaded(String),
    #[error("mesh `{0}` has no GPU buffers")]
    NotUploaded(String),
    #[error(transparent)]
    Binding(#[from] BindingError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    fn of(vertices: &[MeshVertex]) -> Self {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for vertex in vertices {
            let p = Vec3::from(vertex.position);
            min = min.min(p);
            max = max.max(p);
        }
        Self { min, max }
    }
}

/// Externally loaded, indexed position + normal geometry.
pub struct Mesh {
    pub name: String,
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
    pub bounds: Bounds,
    buffers: Option<GpuBufferSet>,
}

impl Mesh {
    pub fn new(name: &str, vertices: Vec<MeshVertex>, indices: Vec<u32>) -> Self {
        let bounds = Bounds::of(&vertices);
        Self {
            name: name.to_string(),
            vertices,
            indices,
            bounds,
            buffers: None,
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, MeshError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(MeshError::NotFound(path.display().to_string()));
        }

        let extension = path
            .extension()
            .and_then(std::ffi::OsStr::to_str)
            .unwrap_or("")
            .to_lowercase();
        let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("mesh");

        let mesh = match extension.as_str() {
            "obj" => Self::parse_obj(name, BufReader::new(File::open(path)?))?,
            "gltf" | "glb" => Self::load_gltf(name, path)?,
            _ => return Err(MeshError::Unsupported(extension)),
        };

        log::info!(
            "Loaded mesh {} ({} vertices, {} triangles)",
            mesh.name,
            mesh.vertices.len(),
            mesh.indices.len() / 3
        );
        Ok(mesh)
    }

    /// Parses `v`, `vn` and `f` records. Faces with more than three corners
    /// are fanned into triangles; other records are ignored.
    pub fn parse_obj<R: BufRead>(name: &str, reader: R) -> Result<Self, MeshError> {
        let mut positions: Vec<[f32; 3]> = Vec::new();
        let mut normals: Vec<[f32; 3]> = Vec::new();
        let mut corners: Vec<(usize, Option<usize>)> = Vec::new();
        let mut triangles: Vec<[usize; 3]> = Vec::new();

        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            let number = number + 1;
            let tokens: Vec<&str> = line.split_whitespace().collect();
            let Some((&record, args)) = tokens.split_first() else {
                continue;
            };

            match record {
                "v" => positions.push(parse_vec3(args, number)?),
                "vn" => normals.push(parse_vec3(args, number)?),
                "f" => {
                    if args.len() < 3 {
                        return Err(MeshError::Parse {
                            line: number,
                            message: format!("face needs at least 3 corners, got {}", args.len()),
                        });
                    }
                    let first = corners.len();
                    for arg in args {
                        corners.push(parse_corner(arg, positions.len(), normals.len(), number)?);
                    }
                    for i in 1..args.len() - 1 {
                        triangles.push([first, first + i, first + i + 1]);
                    }
                }
                _ => {}
            }
        }

        let generated = if normals.is_empty() || corners.iter().any(|(_, n)| n.is_none()) {
            Some(smooth_normals(&positions, &corners, &triangles))
        } else {
            None
        };

        let mut lookup: HashMap<(usize, Option<usize>), u32> = HashMap::new();
        let mut vertices = Vec::new();
        let mut indices = Vec::with_capacity(triangles.len() * 3);

        for triangle in &triangles {
            for &corner in triangle {
                let key = corners[corner];
                let index = *lookup.entry(key).or_insert_with(|| {
                    let (position, normal) = key;
                    let normal = match (&generated, normal) {
                        (Some(generated), _) => generated[position],
                        (None, Some(n)) => normals[n],
                        (None, None) => [0.0, 1.0, 0.0],
                    };
                    vertices.push(MeshVertex {
                        position: positions[position],
                        normal,
                    });
                    (vertices.len() - 1) as u32
                });
                indices.push(index);
            }
        }

        if indices.is_empty() {
            return Err(MeshError::Parse {
                line: 0,
                message: "no faces in OBJ file".to_string(),
            });
        }

        Ok(Self::new(name, vertices, indices))
    }

    fn load_gltf(name: &str, path: &Path) -> Result<Self, MeshError> {
        let (document, buffers, _images) = gltf::import(path)?;

        let mut vertices: Vec<MeshVertex> = Vec::new();
        let mut indices: Vec<u32> = Vec::new();

        for mesh in document.meshes() {
            for primitive in mesh.primitives() {
                let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
                let Some(positions) = reader.read_positions() else {
                    log::warn!("Skipping primitive without positions in {}", name);
                    continue;
                };
                let positions: Vec<[f32; 3]> = positions.collect();

                let base = vertices.len() as u32;
                let local: Vec<u32> = match reader.read_indices() {
                    Some(iter) => iter.into_u32().collect(),
                    None => (0..positions.len() as u32).collect(),
                };

                let normals: Vec<[f32; 3]> = match reader.read_normals() {
                    Some(iter) => iter.collect(),
                    None => {
                        let corners: Vec<(usize, Option<usize>)> =
                            local.iter().map(|&i| (i as usize, None)).collect();
                        let triangles: Vec<[usize; 3]> =
                            (0..corners.len() / 3).map(|t| [3 * t, 3 * t + 1, 3 * t + 2]).collect();
                        smooth_normals(&positions, &corners, &triangles)
                    }
                };

                vertices.extend(
                    positions
                        .iter()
                        .zip(normals.iter())
                        .map(|(&position, &normal)| MeshVertex { position, normal }),
                );
                indices.extend(local.iter().map(|i| base + i));
            }
        }

        if vertices.is_empty() {
            return Err(MeshError::Parse {
                line: 0,
                message: "no mesh primitives in glTF file".to_string(),
            });
        }

        Ok(Self::new(name, vertices, indices))
    }

    pub fn vertex_layout() -> VertexLayout {
        MeshVertex::layout()
    }

    pub fn is_uploaded(&self) -> bool {
        self.buffers.is_some()
    }

    pub fn buffers(&self) -> Option<&GpuBufferSet> {
        self.buffers.as_ref()
    }

    pub fn setup_buffer_objects(&mut self, device: &wgpu::Device) -> Result<(), MeshError> {
        if self.buffers.is_some() {
            return Err(MeshError::AlreadyUploaded(self.name.clone()));
        }
        self.buffers = Some(GpuBufferSet::new(
            device,
            &self.name,
            Self::vertex_layout(),
            &self.vertices,
            &self.indices,
        )?);
        Ok(())
    }

    /// Binds the mesh buffers and issues one indexed draw. The caller has
    /// already bound the program and its uniforms.
    pub fn render(&self, pass: &mut wgpu::RenderPass<'_>) -> Result<(), MeshError> {
        let buffers = self
            .buffers
            .as_ref()
            .ok_or_else(|| MeshError::NotUploaded(self.name.clone()))?;
        buffers.bind(pass);
        buffers.draw(pass);
        Ok(())
    }

    pub fn release_buffer_objects(&mut self) {
        if self.buffers.take().is_some() {
            log::debug!("Released buffers of mesh {}", self.name);
        }
    }
}

fn parse_vec3(args: &[&str], line: usize) -> Result<[f32; 3], MeshError> {
    if args.len() < 3 {
        return Err(MeshError::Parse {
            line,
            message: format!("expected 3 components, got {}", args.len()),
        });
    }
    let mut out = [0.0; 3];
    for (slot, arg) in out.iter_mut().zip(args) {
        *slot = arg.parse::<f32>().map_err(|e| MeshError::Parse {
            line,
            message: format!("invalid number `{}`: {}", arg, e),
        })?;
    }
    Ok(out)
}

// OBJ indices are 1-based; negative values count back from the end.
fn resolve_index(token: &str, count: usize, line: usize) -> Result<usize, MeshError> {
    let raw: i64 = token.parse().map_err(|_| MeshError::Parse {
        line,
        message: format!("invalid index `{}`", token),
    })?;
    let index = if raw < 0 { count as i64 + raw } else { raw - 1 };
    if index < 0 || index as usize >= count {
        return Err(MeshError::Parse {
            line,
            message: format!("index {} out of range (have {})", raw, count),
        });
    }
    Ok(index as usize)
}

fn parse_corner(
    token: &str,
    position_count: usize,
    normal_count: usize,
    line: usize,
) -> Result<(usize, Option<usize>), MeshError> {
    let mut parts = token.split('/');
    let position = resolve_index(parts.next().unwrap_or(""), position_count, line)?;
    let _tex_coord = parts.next();
    let normal = match parts.next() {
        Some(n) if !n.is_empty() => Some(resolve_index(n, normal_count, line)?),
        _ => None,
    };
    Ok((position, normal))
}

/// Area-weighted vertex normals, one per position.
fn smooth_normals(positions: &[[f32; 3]], corners: &[(usize, Option<usize>)], triangles: &[[usize; 3]]) -> Vec<[f32; 3]> {
    let mut accumulated = vec![Vec3::ZERO; positions.len()];
    for triangle in triangles {
        let [a, b, c] = triangle.map(|corner| corners[corner].0);
        let (pa, pb, pc) = (Vec3::from(positions[a]), Vec3::from(positions[b]), Vec3::from(positions[c]));
        let face = (pb - pa).cross(pc - pa);
        for index in [a, b, c] {
            accumulated[index] += face;
        }
    }
    accumulated
        .into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Y).to_array())
        .collect()
}
