//! Static geometry: the four normal-mapped quads and the skybox cube.

use super::tangent::{compute_quad_tangents, DegeneratePolicy, TangentError};
use super::Vertex;

pub const QUAD_COUNT: usize = 4;
pub const QUAD_VERTEX_COUNT: usize = QUAD_COUNT * 4;

/// Front, back, right and left faces of a 2×2×2 cube, one quad each.
pub const QUAD_VERTICES: [Vertex; QUAD_VERTEX_COUNT] = [
    Vertex::new([-1.0, 1.0, 1.0], [0.0, 0.0, 1.0], [0.0, 0.0, 0.0]),
    Vertex::new([-1.0, -1.0, 1.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
    Vertex::new([1.0, -1.0, 1.0], [0.0, 0.0, 1.0], [1.0, 1.0, 0.0]),
    Vertex::new([1.0, 1.0, 1.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
    Vertex::new([1.0, 1.0, -1.0], [0.0, 0.0, -1.0], [0.0, 0.0, 0.0]),
    Vertex::new([1.0, -1.0, -1.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
    Vertex::new([-1.0, -1.0, -1.0], [0.0, 0.0, -1.0], [1.0, 1.0, 0.0]),
    Vertex::new([-1.0, 1.0, -1.0], [0.0, 0.0, -1.0], [1.0, 0.0, 0.0]),
    Vertex::new([1.0, 1.0, 1.0], [1.0, 0.0, 0.0], [0.0, 0.0, 0.0]),
    Vertex::new([1.0, -1.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    Vertex::new([1.0, -1.0, -1.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]),
    Vertex::new([1.0, 1.0, -1.0], [1.0, 0.0, 0.0], [1.0, 0.0, 0.0]),
    Vertex::new([-1.0, 1.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 0.0, 0.0]),
    Vertex::new([-1.0, -1.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    Vertex::new([-1.0, -1.0, 1.0], [-1.0, 0.0, 0.0], [1.0, 1.0, 0.0]),
    Vertex::new([-1.0, 1.0, 1.0], [-1.0, 0.0, 0.0], [1.0, 0.0, 0.0]),
];

pub const QUAD_INDICES: [u32; QUAD_VERTEX_COUNT] = [
    0, 1, 2, 3, //
    4, 5, 6, 7, //
    8, 9, 10, 11, //
    12, 13, 14, 15,
];

pub const SKYBOX_VERTICES: [[f32; 3]; 8] = [
    [-1.0, 1.0, 1.0],
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, 1.0],
    [1.0, 1.0, 1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [1.0, 1.0, -1.0],
];

pub const SKYBOX_QUAD_INDICES: [u16; 24] = [
    0, 1, 2, 3, //
    3, 2, 6, 7, //
    7, 6, 5, 4, //
    4, 5, 1, 0, //
    0, 3, 7, 4, //
    1, 2, 6, 5,
];

/// Splits quads `(a, b, c, d)` into the triangles `(a, b, c)` and `(a, c, d)`.
///
/// Trailing indices that do not form a full quad are dropped.
pub fn quads_to_triangles<I: Copy>(quads: &[I]) -> Vec<I> {
    let mut triangles = Vec::with_capacity(quads.len() / 4 * 6);
    for quad in quads.chunks_exact(4) {
        triangles.extend_from_slice(&[quad[0], quad[1], quad[2], quad[0], quad[2], quad[3]]);
    }
    triangles
}

/// Builds the quad vertex array with every corner's tangent basis filled in.
pub fn build_quad_vertices(policy: DegeneratePolicy) -> Result<Vec<Vertex>, TangentError> {
    let mut vertices = QUAD_VERTICES.to_vec();
    for quad in 0..QUAD_COUNT {
        compute_quad_tangents(&mut vertices, quad * 4, policy)?;
    }
    Ok(vertices)
}
