//! Per-vertex tangent space derived from positions and texture coordinates.
//!
//! For a triangle `(p0, p1, p2)` the edge vectors in object space are related
//! to the edge vectors in texture space by a 2×2 system. Solving it gives the
//! tangent and bitangent of `p0`. Results are left unnormalized; the shaders
//! normalize after interpolation.

use glam::{Vec2, Vec3};
use thiserror::Error;

use super::Vertex;

/// Determinants smaller than this are treated as a collapsed UV mapping.
pub const DEGENERATE_EPSILON: f32 = 1e-8;

/// Corner orderings that give every corner of a quad its own triangle.
pub const QUAD_CORNER_TRIANGLES: [[usize; 3]; 4] = [[0, 1, 2], [1, 2, 3], [2, 3, 0], [3, 0, 1]];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegeneratePolicy {
    /// Fail with [`TangentError::DegenerateUv`].
    Reject,
    /// Warn, zero the basis and keep going.
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TangentOutcome {
    Computed,
    Skipped,
}

#[derive(Debug, Error, PartialEq)]
pub enum TangentError {
    #[error("degenerate texture mapping at vertex {vertex} (det = {det})")]
    DegenerateUv { vertex: usize, det: f32 },
    #[error("triangle ({0}, {1}, {2}) indexes past the vertex array")]
    OutOfRange(usize, usize, usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TangentBasis {
    pub tangent: Vec3,
    pub bitangent: Vec3,
    pub normal: Vec3,
}

/// Solves the tangent basis of `p0` for the triangle `(p0, p1, p2)`.
///
/// Fails with the offending determinant when it is (nearly) zero.
pub fn solve_basis(p0: &Vertex, p1: &Vertex, p2: &Vertex) -> Result<TangentBasis, f32> {
    let origin = Vec3::from(p0.position);
    let e1 = Vec3::from(p1.position) - origin;
    let e2 = Vec3::from(p2.position) - origin;

    let uv0 = Vec2::new(p0.tex_coords[0], p0.tex_coords[1]);
    let u1 = Vec2::new(p1.tex_coords[0], p1.tex_coords[1]) - uv0;
    let u2 = Vec2::new(p2.tex_coords[0], p2.tex_coords[1]) - uv0;

    let det = u1.x * u2.y - u2.x * u1.y;
    if det.abs() < DEGENERATE_EPSILON || !det.is_finite() {
        return Err(det);
    }

    let tangent = (e1 * u2.y - e2 * u1.y) / det;
    let bitangent = (-e1 * u2.x + e2 * u1.x) / det;

    Ok(TangentBasis {
        tangent,
        bitangent,
        normal: bitangent.cross(tangent),
    })
}

/// Writes the tangent, bitangent and derived normal of `vertices[i0]`.
///
/// `vertices[i1]` and `vertices[i2]` are only read; the vertex normal of
/// `vertices[i0]` is never touched.
pub fn compute_tangent_basis(
    vertices: &mut [Vertex],
    [i0, i1, i2]: [usize; 3],
    policy: DegeneratePolicy,
) -> Result<TangentOutcome, TangentError> {
    let len = vertices.len();
    if i0 >= len || i1 >= len || i2 >= len {
        return Err(TangentError::OutOfRange(i0, i1, i2));
    }

    let (p1, p2) = (vertices[i1], vertices[i2]);
    let p0 = &mut vertices[i0];

    match solve_basis(p0, &p1, &p2) {
        Ok(basis) => {
            p0.tangent = basis.tangent.to_array();
            p0.bitangent = basis.bitangent.to_array();
            p0.face_normal = basis.normal.to_array();
            Ok(TangentOutcome::Computed)
        }
        Err(det) => match policy {
            DegeneratePolicy::Reject => Err(TangentError::DegenerateUv { vertex: i0, det }),
            DegeneratePolicy::Skip => {
                log::warn!("Skipping tangent basis for vertex {} (det = {})", i0, det);
                p0.tangent = [0.0; 3];
                p0.bitangent = [0.0; 3];
                p0.face_normal = [0.0; 3];
                Ok(TangentOutcome::Skipped)
            }
        },
    }
}

/// Fills the basis of the four corners of the quad starting at `base`.
pub fn compute_quad_tangents(
    vertices: &mut [Vertex],
    base: usize,
    policy: DegeneratePolicy,
) -> Result<usize, TangentError> {
    let mut skipped = 0;
    for corners in QUAD_CORNER_TRIANGLES {
        let triangle = corners.map(|c| base + c);
        if compute_tangent_basis(vertices, triangle, policy)? == TangentOutcome::Skipped {
            skipped += 1;
        }
    }
    Ok(skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::geometry::{QUAD_COUNT, QUAD_VERTICES};

    fn assert_close(a: [f32; 3], b: Vec3) {
        assert!((Vec3::from(a) - b).length() < 1e-5, "{:?} != {:?}", a, b);
    }

    fn front_triangle() -> Vec<Vertex> {
        QUAD_VERTICES[0..4].to_vec()
    }

    #[test]
    fn derived_normal_is_parallel_to_vertex_normal() {
        let mut vertices = QUAD_VERTICES.to_vec();
        for quad in 0..QUAD_COUNT {
            compute_quad_tangents(&mut vertices, quad * 4, DegeneratePolicy::Reject).unwrap();
        }

        for (i, v) in vertices.iter().enumerate() {
            let derived = Vec3::from(v.bitangent).cross(Vec3::from(v.tangent));
            let normal = Vec3::from(v.normal);
            assert!(derived.cross(normal).length() < 1e-5, "vertex {} not parallel", i);
            assert!(derived.dot(normal) > 0.0, "vertex {} points inward", i);
            assert_eq!(Vec3::from(v.face_normal), derived);
        }
    }

    #[test]
    fn front_face_basis_matches_hand_solution() {
        let mut vertices = front_triangle();
        compute_tangent_basis(&mut vertices, [0, 1, 2], DegeneratePolicy::Reject).unwrap();

        assert_eq!(vertices[0].tangent, [2.0, 0.0, 0.0]);
        assert_eq!(vertices[0].bitangent, [0.0, -2.0, 0.0]);
        assert_eq!(vertices[0].face_normal, [0.0, 0.0, 4.0]);
    }

    #[test]
    fn vertex_normal_and_neighbours_are_untouched() {
        let mut vertices = front_triangle();
        compute_tangent_basis(&mut vertices, [0, 1, 2], DegeneratePolicy::Reject).unwrap();

        assert_eq!(vertices[0].normal, QUAD_VERTICES[0].normal);
        assert_eq!(vertices[1], QUAD_VERTICES[1]);
        assert_eq!(vertices[2], QUAD_VERTICES[2]);
    }

    #[test]
    fn swapping_p1_and_p2_solves_the_same_system() {
        let mut forward = front_triangle();
        let mut swapped = front_triangle();
        compute_tangent_basis(&mut forward, [0, 1, 2], DegeneratePolicy::Reject).unwrap();
        compute_tangent_basis(&mut swapped, [0, 2, 1], DegeneratePolicy::Reject).unwrap();

        assert_close(forward[0].tangent, Vec3::from(swapped[0].tangent));
        assert_close(forward[0].bitangent, Vec3::from(swapped[0].bitangent));
    }

    #[test]
    fn mirrored_uv_mapping_flips_the_bitangent() {
        let mut original = front_triangle();
        let mut mirrored = front_triangle();
        for v in &mut mirrored {
            v.tex_coords[1] = 1.0 - v.tex_coords[1];
        }
        compute_tangent_basis(&mut original, [0, 1, 2], DegeneratePolicy::Reject).unwrap();
        compute_tangent_basis(&mut mirrored, [0, 1, 2], DegeneratePolicy::Reject).unwrap();

        assert_close(original[0].tangent, Vec3::from(mirrored[0].tangent));
        assert_close(original[0].bitangent, -Vec3::from(mirrored[0].bitangent));
        assert_close(original[0].face_normal, -Vec3::from(mirrored[0].face_normal));
    }

    #[test]
    fn collapsed_uvs_are_rejected() {
        let mut vertices = front_triangle();
        for v in &mut vertices {
            v.tex_coords = [0.5, 0.5, 0.0];
        }
        let err = compute_tangent_basis(&mut vertices, [0, 1, 2], DegeneratePolicy::Reject).unwrap_err();
        assert_eq!(err, TangentError::DegenerateUv { vertex: 0, det: 0.0 });
        assert_eq!(vertices[0].tangent, [0.0; 3]);
    }

    #[test_log::test]
    fn collapsed_uvs_are_skipped_without_nan() {
        let mut vertices = front_triangle();
        vertices[0].tangent = [9.0; 3];
        for v in &mut vertices {
            v.tex_coords = [0.25, 0.25, 0.0];
        }
        let skipped = compute_quad_tangents(&mut vertices, 0, DegeneratePolicy::Skip).unwrap();
        assert_eq!(skipped, 4);
        assert!(vertices.iter().all(|v| v.tangent == [0.0; 3] && v.bitangent == [0.0; 3]));
    }

    #[test]
    fn out_of_range_triangle_is_an_error() {
        let mut vertices = front_triangle();
        let err = compute_tangent_basis(&mut vertices, [0, 1, 7], DegeneratePolicy::Skip).unwrap_err();
        assert_eq!(err, TangentError::OutOfRange(0, 1, 7));
    }
}
