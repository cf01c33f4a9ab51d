use super::*;
use crate::test_support::create_test_device;
use approx::assert_relative_eq;
use assert_fs::prelude::*;
use std::io::Cursor;

const QUAD_OBJ: &str = "\
# unit quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vn 0 0 1
f 1//1 2//1 3//1 4//1
";

#[test]
fn test_vertex_offsets_and_stride() {
    let layout = Vertex::layout();
    let offsets: Vec<u64> = layout.fields.iter().map(|f| f.offset).collect();
    assert_eq!(offsets, vec![0, 12, 24, 36, 48, 60]);
    assert_eq!(layout.stride, 128);
    assert_eq!(std::mem::size_of::<Vertex>(), 128);
    assert_eq!(Vertex::STRIDE, 128);
}

#[test]
fn test_mesh_vertex_layout() {
    let layout = Mesh::vertex_layout();
    assert_eq!(layout.stride, 24);
    assert_eq!(layout.field("vertex").map(|f| f.offset), Some(0));
    assert_eq!(layout.field("normal").map(|f| f.offset), Some(12));
    assert!(layout.field("texcoord").is_none());
}

#[test]
fn test_obj_quad_is_fanned() {
    let mesh = Mesh::parse_obj("quad", Cursor::new(QUAD_OBJ)).unwrap();
    assert_eq!(mesh.vertices.len(), 4);
    assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
    assert_eq!(mesh.vertices[2].normal, [0.0, 0.0, 1.0]);
    assert_eq!(mesh.bounds.min, glam::Vec3::ZERO);
    assert_eq!(mesh.bounds.max, glam::Vec3::new(1.0, 1.0, 0.0));
}

#[test]
fn test_obj_shared_corners_are_deduplicated() {
    let source = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3\nf 1 3 4\n";
    let mesh = Mesh::parse_obj("shared", Cursor::new(source)).unwrap();
    assert_eq!(mesh.vertices.len(), 4);
    assert_eq!(mesh.indices.len(), 6);
}

#[test]
fn test_obj_missing_normals_are_generated() {
    let source = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
    let mesh = Mesh::parse_obj("tri", Cursor::new(source)).unwrap();
    for vertex in &mesh.vertices {
        assert_relative_eq!(vertex.normal[0], 0.0);
        assert_relative_eq!(vertex.normal[1], 0.0);
        assert_relative_eq!(vertex.normal[2], 1.0);
    }
}

#[test]
fn test_obj_negative_indices() {
    let source = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n";
    let mesh = Mesh::parse_obj("tri", Cursor::new(source)).unwrap();
    assert_eq!(mesh.vertices[0].position, [0.0, 0.0, 0.0]);
    assert_eq!(mesh.vertices[2].position, [0.0, 1.0, 0.0]);
}

#[test]
fn test_obj_errors_carry_line_numbers() {
    let bad_number = "v 0 0 0\nv 1 x 0\n";
    match Mesh::parse_obj("bad", Cursor::new(bad_number)) {
        Err(MeshError::Parse { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected parse error, got {:?}", other.err()),
    }

    let bad_index = "v 0 0 0\nv 1 0 0\n\nf 1 2 9\n";
    match Mesh::parse_obj("bad", Cursor::new(bad_index)) {
        Err(MeshError::Parse { line, message }) => {
            assert_eq!(line, 4);
            assert!(message.contains("out of range"));
        }
        other => panic!("expected parse error, got {:?}", other.err()),
    }
}

#[test]
fn test_missing_and_unsupported_files() {
    let temp = assert_fs::TempDir::new().unwrap();
    assert!(matches!(
        Mesh::load(temp.child("teapot.obj").path()),
        Err(MeshError::NotFound(_))
    ));

    let file = temp.child("teapot.ply");
    file.touch().unwrap();
    assert!(matches!(Mesh::load(file.path()), Err(MeshError::Unsupported(ext)) if ext == "ply"));
}

#[test]
fn test_obj_without_faces_is_rejected() {
    let points_only = "v 0 0 0\nv 1 0 0\nv 0 1 0\n";
    match Mesh::parse_obj("points", Cursor::new(points_only)) {
        Err(MeshError::Parse { message, .. }) => assert!(message.contains("no faces")),
        other => panic!("expected parse error, got {:?}", other.map(|m| m.indices.len())),
    }
}

#[test]
fn test_load_obj_from_disk() {
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("quad.obj");
    file.write_str(QUAD_OBJ).unwrap();

    let mesh = Mesh::load(file.path()).unwrap();
    assert_eq!(mesh.name, "quad");
    assert!(!mesh.is_uploaded());
}

#[test_log::test]
fn test_mesh_buffer_lifecycle() {
    let Some((device, _queue)) = create_test_device() else {
        return;
    };
    let mut mesh = Mesh::parse_obj("quad", Cursor::new(QUAD_OBJ)).unwrap();

    mesh.setup_buffer_objects(&device).unwrap();
    assert!(mesh.is_uploaded());
    assert_eq!(mesh.buffers().map(|b| b.index_count()), Some(6));
    assert!(matches!(
        mesh.setup_buffer_objects(&device),
        Err(MeshError::AlreadyUploaded(_))
    ));

    mesh.release_buffer_objects();
    assert!(!mesh.is_uploaded());
    mesh.setup_buffer_objects(&device).unwrap();
}

#[test_log::test]
fn test_buffer_set_rejects_wrong_stride() {
    let Some((device, _queue)) = create_test_device() else {
        return;
    };
    let vertices = [[0.0f32; 3]; 3];
    let result = GpuBufferSet::new(&device, "Wrong", Vertex::layout(), &vertices, &[0u16, 1, 2]);
    assert!(matches!(
        result,
        Err(crate::shader::BindingError::StrideMismatch { expected: 128, actual: 12 })
    ));
}

#[test_log::test]
fn test_empty_geometry_is_not_uploaded() {
    let Some((device, _queue)) = create_test_device() else {
        return;
    };
    let mut mesh = Mesh::new("empty", Vec::new(), Vec::new());
    assert!(matches!(
        mesh.setup_buffer_objects(&device),
        Err(MeshError::Binding(crate::shader::BindingError::EmptyGeometry { vertices: 0, indices: 0, .. }))
    ));
    assert!(!mesh.is_uploaded());

    let vertices = [MeshVertex { position: [0.0; 3], normal: [0.0, 0.0, 1.0] }; 3];
    let no_indices: [u32; 0] = [];
    let result = GpuBufferSet::new(&device, "No Indices", MeshVertex::layout(), &vertices, &no_indices);
    assert!(matches!(
        result,
        Err(crate::shader::BindingError::EmptyGeometry { vertices: 3, indices: 0, .. })
    ));
}
