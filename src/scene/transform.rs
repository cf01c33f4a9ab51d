use glam::{Mat4, Vec3};

use super::camera::CameraState;

pub const FOV_Y_DEGREES: f32 = 45.0;
pub const Z_NEAR: f32 = 0.1;
pub const Z_FAR: f32 = 1000.0;

pub const MESH_LIGHT_POSITION: Vec3 = Vec3::new(0.0, 100.0, 100.0);
pub const CUBE_LIGHT_POSITION: Vec3 = Vec3::new(100.0, 0.0, 100.0);

pub const MESH_DISTANCE: f32 = 10.0;
pub const MESH_SPIN_FACTOR: f32 = 0.667;

/// Translation applied before each cube instance, accumulated in order.
pub const INSTANCE_STEPS: [Vec3; 6] = [
    Vec3::ZERO,
    Vec3::new(2.0, 0.0, 0.0),
    Vec3::new(2.0, 0.0, 0.0),
    Vec3::new(0.0, 0.0, -2.0),
    Vec3::new(0.0, 0.0, -2.0),
    Vec3::new(0.0, 0.0, -2.0),
];
pub const INSTANCE_COUNT: usize = INSTANCE_STEPS.len();

pub const SKYBOX_SCALE: f32 = 500.0;

pub fn projection(aspect: f32) -> Mat4 {
    Mat4::perspective_rh(FOV_Y_DEGREES.to_radians(), aspect, Z_NEAR, Z_FAR)
}

/// `Rot(pitch about -X) · Rot(yaw about Y) · T(x, 0, z)`.
pub fn view(camera: &CameraState) -> Mat4 {
    Mat4::from_axis_angle(Vec3::NEG_X, camera.pitch.to_radians())
        * Mat4::from_axis_angle(Vec3::Y, camera.yaw.to_radians())
        * Mat4::from_translation(Vec3::new(camera.x, 0.0, camera.z))
}

pub fn mesh_model(gamma: f32) -> Mat4 {
    let angle = (gamma * MESH_SPIN_FACTOR).to_radians();
    Mat4::from_translation(Vec3::new(0.0, 0.0, -MESH_DISTANCE))
        * Mat4::from_rotation_y(angle)
        * Mat4::from_rotation_x(angle)
        * Mat4::from_rotation_z(angle)
        * Mat4::from_translation(Vec3::new(0.0, -0.5, 0.0))
}

pub fn instance_models() -> [Mat4; INSTANCE_COUNT] {
    let mut model = Mat4::IDENTITY;
    INSTANCE_STEPS.map(|step| {
        model *= Mat4::from_translation(step);
        model
    })
}

/// The skybox cancels the camera translation so it never gets closer.
pub fn skybox_pvm(projection: Mat4, view: Mat4, camera: &CameraState) -> Mat4 {
    let sky_view = view * Mat4::from_translation(Vec3::new(-camera.x, 0.0, -camera.z));
    projection * sky_view * Mat4::from_scale(Vec3::splat(SKYBOX_SCALE))
}

/// Every matrix a frame needs, derived once from the camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTransforms {
    pub projection: Mat4,
    pub view: Mat4,
    pub mesh_model: Mat4,
    pub instance_models: [Mat4; INSTANCE_COUNT],
    pub skybox_pvm: Mat4,
}

impl FrameTransforms {
    pub fn new(camera: &CameraState, aspect: f32) -> Self {
        let projection = projection(aspect);
        let view = view(camera);
        Self {
            projection,
            view,
            mesh_model: mesh_model(camera.gamma),
            instance_models: instance_models(),
            skybox_pvm: skybox_pvm(projection, view, camera),
        }
    }
}
