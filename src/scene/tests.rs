use super::*;
use super::transform::*;
use approx::assert_relative_eq;
use glam::{Mat4, Vec3, Vec4};
use winit::keyboard::KeyCode;

#[derive(Default)]
struct ScriptedInput {
    keys: Vec<Key>,
    sticks: [StickPosition; 2],
}

impl InputSource for ScriptedInput {
    fn is_key_down(&self, key: Key) -> bool {
        self.keys.contains(&key)
    }

    fn stick(&self, index: usize) -> StickPosition {
        self.sticks.get(index).copied().unwrap_or_default()
    }
}

#[test]
fn test_idle_frame_only_spins() {
    let mut camera = CameraState { yaw: 30.0, pitch: -10.0, x: 1.5, z: -4.0, ..CameraState::new() };
    let before = camera;
    camera.update(0.0, &ScriptedInput::default());
    assert_eq!(camera, before);

    camera.update(0.25, &ScriptedInput::default());
    assert_eq!(camera.yaw, before.yaw);
    assert_eq!(camera.pitch, before.pitch);
    assert_eq!(camera.x, before.x);
    assert_eq!(camera.z, before.z);
    assert_relative_eq!(camera.gamma, 45.0 * 0.25);
}

#[test]
fn test_key_up_half_second() {
    let mut camera = CameraState::new();
    let input = ScriptedInput { keys: vec![Key::Up], ..Default::default() };
    camera.update(0.5, &input);

    assert_eq!(camera.alpha, 90.0);
    assert_eq!(camera.beta, 0.0);
    assert_eq!((camera.yaw, camera.pitch, camera.x, camera.z), (0.0, 0.0, 0.0, 0.0));
}

#[test]
fn test_arrow_keys_adjust_beta() {
    let mut camera = CameraState::new();
    let input = ScriptedInput { keys: vec![Key::Left], ..Default::default() };
    camera.update(0.5, &input);
    assert_eq!(camera.beta, -90.0);

    let input = ScriptedInput { keys: vec![Key::Right, Key::Down], ..Default::default() };
    camera.update(1.0, &input);
    assert_eq!(camera.beta, 90.0);
    assert_eq!(camera.alpha, -180.0);
}

#[test]
fn test_look_stick_turns_camera() {
    let mut camera = CameraState::new();
    let input = ScriptedInput {
        sticks: [StickPosition::CENTER, StickPosition { x: 1.0, y: -0.5 }],
        ..Default::default()
    };
    camera.update(0.5, &input);
    assert_relative_eq!(camera.yaw, 45.0);
    assert_relative_eq!(camera.pitch, -22.5);
}

#[test]
fn test_movement_follows_heading() {
    // Facing straight ahead, pushing forward only changes z.
    let mut camera = CameraState::new();
    let forward = ScriptedInput {
        sticks: [StickPosition { x: 0.0, y: 1.0 }, StickPosition::CENTER],
        ..Default::default()
    };
    camera.update(0.1, &forward);
    assert_relative_eq!(camera.x, 0.0);
    assert_relative_eq!(camera.z, 3.0, epsilon = 1e-5);

    // After a quarter turn the same input moves along x instead.
    let mut turned = CameraState { yaw: 90.0, ..CameraState::new() };
    turned.update(0.1, &forward);
    assert_relative_eq!(turned.x, -3.0, epsilon = 1e-5);
    assert_relative_eq!(turned.z, 0.0, epsilon = 1e-5);
}

#[test]
fn test_wrap_angles() {
    let mut camera = CameraState { yaw: 370.0, pitch: -30.0, gamma: 800.0, ..CameraState::new() };
    camera.wrap_angles();
    assert_relative_eq!(camera.yaw, 10.0, epsilon = 1e-4);
    assert_relative_eq!(camera.pitch, 330.0, epsilon = 1e-4);
    assert_eq!(camera.gamma, 800.0);
}

#[test]
fn test_keyboard_sticks() {
    let mut input = KeyboardInput::new();
    assert_eq!(input.stick(0), StickPosition::CENTER);

    input.process_key(KeyCode::KeyW, true);
    input.process_key(KeyCode::KeyD, true);
    input.process_key(KeyCode::KeyJ, true);
    assert_eq!(input.stick(0), StickPosition { x: 1.0, y: 1.0 });
    assert_eq!(input.stick(1), StickPosition { x: -1.0, y: 0.0 });

    input.process_key(KeyCode::KeyA, true);
    assert_eq!(input.stick(0).x, 0.0);

    input.process_key(KeyCode::KeyW, false);
    assert_eq!(input.stick(0).y, 0.0);
    assert_eq!(input.stick(7), StickPosition::CENTER);
}

#[test]
fn test_keyboard_arrow_keys() {
    let mut input = KeyboardInput::new();
    input.process_key(KeyCode::ArrowUp, true);
    assert!(input.is_key_down(Key::Up));
    assert!(!input.is_key_down(Key::Down));

    input.release_all();
    assert!(!input.is_key_down(Key::Up));
}

#[test]
fn test_toggles_default() {
    let mut toggles = Toggles::default();
    assert!(toggles.normal_mapping);
    assert!(!toggles.capture_armed);

    toggles.capture_armed = true;
    assert!(toggles.take_capture());
    assert!(!toggles.take_capture());
}

#[test]
fn test_capture_survives_skipped_frame() {
    let mut toggles = Toggles::default();
    toggles.on_key_press(KeyCode::KeyG);

    assert!(!toggles.settle_capture(false));
    assert!(toggles.capture_armed);
    assert!(toggles.settle_capture(true));
    assert!(!toggles.capture_armed);
    assert!(!toggles.settle_capture(true));
}

#[test]
fn test_toggle_keys() {
    let mut toggles = Toggles::default();

    assert_eq!(toggles.on_key_press(KeyCode::KeyN), Some(ToggleChange::NormalMapping(false)));
    assert_eq!(toggles.on_key_press(KeyCode::KeyN), Some(ToggleChange::NormalMapping(true)));
    assert_eq!(toggles.on_key_press(KeyCode::KeyF), Some(ToggleChange::Fullscreen(true)));
    assert_eq!(toggles.on_key_press(KeyCode::KeyV), Some(ToggleChange::VideoCapture(true)));
    assert!(toggles.video_capture);

    assert_eq!(toggles.on_key_press(KeyCode::KeyG), Some(ToggleChange::CaptureArmed));
    assert!(toggles.take_capture());

    assert_eq!(toggles.on_key_press(KeyCode::KeyW), None);
    assert!(!toggles.quit_requested);
    assert_eq!(toggles.on_key_press(KeyCode::Escape), Some(ToggleChange::Quit));
    assert!(toggles.quit_requested);
}

#[test]
fn test_instance_models_accumulate() {
    let origins: Vec<Vec3> = instance_models()
        .iter()
        .map(|m| m.transform_point3(Vec3::ZERO))
        .collect();
    assert_eq!(
        origins,
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(4.0, 0.0, 0.0),
            Vec3::new(4.0, 0.0, -2.0),
            Vec3::new(4.0, 0.0, -4.0),
            Vec3::new(4.0, 0.0, -6.0),
        ]
    );
}

#[test]
fn test_mesh_model_without_spin() {
    let model = mesh_model(0.0);
    let origin = model.transform_point3(Vec3::ZERO);
    assert_relative_eq!(origin.x, 0.0);
    assert_relative_eq!(origin.y, -0.5);
    assert_relative_eq!(origin.z, -10.0);
}

#[test]
fn test_view_translates_then_rotates() {
    let camera = CameraState { x: 3.0, z: -2.0, ..CameraState::new() };
    let view = view(&camera);
    assert_eq!(view, Mat4::from_translation(Vec3::new(3.0, 0.0, -2.0)));

    // Positive yaw swings what was ahead of the camera to its left.
    let turned = view_for_yaw(90.0).transform_point3(Vec3::new(0.0, 0.0, -1.0));
    assert_relative_eq!(turned.x, -1.0, epsilon = 1e-6);
    assert_relative_eq!(turned.z, 0.0, epsilon = 1e-6);
}

fn view_for_yaw(yaw: f32) -> Mat4 {
    view(&CameraState { yaw, ..CameraState::new() })
}

#[test]
fn test_skybox_ignores_camera_position() {
    let still = CameraState { yaw: 20.0, ..CameraState::new() };
    let moved = CameraState { x: 40.0, z: -75.0, ..still };
    let a = FrameTransforms::new(&still, 16.0 / 9.0);
    let b = FrameTransforms::new(&moved, 16.0 / 9.0);

    let corner = Vec4::new(1.0, 1.0, 1.0, 1.0);
    let (pa, pb) = (a.skybox_pvm * corner, b.skybox_pvm * corner);
    for i in 0..4 {
        assert_relative_eq!(pa[i], pb[i], epsilon = 1e-2);
    }
    assert_ne!(a.view, b.view);
}

#[test]
fn test_skybox_stays_inside_far_plane() {
    let transforms = FrameTransforms::new(&CameraState::new(), 1280.0 / 720.0);
    let ahead = transforms.skybox_pvm * Vec4::new(0.0, 0.0, -1.0, 1.0);
    let depth = ahead.z / ahead.w;
    assert!(depth > 0.0 && depth <= 1.0, "depth {}", depth);
}
