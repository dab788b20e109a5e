use std::path::PathBuf;

use glam::Mat4;
use phong_engine::app::{run_with, Viewer, ViewerConfig};
use phong_engine::device::{Command, HeadlessDevice};
use phong_engine::error::ShaderError;
use phong_engine::state::{ClearColor, CullMode, Winding};
use phong_engine::transform::RotationRate;
use phong_engine::window::HeadlessSurface;

fn config() -> ViewerConfig {
    let viewer_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../phong-viewer");
    ViewerConfig::default().with_base_dir(viewer_dir)
}

#[test]
fn bundled_shaders_expose_all_matrices() {
    let cfg = config();
    let mut device = HeadlessDevice::new(1920, 1080);

    let viewer = Viewer::prepare(&mut device, &cfg, (1920, 1080)).unwrap();
    let slots = viewer.program().matrix_slots().unwrap();

    let id = viewer.program().id();
    let view: &[f32] = bytemuck::cast_slice(device.uniform_bytes(id, slots.view).unwrap());
    let proj: &[f32] = bytemuck::cast_slice(device.uniform_bytes(id, slots.projection).unwrap());
    assert_eq!(Mat4::from_cols_slice(view), *viewer.camera().view());
    assert_eq!(Mat4::from_cols_slice(proj), *viewer.camera().projection());
}

#[test]
fn full_run_renders_until_close_and_cleans_up() {
    let cfg = config();
    let mut device = HeadlessDevice::new(1920, 1080);
    let mut surface = HeadlessSurface::new(1920, 1080).close_after(10);

    let report = run_with(&cfg, &mut surface, &mut device).unwrap();

    assert_eq!(report.frames, 10);
    assert_eq!(device.frames_presented(), 10);
    assert_eq!(device.draw_calls().len(), 10);
    assert!(device.draw_calls().iter().all(|(_, r)| *r == (0..24)));
    assert_eq!(device.live_buffers(), 0);
}

#[test]
fn state_is_applied_once_with_surface_viewport() {
    let mut cfg = config();
    cfg.render_state = cfg.render_state.with_cull(CullMode::Back, Winding::Ccw);
    let mut device = HeadlessDevice::new(800, 600);
    let mut surface = HeadlessSurface::new(800, 600).close_after(3);

    run_with(&cfg, &mut surface, &mut device).unwrap();

    let state = device.render_state().unwrap();
    assert_eq!(state.front_face, Winding::Ccw);
    assert_eq!((state.viewport.width, state.viewport.height), (800, 600));
    let applies = device
        .commands()
        .iter()
        .filter(|c| matches!(c, Command::ApplyState(_)))
        .count();
    assert_eq!(applies, 1);
}

#[test]
fn clear_color_is_configurable() {
    let mut cfg = config();
    cfg.clear_color = ClearColor::new(0.0, 0.0, 0.0, 1.0);
    cfg.rotation = RotationRate::PerSecond(45.0);
    let mut device = HeadlessDevice::new(64, 64);
    let mut surface = HeadlessSurface::new(64, 64).close_after(2);

    run_with(&cfg, &mut surface, &mut device).unwrap();

    let clears: Vec<_> = device
        .commands()
        .iter()
        .filter_map(|c| match c {
            Command::Clear(color) => Some(*color),
            _ => None,
        })
        .collect();
    assert_eq!(clears, vec![cfg.clear_color; 2]);
}

#[test]
fn closed_window_skips_rendering() {
    let cfg = config();
    let mut device = HeadlessDevice::new(64, 64);
    let mut surface = HeadlessSurface::new(64, 64).close_after(0);

    let report = run_with(&cfg, &mut surface, &mut device).unwrap();

    assert_eq!(report.frames, 0);
    assert!(device.draw_calls().is_empty());
}

#[test]
fn missing_model_uniform_aborts_startup() {
    let mut cfg = config();
    cfg.vertex_shader =
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/missing_model.vert.wgsl");
    cfg.fragment_shader = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../phong-viewer/shaders/phong.frag.wgsl");
    let mut device = HeadlessDevice::new(64, 64);
    let mut surface = HeadlessSurface::new(64, 64).close_after(5);

    let err = run_with(&cfg, &mut surface, &mut device).unwrap_err();

    let shader_err = err
        .chain()
        .find_map(|e| e.downcast_ref::<ShaderError>())
        .expect("shader error in chain");
    assert!(matches!(shader_err, ShaderError::UniformNotFound(name) if name == "model"));
    assert!(device.draw_calls().is_empty());
}

#[test]
fn missing_shader_file_is_an_io_error() {
    let mut cfg = config();
    cfg.vertex_shader = PathBuf::from("/nonexistent/phong.vert.wgsl");
    let mut device = HeadlessDevice::new(64, 64);

    let err = Viewer::prepare(&mut device, &cfg, (64, 64)).err().unwrap();
    assert!(err
        .chain()
        .any(|e| matches!(e.downcast_ref::<ShaderError>(), Some(ShaderError::Io { .. }))));
}
