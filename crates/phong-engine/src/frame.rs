//! The per-frame render loop.

use crate::device::RasterDevice;
use crate::error::{DeviceError, FrameError, ShaderError};
use crate::geometry::GeometryBuffer;
use crate::shader::ShaderProgram;
use crate::state::ClearColor;
use crate::time::FrameClock;
use crate::transform::SceneTransform;
use crate::window::Surface;

/// Summary of a finished loop.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct LoopReport {
    /// Frames rendered and presented.
    pub frames: u64,
}

/// Drives clear, update, draw and present until the surface asks to close.
#[derive(Debug, Clone)]
pub struct FrameLoop {
    clear: ClearColor,
    clock: FrameClock,
}

impl FrameLoop {
    pub fn new(clear: ClearColor) -> Self {
        Self {
            clear,
            clock: FrameClock::new(),
        }
    }

    pub fn clear_color(&self) -> ClearColor {
        self.clear
    }

    /// Runs until `surface.close_requested()`.
    ///
    /// `view` and `projection` must already be set on `program`; only `model`
    /// is written each frame. The first device failure ends the loop.
    pub fn run<S, D>(
        &mut self,
        surface: &mut S,
        device: &mut D,
        program: &ShaderProgram,
        geometry: &GeometryBuffer,
        transform: &mut SceneTransform,
    ) -> Result<LoopReport, FrameError>
    where
        S: Surface + ?Sized,
        D: RasterDevice + ?Sized,
    {
        let model = program
            .uniform_location("model")
            .map_err(|source| FrameError::Shader { frame: 0, source })?;

        self.clock.reset();
        let mut frames = 0u64;

        while !surface.close_requested() {
            surface.poll_events();

            let time = self.clock.tick();
            let device_err = |source: DeviceError| FrameError::Device { frame: frames, source };
            let shader_err = |source: ShaderError| match source {
                ShaderError::Device(source) => FrameError::Device { frame: frames, source },
                source => FrameError::Shader { frame: frames, source },
            };

            device.clear(self.clear);
            program.bind(device).map_err(shader_err)?;

            let matrix = transform.advance(time.dt);
            program.set_mat4(device, model, &matrix).map_err(shader_err)?;

            geometry.bind(device).map_err(device_err)?;
            geometry.draw(device).map_err(device_err)?;
            device.present().map_err(device_err)?;

            log::trace!(
                "frame {} dt={:.4}s angle={:.2}",
                frames,
                time.dt,
                transform.angle_deg()
            );
            frames += 1;
        }

        log::info!("frame loop finished after {frames} frames");
        Ok(LoopReport { frames })
    }
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new(ClearColor::GRAY)
    }
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Vec3};

    use super::*;
    use crate::device::{Command, HeadlessDevice};
    use crate::mesh::{ingest, RawSubMesh};
    use crate::transform::RotationRate;
    use crate::window::HeadlessSurface;

    const VS: &str = r#"
@group(0) @binding(0) var<uniform> model: mat4x4<f32>;
@group(0) @binding(1) var<uniform> view: mat4x4<f32>;
@group(0) @binding(2) var<uniform> projection: mat4x4<f32>;

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return projection * view * model * vec4<f32>(position, 1.0);
}
"#;

    const FS: &str = r#"
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0);
}
"#;

    struct Scene {
        device: HeadlessDevice,
        program: ShaderProgram,
        geometry: GeometryBuffer,
        transform: SceneTransform,
    }

    fn scene(device: HeadlessDevice) -> Scene {
        let mut device = device;
        let mesh = ingest(&[RawSubMesh {
            name: "tri".into(),
            positions: vec![Vec3::X, Vec3::Y, Vec3::Z],
            normals: vec![Vec3::Y; 3],
        }])
        .unwrap();
        let geometry = GeometryBuffer::upload(&mut device, &mesh).unwrap();
        let program = ShaderProgram::compile_and_link(&mut device, VS, FS).unwrap();
        Scene {
            device,
            program,
            geometry,
            transform: SceneTransform::new(Vec3::new(0.0, -30.0, 0.0), RotationRate::PerFrame(0.7)),
        }
    }

    fn run(s: &mut Scene, surface: &mut HeadlessSurface) -> Result<LoopReport, FrameError> {
        FrameLoop::default().run(surface, &mut s.device, &s.program, &s.geometry, &mut s.transform)
    }

    #[test]
    fn closed_surface_renders_nothing() {
        let mut s = scene(HeadlessDevice::new(64, 64));
        let mut surface = HeadlessSurface::new(64, 64).close_after(0);

        let report = run(&mut s, &mut surface).unwrap();

        assert_eq!(report.frames, 0);
        assert!(s.device.draw_calls().is_empty());
        assert_eq!(s.device.frames_presented(), 0);
        assert_eq!(surface.polls(), 0);
    }

    #[test]
    fn one_draw_per_frame() {
        let mut s = scene(HeadlessDevice::new(64, 64));
        let mut surface = HeadlessSurface::new(64, 64).close_after(5);

        let report = run(&mut s, &mut surface).unwrap();

        assert_eq!(report.frames, 5);
        assert_eq!(s.device.frames_presented(), 5);
        let draws = s.device.draw_calls();
        assert_eq!(draws.len(), 5);
        assert!(draws.iter().all(|(id, range)| *id == s.geometry.id() && *range == (0..3)));
    }

    #[test]
    fn frame_commands_follow_clear_bind_draw_present() {
        let mut s = scene(HeadlessDevice::new(64, 64));
        let before = s.device.commands().len();
        let mut surface = HeadlessSurface::new(64, 64).close_after(1);

        run(&mut s, &mut surface).unwrap();

        let frame = &s.device.commands()[before..];
        assert!(matches!(frame[0], Command::Clear(c) if c == ClearColor::GRAY));
        assert!(matches!(frame[1], Command::UseProgram(_)));
        assert!(matches!(frame[2], Command::WriteUniform { .. }));
        assert!(matches!(frame[3], Command::BindBuffer(_)));
        assert!(matches!(frame[4], Command::Draw { .. }));
        assert!(matches!(frame[5], Command::Present));
        assert_eq!(frame.len(), 6);
    }

    #[test]
    fn model_uniform_tracks_the_transform() {
        let mut s = scene(HeadlessDevice::new(64, 64));
        let slot = s.program.uniform_location("model").unwrap();
        let mut surface = HeadlessSurface::new(64, 64).close_after(3);

        run(&mut s, &mut surface).unwrap();

        let bytes = s.device.uniform_bytes(s.program.id(), slot).unwrap();
        let cols: &[f32] = bytemuck::cast_slice(bytes);
        let uploaded = Mat4::from_cols_slice(cols);
        assert_eq!(uploaded, s.transform.model_matrix());
        assert!((s.transform.angle_deg() - 2.1).abs() < 1e-4);
    }

    #[test]
    fn present_failure_ends_the_loop() {
        let mut s = scene(HeadlessDevice::new(64, 64).fail_present_at(2));
        let mut surface = HeadlessSurface::new(64, 64);

        let err = run(&mut s, &mut surface).unwrap_err();

        assert!(matches!(err, FrameError::Device { frame: 2, source: DeviceError::Surface(_) }));
        assert_eq!(s.device.frames_presented(), 2);
    }

    #[test]
    fn released_geometry_is_a_device_error() {
        let mut s = scene(HeadlessDevice::new(64, 64));
        s.geometry.release(&mut s.device).unwrap();
        let mut surface = HeadlessSurface::new(64, 64).close_after(1);

        let err = run(&mut s, &mut surface).unwrap_err();
        assert!(matches!(err, FrameError::Device { frame: 0, source: DeviceError::Release(_) }));
    }
}
