//! Viewer assembly: load the asset, build the program, run the loop, clean up.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glam::Vec3;

use crate::device::{GpuInit, RasterDevice, WgpuDevice};
use crate::frame::{FrameLoop, LoopReport};
use crate::geometry::GeometryBuffer;
use crate::logging::{init_logging, LoggingConfig};
use crate::mesh::{load_model, SceneObject};
use crate::shader::ShaderProgram;
use crate::state::{ClearColor, RenderState, Viewport};
use crate::transform::{Camera, CameraConfig, RotationRate, SceneTransform};
use crate::window::{Surface, WindowConfig, WinitSurface};

/// Everything the viewer needs to start. Relative paths are resolved by
/// [`ViewerConfig::with_base_dir`].
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub window: WindowConfig,
    pub gpu: GpuInit,
    pub asset: PathBuf,
    pub object_position: Vec3,
    pub camera: CameraConfig,
    /// Viewport is replaced by the surface extent at startup.
    pub render_state: RenderState,
    pub rotation: RotationRate,
    pub clear_color: ClearColor,
    pub vertex_shader: PathBuf,
    pub fragment_shader: PathBuf,
    pub logging: LoggingConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            gpu: GpuInit::default(),
            asset: PathBuf::from("assets/obj/prism/prism.obj"),
            object_position: Vec3::new(0.0, -30.0, 0.0),
            camera: CameraConfig::default(),
            render_state: RenderState::default(),
            rotation: RotationRate::default(),
            clear_color: ClearColor::GRAY,
            vertex_shader: PathBuf::from("shaders/phong.vert.wgsl"),
            fragment_shader: PathBuf::from("shaders/phong.frag.wgsl"),
            logging: LoggingConfig::default(),
        }
    }
}

impl ViewerConfig {
    /// Anchors relative asset and shader paths at `dir`.
    pub fn with_base_dir(mut self, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        for path in [&mut self.asset, &mut self.vertex_shader, &mut self.fragment_shader] {
            if path.is_relative() {
                *path = dir.join(&*path);
            }
        }
        self
    }
}

/// Device-side scene: one object, its program, and the fixed camera.
pub struct Viewer {
    object: SceneObject,
    geometry: GeometryBuffer,
    program: ShaderProgram,
    transform: SceneTransform,
    camera: Camera,
}

impl Viewer {
    /// Loads the asset and shaders onto `device` and sets the camera matrices.
    pub fn prepare<D: RasterDevice + ?Sized>(
        device: &mut D,
        config: &ViewerConfig,
        extent: (u32, u32),
    ) -> Result<Self> {
        let state = RenderState {
            viewport: Viewport::full(extent.0, extent.1),
            ..config.render_state
        };
        state.apply(device);

        let object = load_model(&config.asset, config.object_position)
            .with_context(|| format!("failed to load model '{}'", config.asset.display()))?;

        let geometry = GeometryBuffer::upload(device, &object.mesh)
            .context("failed to upload vertex data")?;

        let program = ShaderProgram::load(device, &config.vertex_shader, &config.fragment_shader)
            .context("failed to build shader program")?;

        let slots = program
            .matrix_slots()
            .context("shader program is missing a transform uniform")?;

        let camera = Camera::new(&config.camera, state.viewport.aspect());
        program.set_mat4(device, slots.view, camera.view())?;
        program.set_mat4(device, slots.projection, camera.projection())?;

        log::info!(
            "scene ready: {} vertices at {:?}",
            geometry.vertex_count(),
            object.position
        );

        Ok(Self {
            transform: SceneTransform::new(object.position, config.rotation),
            object,
            geometry,
            program,
            camera,
        })
    }

    pub fn geometry(&self) -> &GeometryBuffer {
        &self.geometry
    }

    pub fn program(&self) -> &ShaderProgram {
        &self.program
    }

    pub fn transform(&self) -> &SceneTransform {
        &self.transform
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn run<S, D>(&mut self, surface: &mut S, device: &mut D, clear: ClearColor) -> Result<LoopReport>
    where
        S: Surface + ?Sized,
        D: RasterDevice + ?Sized,
    {
        let report = FrameLoop::new(clear)
            .run(surface, device, &self.program, &self.geometry, &mut self.transform)
            .context("render loop failed")?;
        self.object.model_matrix = self.transform.model_matrix();
        Ok(report)
    }

    /// Frees the device buffer and the CPU mesh.
    pub fn shutdown<D: RasterDevice + ?Sized>(mut self, device: &mut D) -> Result<()> {
        self.geometry
            .release(device)
            .context("failed to release vertex buffer")?;
        let freed = self.object.unload().context("failed to unload mesh")?;
        log::debug!("released {freed} vertices");
        Ok(())
    }
}

/// Runs the viewer on an already created surface and device.
pub fn run_with<S, D>(config: &ViewerConfig, surface: &mut S, device: &mut D) -> Result<LoopReport>
where
    S: Surface + ?Sized,
    D: RasterDevice + ?Sized,
{
    let mut viewer = Viewer::prepare(device, config, surface.size())?;
    let report = viewer.run(surface, device, config.clear_color)?;
    viewer.shutdown(device)?;
    Ok(report)
}

/// Opens the window, initializes the GPU and renders until the window closes.
pub fn run(config: ViewerConfig) -> Result<LoopReport> {
    init_logging(config.logging.clone());

    let mut surface = WinitSurface::open(config.window.clone()).context("failed to open window")?;
    let window = surface
        .window()
        .context("window disappeared after creation")?;
    let mut device =
        WgpuDevice::new(window, config.gpu.clone()).context("failed to initialize GPU device")?;

    run_with(&config, &mut surface, &mut device)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_scene() {
        let cfg = ViewerConfig::default();
        assert_eq!(cfg.object_position, Vec3::new(0.0, -30.0, 0.0));
        assert_eq!(cfg.clear_color, ClearColor::GRAY);
        assert_eq!(cfg.rotation, RotationRate::PerFrame(0.7));
        assert_eq!(cfg.window.title, "Phong Illumination");
        assert!(!cfg.window.resizable);
    }

    #[test]
    fn base_dir_only_rewrites_relative_paths() {
        let mut cfg = ViewerConfig::default();
        let absolute = std::env::temp_dir().join("frag.wgsl");
        cfg.fragment_shader = absolute.clone();

        let cfg = cfg.with_base_dir("/opt/viewer");

        assert_eq!(cfg.asset, Path::new("/opt/viewer/assets/obj/prism/prism.obj"));
        assert_eq!(cfg.vertex_shader, Path::new("/opt/viewer/shaders/phong.vert.wgsl"));
        assert_eq!(cfg.fragment_shader, absolute);
    }
}
