//! Phong engine crate.
//!
//! Loads a single mesh, uploads it once, and spins it in front of a fixed
//! camera with a validated WGSL program. The wgpu backend presents to a winit
//! window; the headless backend records calls instead.

pub mod app;
pub mod device;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod logging;
pub mod mesh;
pub mod shader;
pub mod state;
pub mod time;
pub mod transform;
pub mod window;
