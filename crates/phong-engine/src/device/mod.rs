//! Rasterization device abstraction and its backends.
//!
//! - `RasterDevice`: the immediate-mode call surface the frame loop drives
//! - `WgpuDevice`: wgpu backend presenting to a winit window
//! - `HeadlessDevice`: recording backend with no GPU behind it

mod context;
mod headless;
mod init;
mod raster;
mod surface;
mod wgpu_device;

pub use context::{Gpu, GpuFrame};
pub use headless::{Command, HeadlessDevice};
pub use init::GpuInit;
pub use raster::{BufferId, ProgramId, RasterDevice};
pub use surface::SurfaceErrorAction;
pub use wgpu_device::WgpuDevice;
