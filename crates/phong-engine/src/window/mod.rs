//! Presentation surface: the window the frame loop polls and renders into.
//!
//! `WinitSurface` owns the `winit` event loop and window and is pumped once per
//! frame. `HeadlessSurface` stands in for it where no display exists.

mod surface;
mod winit_surface;

pub use surface::{HeadlessSurface, Surface};
pub use winit_surface::{WindowConfig, WinitSurface};
