//! Scene transforms: the animated model matrix and the fixed camera.

mod animate;
mod camera;

pub use animate::{RotationRate, SceneTransform};
pub use camera::{Camera, CameraConfig};
