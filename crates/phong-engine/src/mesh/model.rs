use std::path::Path;

use glam::{Mat4, Vec3};

use crate::error::{AssetError, ReleaseError};

use super::ingest::{ingest, Mesh};
use super::obj;

/// The single renderable instance: an owned mesh placed in the world.
#[derive(Debug)]
pub struct SceneObject {
    pub mesh: Mesh,
    pub position: Vec3,
    pub model_matrix: Mat4,
}

impl SceneObject {
    pub fn new(mesh: Mesh, position: Vec3) -> Self {
        Self {
            mesh,
            position,
            model_matrix: Mat4::from_translation(position),
        }
    }

    /// Inverse of [`load_model`]. Fails on the second call.
    pub fn unload(&mut self) -> Result<usize, ReleaseError> {
        self.mesh.unload()
    }
}

/// Parses and ingests the model at `path`, placing it at `position`.
pub fn load_model(path: impl AsRef<Path>, position: Vec3) -> Result<SceneObject, AssetError> {
    let path = path.as_ref();
    let submeshes = obj::parse(path)?;
    let mesh = ingest(&submeshes)?;

    log::info!(
        "loaded '{}': {} sub-meshes, {} vertices",
        path.display(),
        mesh.submeshes().len(),
        mesh.vertex_count()
    );

    Ok(SceneObject::new(mesh, position))
}
