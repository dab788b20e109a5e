//! Wavefront OBJ parse collaborator backed by `tobj`.

use std::path::Path;

use glam::Vec3;

use crate::error::{AssetError, DataError};

use super::ingest::RawSubMesh;

/// Parses `path` into triangulated, de-indexed sub-meshes (one per OBJ model).
///
/// Models without normals yield a sub-mesh with an empty normal list, which
/// [`super::ingest`] rejects.
pub fn parse(path: impl AsRef<Path>) -> Result<Vec<RawSubMesh>, AssetError> {
    let path = path.as_ref();
    let options = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    };

    let (models, _materials) =
        tobj::load_obj(path, &options).map_err(|source| AssetError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    if models.is_empty() {
        return Err(AssetError::NoMeshes);
    }

    models
        .iter()
        .enumerate()
        .map(|(index, model)| expand(index, &model.name, &model.mesh))
        .collect()
}

fn expand(index: usize, name: &str, mesh: &tobj::Mesh) -> Result<RawSubMesh, AssetError> {
    let points: Vec<Vec3> = mesh.positions.chunks_exact(3).map(Vec3::from_slice).collect();
    let normals: Vec<Vec3> = if mesh.normals.len() == mesh.positions.len() {
        mesh.normals.chunks_exact(3).map(Vec3::from_slice).collect()
    } else {
        Vec::new()
    };

    let lookup = |table: &[Vec3], i: u32| {
        table
            .get(i as usize)
            .copied()
            .ok_or(DataError::IndexOutOfRange {
                submesh: index,
                index: i,
                len: table.len(),
            })
    };

    let mut out = RawSubMesh {
        name: name.to_string(),
        positions: Vec::with_capacity(mesh.indices.len()),
        normals: Vec::with_capacity(if normals.is_empty() { 0 } else { mesh.indices.len() }),
    };

    for &i in &mesh.indices {
        out.positions.push(lookup(&points, i)?);
        if !normals.is_empty() {
            out.normals.push(lookup(&normals, i)?);
        }
    }

    log::debug!(
        "obj model '{}': {} vertices ({} indexed points)",
        out.name,
        out.positions.len(),
        points.len()
    );

    Ok(out)
}
