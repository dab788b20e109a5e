use glam::Vec3;

use crate::error::{AssetError, DataError, ReleaseError};

use super::vertex::Vertex;

/// One sub-mesh as produced by the parse collaborator.
///
/// Vertices are already expanded: every three consecutive entries form one
/// triangle and there is no shared index buffer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSubMesh {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
}

impl RawSubMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

/// Contiguous vertex run contributed by one sub-mesh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubMeshRange {
    pub name: String,
    pub first: u32,
    pub count: u32,
}

/// Flattened vertex array of a whole asset.
///
/// Storage is released when the mesh is dropped or through one explicit
/// [`Mesh::unload`].
#[derive(Debug, Default)]
pub struct Mesh {
    vertices: Vec<Vertex>,
    ranges: Vec<SubMeshRange>,
    released: bool,
}

impl Mesh {
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn submeshes(&self) -> &[SubMeshRange] {
        &self.ranges
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Frees the vertex storage and returns the number of vertices released.
    pub fn unload(&mut self) -> Result<usize, ReleaseError> {
        if self.released {
            return Err(ReleaseError::AlreadyReleased("mesh"));
        }
        let freed = std::mem::take(&mut self.vertices).len();
        self.ranges.clear();
        self.released = true;
        log::debug!("mesh released ({freed} vertices)");
        Ok(freed)
    }
}

/// Concatenates sub-meshes, in order, into a single [`Mesh`].
pub fn ingest(submeshes: &[RawSubMesh]) -> Result<Mesh, AssetError> {
    if submeshes.is_empty() {
        return Err(AssetError::NoMeshes);
    }

    let total: usize = submeshes.iter().map(RawSubMesh::vertex_count).sum();
    let mut vertices = Vec::with_capacity(total);
    let mut ranges = Vec::with_capacity(submeshes.len());

    for (index, sub) in submeshes.iter().enumerate() {
        if sub.normals.len() != sub.positions.len() {
            return Err(DataError::MissingNormals {
                submesh: index,
                positions: sub.positions.len(),
                normals: sub.normals.len(),
            }
            .into());
        }

        ranges.push(SubMeshRange {
            name: sub.name.clone(),
            first: vertices.len() as u32,
            count: sub.vertex_count() as u32,
        });

        vertices.extend(
            sub.positions
                .iter()
                .zip(&sub.normals)
                .map(|(p, n)| Vertex::new(*p, *n)),
        );
    }

    debug_assert_eq!(vertices.len(), total);

    Ok(Mesh {
        vertices,
        ranges,
        released: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(name: &str, n: usize, base: f32) -> RawSubMesh {
        RawSubMesh {
            name: name.to_string(),
            positions: (0..n).map(|i| Vec3::new(base + i as f32, 0.0, 0.0)).collect(),
            normals: (0..n).map(|_| Vec3::Z).collect(),
        }
    }

    #[test]
    fn concatenates_in_submesh_order() {
        let parts = [sub("a", 3, 0.0), sub("b", 5, 100.0)];
        let mesh = ingest(&parts).unwrap();

        assert_eq!(mesh.vertex_count(), 8);
        for (i, v) in mesh.vertices()[0..3].iter().enumerate() {
            assert_eq!(v.position(), parts[0].positions[i]);
        }
        for (i, v) in mesh.vertices()[3..8].iter().enumerate() {
            assert_eq!(v.position(), parts[1].positions[i]);
        }
        assert!(mesh.vertices().iter().all(|v| v.uv == [0.0, 0.0]));
    }

    #[test]
    fn records_submesh_runs() {
        let mesh = ingest(&[sub("a", 3, 0.0), sub("b", 6, 0.0)]).unwrap();
        let runs = mesh.submeshes();
        assert_eq!(runs.len(), 2);
        assert_eq!((runs[0].first, runs[0].count), (0, 3));
        assert_eq!((runs[1].first, runs[1].count), (3, 6));
        assert_eq!(runs[1].name, "b");
    }

    #[test]
    fn missing_normals_is_a_data_error() {
        let mut bad = sub("b", 3, 0.0);
        bad.normals.clear();
        let err = ingest(&[sub("a", 3, 0.0), bad]).unwrap_err();
        match err {
            AssetError::Data(DataError::MissingNormals {
                submesh,
                positions,
                normals,
            }) => {
                assert_eq!((submesh, positions, normals), (1, 3, 0));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn zero_submeshes_is_an_asset_error() {
        assert!(matches!(ingest(&[]), Err(AssetError::NoMeshes)));
    }

    #[test]
    fn unload_twice_fails() {
        let mut mesh = ingest(&[sub("a", 3, 0.0)]).unwrap();
        assert_eq!(mesh.unload(), Ok(3));
        assert!(mesh.is_released());
        assert!(mesh.is_empty());
        assert_eq!(mesh.unload(), Err(ReleaseError::AlreadyReleased("mesh")));
    }
}
