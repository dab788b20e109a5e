//! Mesh ingestion.
//!
//! The parse collaborator (`obj`) turns an asset file into de-indexed
//! sub-meshes; `ingest` flattens those into one contiguous vertex array.

mod ingest;
mod model;
pub mod obj;
mod vertex;

pub use ingest::{ingest, Mesh, RawSubMesh, SubMeshRange};
pub use model::{load_model, SceneObject};
pub use vertex::{AttributeFormat, Vertex, VertexAttribute, VertexLayout};
