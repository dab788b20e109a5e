use std::path::PathBuf;

use glam::Vec3;
use phong_engine::error::{AssetError, DataError, ReleaseError};
use phong_engine::mesh::{load_model, obj};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

#[test]
fn obj_models_become_ordered_submeshes() {
    let subs = obj::parse(fixture("two_parts.obj")).unwrap();

    assert_eq!(subs.len(), 2);
    assert_eq!(subs[0].name, "tri");
    assert_eq!(subs[0].vertex_count(), 3);
    assert_eq!(subs[1].name, "quad");
    assert_eq!(subs[1].vertex_count(), 6);
    assert!(subs[1].normals.iter().all(|n| *n == Vec3::NEG_Z));
}

#[test]
fn load_model_flattens_in_file_order() {
    let object = load_model(fixture("two_parts.obj"), Vec3::new(0.0, -30.0, 0.0)).unwrap();
    let mesh = &object.mesh;

    assert_eq!(mesh.vertex_count(), 9);
    let runs: Vec<_> = mesh.submeshes().iter().map(|r| (r.first, r.count)).collect();
    assert_eq!(runs, vec![(0, 3), (3, 6)]);

    // Triangle first, then the quad at z = -1.
    assert!(mesh.vertices()[..3].iter().all(|v| v.position().z == 0.0));
    assert!(mesh.vertices()[3..].iter().all(|v| v.position().z == -1.0));
    assert_eq!(object.position, Vec3::new(0.0, -30.0, 0.0));
}

#[test]
fn unload_twice_is_rejected() {
    let mut object = load_model(fixture("two_parts.obj"), Vec3::ZERO).unwrap();

    assert_eq!(object.unload(), Ok(9));
    assert!(object.mesh.is_released());
    assert_eq!(object.unload(), Err(ReleaseError::AlreadyReleased("mesh")));
}

#[test]
fn missing_file_is_an_open_error() {
    let err = load_model(fixture("does_not_exist.obj"), Vec3::ZERO).unwrap_err();
    assert!(matches!(err, AssetError::Open { .. }), "{err:?}");
}

#[test]
fn normals_are_required() {
    let err = load_model(fixture("no_normals.obj"), Vec3::ZERO).unwrap_err();
    assert!(
        matches!(
            err,
            AssetError::Data(DataError::MissingNormals {
                submesh: 0,
                positions: 3,
                normals: 0
            })
        ),
        "{err:?}"
    );
}

#[test]
fn bundled_prism_loads() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../phong-viewer/assets/obj/prism/prism.obj");
    let object = load_model(path, Vec3::ZERO).unwrap();

    assert_eq!(object.mesh.vertex_count(), 24);
    assert_eq!(object.mesh.submeshes().len(), 2);
    for v in object.mesh.vertices() {
        assert!((v.normal().length() - 1.0).abs() < 1e-4);
    }
}
