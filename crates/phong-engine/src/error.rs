//! Error taxonomy shared by the engine components.
//!
//! Library-level operations return these typed errors. The application layer
//! (`app::run`) folds them into `anyhow::Error` with context.

use std::path::PathBuf;

/// Malformed sub-mesh data handed over by the parse collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataError {
    #[error("sub-mesh {submesh} has {positions} positions but {normals} normals")]
    MissingNormals {
        submesh: usize,
        positions: usize,
        normals: usize,
    },

    #[error("sub-mesh {submesh} references vertex {index} of {len}")]
    IndexOutOfRange {
        submesh: usize,
        index: u32,
        len: usize,
    },
}

/// Failures while loading or ingesting a model asset.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to open model '{}'", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("model contains no meshes")]
    NoMeshes,

    #[error(transparent)]
    Data(#[from] DataError),
}

/// Shader loading, compilation, linkage and uniform lookup failures.
#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    #[error("failed to read shader source '{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{stage} stage failed to compile:\n{log}")]
    Compile { stage: &'static str, log: String },

    #[error("program failed to link: {0}")]
    Link(String),

    #[error("uniform '{0}' is not declared by the program")]
    UniformNotFound(String),

    #[error("uniform '{name}' is not a mat4x4<f32>")]
    UniformType { name: String },

    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// Double release of an owned resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ReleaseError {
    #[error("{0} was already released")]
    AlreadyReleased(&'static str),
}

/// Device-level failures reported by a [`crate::device::RasterDevice`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    #[error("unknown vertex buffer #{0}")]
    UnknownBuffer(u32),

    #[error("unknown program #{0}")]
    UnknownProgram(u32),

    #[error("program #{program} has no uniform slot #{slot}")]
    UnknownSlot { program: u32, slot: u32 },

    #[error("refusing to upload an empty vertex array")]
    EmptyUpload,

    #[error("draw issued with no program bound")]
    NoProgramBound,

    #[error("draw issued with no vertex buffer bound")]
    NoBufferBound,

    #[error("draw range {first}..{end} exceeds the {len} vertices of buffer #{buffer}")]
    DrawOutOfRange {
        buffer: u32,
        first: u32,
        end: u32,
        len: u32,
    },

    #[error("surface failure: {0}")]
    Surface(String),

    #[error(transparent)]
    Release(#[from] ReleaseError),
}

/// Window or device context creation failures.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("failed to create the event loop")]
    EventLoop(#[source] winit::error::EventLoopError),

    #[error("failed to create the window")]
    Window(#[source] winit::error::OsError),

    #[error("window was not created after {0} event pumps")]
    WindowNotReady(u32),

    #[error("GPU initialization failed: {0:#}")]
    Gpu(anyhow::Error),
}

/// Error that terminated a running frame loop.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("device failure in frame {frame}")]
    Device {
        frame: u64,
        #[source]
        source: DeviceError,
    },

    #[error("shader uniform update failed in frame {frame}")]
    Shader {
        frame: u64,
        #[source]
        source: ShaderError,
    },
}
