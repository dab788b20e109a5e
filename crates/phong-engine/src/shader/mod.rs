//! Shader stages, program linkage and uniform slots.
//!
//! Stages are WGSL. `naga` parses and validates each stage on the CPU so that
//! compile and link failures surface as [`crate::error::ShaderError`] before
//! the device ever sees the program.

mod link;
mod program;
mod stage;

pub use link::{link, ProgramInterface, StageMask, UniformDecl, UniformSlot};
pub use program::{MatrixSlots, ShaderProgram};
pub use stage::{compile, read_text, CompiledStage, ShaderStage};
