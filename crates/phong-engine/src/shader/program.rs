use std::path::Path;

use glam::Mat4;

use crate::device::{ProgramId, RasterDevice};
use crate::error::ShaderError;

use super::link::{link, ProgramInterface, UniformSlot};
use super::stage::{compile, read_text, ShaderStage};

/// Slots of the three transform matrices every program must declare.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct MatrixSlots {
    pub model: UniformSlot,
    pub view: UniformSlot,
    pub projection: UniformSlot,
}

/// A linked program that lives on a [`RasterDevice`].
#[derive(Debug)]
pub struct ShaderProgram {
    id: ProgramId,
    interface: ProgramInterface,
}

impl ShaderProgram {
    /// Compiles both stages, links them and creates the device program.
    pub fn compile_and_link<D: RasterDevice + ?Sized>(
        device: &mut D,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<Self, ShaderError> {
        let vertex = compile(ShaderStage::Vertex, vertex_src)?;
        let fragment = compile(ShaderStage::Fragment, fragment_src)?;
        let interface = link(vertex, fragment)?;
        let id = device.create_program(&interface)?;
        Ok(Self { id, interface })
    }

    /// Reads both stage sources from disk, then [`Self::compile_and_link`].
    pub fn load<D: RasterDevice + ?Sized>(
        device: &mut D,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<Self, ShaderError> {
        let vertex_src = read_text(vertex_path.as_ref())?;
        let fragment_src = read_text(fragment_path.as_ref())?;
        log::info!(
            "compiling shaders '{}' + '{}'",
            vertex_path.as_ref().display(),
            fragment_path.as_ref().display()
        );
        Self::compile_and_link(device, &vertex_src, &fragment_src)
    }

    pub fn id(&self) -> ProgramId {
        self.id
    }

    pub fn interface(&self) -> &ProgramInterface {
        &self.interface
    }

    pub fn uniform_location(&self, name: &str) -> Result<UniformSlot, ShaderError> {
        self.interface.uniform_location(name)
    }

    /// Resolves `model`, `view` and `projection`; any missing one is an error.
    pub fn matrix_slots(&self) -> Result<MatrixSlots, ShaderError> {
        Ok(MatrixSlots {
            model: self.uniform_location("model")?,
            view: self.uniform_location("view")?,
            projection: self.uniform_location("projection")?,
        })
    }

    /// Makes this the current program.
    pub fn bind<D: RasterDevice + ?Sized>(&self, device: &mut D) -> Result<(), ShaderError> {
        device.use_program(self.id)?;
        Ok(())
    }

    /// Uploads a column-major matrix into `slot`.
    pub fn set_mat4<D: RasterDevice + ?Sized>(
        &self,
        device: &mut D,
        slot: UniformSlot,
        value: &Mat4,
    ) -> Result<(), ShaderError> {
        let decl = self
            .interface
            .uniform(slot)
            .ok_or_else(|| ShaderError::UniformNotFound(format!("#{}", slot.index())))?;
        if !decl.is_mat4 {
            return Err(ShaderError::UniformType {
                name: decl.name.clone(),
            });
        }

        let cols = value.to_cols_array();
        device.write_uniform(self.id, slot, bytemuck::cast_slice(&cols))?;
        Ok(())
    }
}
