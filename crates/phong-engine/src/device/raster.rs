use std::ops::Range;

use crate::error::DeviceError;
use crate::mesh::{Vertex, VertexLayout};
use crate::shader::{ProgramInterface, UniformSlot};
use crate::state::{ClearColor, RenderState};

/// Handle of a device-resident vertex buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct BufferId(pub(crate) u32);

/// Handle of a linked device program.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ProgramId(pub(crate) u32);

impl BufferId {
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl ProgramId {
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Immediate-mode rasterization device.
///
/// Calls are ordered and not reentrant; one frame is
/// `clear -> (use_program / write_uniform / bind_vertex_buffer / draw)* -> present`.
/// Uniform values are latched at `present`: every draw of a frame sees the
/// last value written before it.
pub trait RasterDevice {
    /// Sets global culling/depth/blend/viewport state.
    ///
    /// Applying a state equal to the current one must not change anything.
    fn apply_state(&mut self, state: &RenderState);

    /// Copies `vertices` into an immutable device buffer laid out as `layout`.
    fn create_vertex_buffer(
        &mut self,
        vertices: &[Vertex],
        layout: VertexLayout,
    ) -> Result<BufferId, DeviceError>;

    /// Frees a buffer. Unknown or already released ids are an error.
    fn release_vertex_buffer(&mut self, buffer: BufferId) -> Result<(), DeviceError>;

    /// Creates a program from an already linked interface.
    fn create_program(&mut self, program: &ProgramInterface) -> Result<ProgramId, DeviceError>;

    fn write_uniform(
        &mut self,
        program: ProgramId,
        slot: UniformSlot,
        bytes: &[u8],
    ) -> Result<(), DeviceError>;

    fn use_program(&mut self, program: ProgramId) -> Result<(), DeviceError>;

    fn bind_vertex_buffer(&mut self, buffer: BufferId) -> Result<(), DeviceError>;

    /// Clears color to `color` and depth to the far plane.
    fn clear(&mut self, color: ClearColor);

    /// Non-indexed triangle-list draw over `vertices` of the bound buffer.
    fn draw(&mut self, vertices: Range<u32>) -> Result<(), DeviceError>;

    /// Finishes the frame and hands it to the display. May block on vsync.
    fn present(&mut self) -> Result<(), DeviceError>;
}
