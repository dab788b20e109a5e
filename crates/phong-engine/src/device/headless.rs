use std::collections::HashMap;
use std::ops::Range;

use crate::error::{DeviceError, ReleaseError};
use crate::mesh::{Vertex, VertexLayout};
use crate::shader::{ProgramInterface, UniformSlot};
use crate::state::{ClearColor, RenderState};

use super::raster::{BufferId, ProgramId, RasterDevice};

/// One call observed by a [`HeadlessDevice`].
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    ApplyState(RenderState),
    CreateBuffer { buffer: BufferId, vertices: u32 },
    ReleaseBuffer(BufferId),
    CreateProgram(ProgramId),
    WriteUniform { program: ProgramId, slot: UniformSlot, bytes: Vec<u8> },
    UseProgram(ProgramId),
    BindBuffer(BufferId),
    Clear(ClearColor),
    Draw { buffer: BufferId, vertices: Range<u32> },
    Present,
}

#[derive(Debug)]
struct HeadlessBuffer {
    vertices: Vec<Vertex>,
    released: bool,
}

#[derive(Debug)]
struct HeadlessProgram {
    uniforms: Vec<Vec<u8>>,
}

/// In-memory [`RasterDevice`] that validates and records every call.
///
/// Used for headless runs and tests; nothing is rasterized.
#[derive(Debug)]
pub struct HeadlessDevice {
    extent: (u32, u32),
    state: Option<RenderState>,
    state_changes: u32,

    buffers: HashMap<BufferId, HeadlessBuffer>,
    programs: HashMap<ProgramId, HeadlessProgram>,
    next_id: u32,

    bound_program: Option<ProgramId>,
    bound_buffer: Option<BufferId>,

    commands: Vec<Command>,
    presented: u64,
    fail_present_at: Option<u64>,
}

impl HeadlessDevice {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            extent: (width, height),
            state: None,
            state_changes: 0,
            buffers: HashMap::new(),
            programs: HashMap::new(),
            next_id: 1,
            bound_program: None,
            bound_buffer: None,
            commands: Vec::new(),
            presented: 0,
            fail_present_at: None,
        }
    }

    /// Makes the `frame`-th present (0-based) fail with a surface error.
    pub fn fail_present_at(mut self, frame: u64) -> Self {
        self.fail_present_at = Some(frame);
        self
    }

    pub fn extent(&self) -> (u32, u32) {
        self.extent
    }

    pub fn render_state(&self) -> Option<&RenderState> {
        self.state.as_ref()
    }

    /// Number of `apply_state` calls that actually changed the state.
    pub fn state_changes(&self) -> u32 {
        self.state_changes
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn draw_calls(&self) -> Vec<(BufferId, Range<u32>)> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::Draw { buffer, vertices } => Some((*buffer, vertices.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn frames_presented(&self) -> u64 {
        self.presented
    }

    /// Contents of a live buffer.
    pub fn buffer_contents(&self, buffer: BufferId) -> Option<&[Vertex]> {
        self.buffers
            .get(&buffer)
            .filter(|b| !b.released)
            .map(|b| b.vertices.as_slice())
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.values().filter(|b| !b.released).count()
    }

    /// Last bytes written to `slot` of `program`.
    pub fn uniform_bytes(&self, program: ProgramId, slot: UniformSlot) -> Option<&[u8]> {
        self.programs
            .get(&program)
            .and_then(|p| p.uniforms.get(slot.index() as usize))
            .map(Vec::as_slice)
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn live_buffer(&self, buffer: BufferId) -> Result<&HeadlessBuffer, DeviceError> {
        self.buffers
            .get(&buffer)
            .filter(|b| !b.released)
            .ok_or(DeviceError::UnknownBuffer(buffer.0))
    }
}

impl RasterDevice for HeadlessDevice {
    fn apply_state(&mut self, state: &RenderState) {
        if self.state.as_ref() != Some(state) {
            self.state = Some(*state);
            self.state_changes += 1;
        }
        self.commands.push(Command::ApplyState(*state));
    }

    fn create_vertex_buffer(
        &mut self,
        vertices: &[Vertex],
        layout: VertexLayout,
    ) -> Result<BufferId, DeviceError> {
        if vertices.is_empty() {
            return Err(DeviceError::EmptyUpload);
        }
        debug_assert_eq!(layout.stride as usize, std::mem::size_of::<Vertex>());

        let buffer = BufferId(self.next_id());
        self.buffers.insert(
            buffer,
            HeadlessBuffer {
                vertices: vertices.to_vec(),
                released: false,
            },
        );
        self.commands.push(Command::CreateBuffer {
            buffer,
            vertices: vertices.len() as u32,
        });
        Ok(buffer)
    }

    fn release_vertex_buffer(&mut self, buffer: BufferId) -> Result<(), DeviceError> {
        let entry = self
            .buffers
            .get_mut(&buffer)
            .ok_or(DeviceError::UnknownBuffer(buffer.0))?;
        if entry.released {
            return Err(ReleaseError::AlreadyReleased("vertex buffer").into());
        }
        entry.released = true;
        entry.vertices = Vec::new();
        if self.bound_buffer == Some(buffer) {
            self.bound_buffer = None;
        }
        self.commands.push(Command::ReleaseBuffer(buffer));
        Ok(())
    }

    fn create_program(&mut self, program: &ProgramInterface) -> Result<ProgramId, DeviceError> {
        let id = ProgramId(self.next_id());
        let uniforms = program
            .uniforms()
            .iter()
            .map(|u| vec![0u8; u.size as usize])
            .collect();
        self.programs.insert(id, HeadlessProgram { uniforms });
        self.commands.push(Command::CreateProgram(id));
        Ok(id)
    }

    fn write_uniform(
        &mut self,
        program: ProgramId,
        slot: UniformSlot,
        bytes: &[u8],
    ) -> Result<(), DeviceError> {
        let entry = self
            .programs
            .get_mut(&program)
            .ok_or(DeviceError::UnknownProgram(program.0))?;
        let storage = entry
            .uniforms
            .get_mut(slot.index() as usize)
            .ok_or(DeviceError::UnknownSlot {
                program: program.0,
                slot: slot.index(),
            })?;
        *storage = bytes.to_vec();
        self.commands.push(Command::WriteUniform {
            program,
            slot,
            bytes: bytes.to_vec(),
        });
        Ok(())
    }

    fn use_program(&mut self, program: ProgramId) -> Result<(), DeviceError> {
        if !self.programs.contains_key(&program) {
            return Err(DeviceError::UnknownProgram(program.0));
        }
        self.bound_program = Some(program);
        self.commands.push(Command::UseProgram(program));
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, buffer: BufferId) -> Result<(), DeviceError> {
        self.live_buffer(buffer)?;
        self.bound_buffer = Some(buffer);
        self.commands.push(Command::BindBuffer(buffer));
        Ok(())
    }

    fn clear(&mut self, color: ClearColor) {
        self.commands.push(Command::Clear(color));
    }

    fn draw(&mut self, vertices: Range<u32>) -> Result<(), DeviceError> {
        if self.bound_program.is_none() {
            return Err(DeviceError::NoProgramBound);
        }
        let buffer = self.bound_buffer.ok_or(DeviceError::NoBufferBound)?;
        let len = self.live_buffer(buffer)?.vertices.len() as u32;
        if vertices.start > vertices.end || vertices.end > len {
            return Err(DeviceError::DrawOutOfRange {
                buffer: buffer.0,
                first: vertices.start,
                end: vertices.end,
                len,
            });
        }
        self.commands.push(Command::Draw { buffer, vertices });
        Ok(())
    }

    fn present(&mut self) -> Result<(), DeviceError> {
        if self.fail_present_at == Some(self.presented) {
            return Err(DeviceError::Surface("injected present failure".to_string()));
        }
        self.presented += 1;
        self.commands.push(Command::Present);
        Ok(())
    }
}
