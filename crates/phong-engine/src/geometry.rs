//! Device-resident vertex storage for one mesh.

use crate::device::{BufferId, RasterDevice};
use crate::error::{DeviceError, ReleaseError};
use crate::mesh::{Mesh, VertexLayout};

/// Immutable vertex buffer holding a whole [`Mesh`].
///
/// Drawing always covers every vertex with one non-indexed triangle-list call.
#[derive(Debug)]
pub struct GeometryBuffer {
    id: BufferId,
    vertex_count: u32,
    layout: VertexLayout,
    released: bool,
}

impl GeometryBuffer {
    /// Transfers the mesh to device memory. One-shot: there is no update path.
    pub fn upload<D: RasterDevice + ?Sized>(device: &mut D, mesh: &Mesh) -> Result<Self, DeviceError> {
        let layout = VertexLayout::STANDARD;
        let id = device.create_vertex_buffer(mesh.vertices(), layout)?;

        log::debug!(
            "uploaded {} vertices ({} bytes, stride {})",
            mesh.vertex_count(),
            mesh.vertex_count() as u64 * layout.stride,
            layout.stride
        );

        Ok(Self {
            id,
            vertex_count: mesh.vertex_count(),
            layout,
            released: false,
        })
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn layout(&self) -> VertexLayout {
        self.layout
    }

    pub fn bind<D: RasterDevice + ?Sized>(&self, device: &mut D) -> Result<(), DeviceError> {
        self.ensure_live()?;
        device.bind_vertex_buffer(self.id)
    }

    /// Issues the draw for `[0, vertex_count)`. Expects [`Self::bind`] first.
    pub fn draw<D: RasterDevice + ?Sized>(&self, device: &mut D) -> Result<(), DeviceError> {
        self.ensure_live()?;
        device.draw(0..self.vertex_count)
    }

    /// Frees the device buffer. A second call fails.
    pub fn release<D: RasterDevice + ?Sized>(&mut self, device: &mut D) -> Result<(), DeviceError> {
        self.ensure_live()?;
        device.release_vertex_buffer(self.id)?;
        self.released = true;
        Ok(())
    }

    fn ensure_live(&self) -> Result<(), DeviceError> {
        if self.released {
            return Err(ReleaseError::AlreadyReleased("vertex buffer").into());
        }
        Ok(())
    }
}
