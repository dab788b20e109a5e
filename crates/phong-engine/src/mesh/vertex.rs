use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Interleaved vertex record uploaded to the device as-is.
///
/// `uv` is never populated but stays in the record so the stride (and the
/// offset of any attribute added later) is stable.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            uv: [0.0; 2],
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    pub fn normal(&self) -> Vec3 {
        Vec3::from_array(self.normal)
    }
}

/// Component format of a bound vertex attribute.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AttributeFormat {
    Float32x2,
    Float32x3,
}

impl AttributeFormat {
    pub fn components(self) -> u32 {
        match self {
            AttributeFormat::Float32x2 => 2,
            AttributeFormat::Float32x3 => 3,
        }
    }

    pub fn size(self) -> u64 {
        self.components() as u64 * std::mem::size_of::<f32>() as u64
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VertexAttribute {
    /// Shader input location.
    pub location: u32,
    pub format: AttributeFormat,
    /// Byte offset inside one vertex record.
    pub offset: u64,
}

/// Attribute binding of an interleaved vertex buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VertexLayout {
    pub stride: u64,
    pub attributes: &'static [VertexAttribute],
}

impl VertexLayout {
    /// Layout of [`Vertex`]: position at location 0, normal at location 1.
    ///
    /// uv occupies the last 8 bytes of the stride and is not bound.
    pub const STANDARD: VertexLayout = VertexLayout {
        stride: std::mem::size_of::<Vertex>() as u64,
        attributes: &[
            VertexAttribute {
                location: 0,
                format: AttributeFormat::Float32x3,
                offset: 0,
            },
            VertexAttribute {
                location: 1,
                format: AttributeFormat::Float32x3,
                offset: std::mem::size_of::<[f32; 3]>() as u64,
            },
        ],
    };

    pub fn attribute(&self, location: u32) -> Option<&VertexAttribute> {
        self.attributes.iter().find(|a| a.location == location)
    }
}
