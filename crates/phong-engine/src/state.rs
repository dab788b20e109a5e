//! Global device state applied once before the frame loop.

use crate::device::RasterDevice;

/// Which triangle faces are discarded.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CullMode {
    None,
    Front,
    Back,
}

/// Vertex traversal order that designates a front face.
///
/// Asset dependent: exporters disagree on it.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Winding {
    Cw,
    Ccw,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DepthCompare {
    /// Strictly closer fragments win.
    Less,
    LessEqual,
    Always,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DepthTest {
    pub compare: DepthCompare,
    pub write: bool,
}

impl Default for DepthTest {
    fn default() -> Self {
        Self {
            compare: DepthCompare::Less,
            write: true,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BlendMode {
    /// `src * src_alpha + dst * (1 - src_alpha)` on every channel.
    SourceOver,
}

/// Drawable region in physical pixels.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[inline]
    pub const fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }

    #[inline]
    pub fn aspect(self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

/// Straight-alpha RGBA clear color.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct ClearColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl ClearColor {
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const GRAY: ClearColor = ClearColor::new(0.2, 0.2, 0.2, 0.0);
}

/// Culling, depth, blending and viewport configuration of the device.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct RenderState {
    pub cull: CullMode,
    pub front_face: Winding,
    /// `None` disables depth testing.
    pub depth: Option<DepthTest>,
    /// `None` disables blending.
    pub blend: Option<BlendMode>,
    pub viewport: Viewport,
}

impl RenderState {
    /// Default state covering a `width` x `height` drawable.
    pub fn for_extent(width: u32, height: u32) -> Self {
        Self {
            cull: CullMode::Back,
            front_face: Winding::Cw,
            depth: Some(DepthTest::default()),
            blend: Some(BlendMode::SourceOver),
            viewport: Viewport::full(width, height),
        }
    }

    pub fn with_cull(mut self, cull: CullMode, front_face: Winding) -> Self {
        self.cull = cull;
        self.front_face = front_face;
        self
    }

    /// Pushes this state to `device`. Applying the same state again is a no-op.
    pub fn apply<D: RasterDevice + ?Sized>(&self, device: &mut D) {
        log::debug!(
            "render state: cull={:?} front={:?} depth={:?} blend={:?} viewport={}x{}",
            self.cull,
            self.front_face,
            self.depth,
            self.blend,
            self.viewport.width,
            self.viewport.height
        );
        device.apply_state(self);
    }
}

impl Default for RenderState {
    fn default() -> Self {
        Self::for_extent(1920, 1080)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::HeadlessDevice;

    #[test]
    fn default_state_matches_reference_setup() {
        let s = RenderState::default();
        assert_eq!(s.cull, CullMode::Back);
        assert_eq!(s.front_face, Winding::Cw);
        assert_eq!(s.depth.map(|d| d.compare), Some(DepthCompare::Less));
        assert_eq!(s.blend, Some(BlendMode::SourceOver));
        assert_eq!(s.viewport, Viewport::full(1920, 1080));
    }

    #[test]
    fn apply_is_idempotent() {
        let state = RenderState::for_extent(640, 480).with_cull(CullMode::Front, Winding::Ccw);

        let mut once = HeadlessDevice::new(640, 480);
        state.apply(&mut once);

        let mut thrice = HeadlessDevice::new(640, 480);
        state.apply(&mut thrice);
        state.apply(&mut thrice);
        state.apply(&mut thrice);

        assert_eq!(once.render_state(), thrice.render_state());
        assert_eq!(thrice.render_state(), Some(&state));
        assert_eq!(thrice.state_changes(), 1);
    }

    #[test]
    fn aspect_uses_viewport_extent() {
        assert!((Viewport::full(1920, 1080).aspect() - 16.0 / 9.0).abs() < 1e-6);
    }
}
