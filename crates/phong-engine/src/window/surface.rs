/// Window-like target the frame loop drives.
pub trait Surface {
    /// Processes pending window-system events without blocking.
    fn poll_events(&mut self);

    /// True once the user asked to close the window. Never resets.
    fn close_requested(&self) -> bool;

    /// Framebuffer extent in pixels.
    fn size(&self) -> (u32, u32);
}

/// Scripted surface with no window behind it.
///
/// Reports a close request after a fixed number of polls, or never.
#[derive(Debug, Clone)]
pub struct HeadlessSurface {
    width: u32,
    height: u32,
    polls: u64,
    close_after: Option<u64>,
}

impl HeadlessSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            polls: 0,
            close_after: None,
        }
    }

    /// Requests close once `polls` events pumps have happened. `0` starts closed.
    pub fn close_after(mut self, polls: u64) -> Self {
        self.close_after = Some(polls);
        self
    }

    pub fn polls(&self) -> u64 {
        self.polls
    }
}

impl Surface for HeadlessSurface {
    fn poll_events(&mut self) {
        self.polls += 1;
    }

    fn close_requested(&self) -> bool {
        self.close_after.is_some_and(|n| self.polls >= n)
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
