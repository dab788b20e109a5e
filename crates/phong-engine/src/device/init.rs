/// GPU context options.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Pick an sRGB swapchain format when the surface offers one.
    pub prefer_srgb: bool,

    /// `Fifo` waits for vsync, making `present` the loop's only blocking point.
    pub present_mode: wgpu::PresentMode,

    pub power_preference: wgpu::PowerPreference,

    pub required_limits: wgpu::Limits,

    /// Format of the depth attachment cleared and tested every frame.
    pub depth_format: wgpu::TextureFormat,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::Fifo,
            power_preference: wgpu::PowerPreference::HighPerformance,
            required_limits: wgpu::Limits::default(),
            depth_format: wgpu::TextureFormat::Depth32Float,
        }
    }
}
