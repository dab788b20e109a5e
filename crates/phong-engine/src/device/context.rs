use std::sync::Arc;

use anyhow::{Context, Result};
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::error::DeviceError;

use super::GpuInit;
use super::surface::{self, SurfaceErrorAction};

/// Swapchain texture acquired for one frame, plus its encoder.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}

/// wgpu device, queue and the window surface with its depth attachment.
///
/// The surface is configured once at the window's startup size.
pub struct Gpu {
    _instance: wgpu::Instance,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth_view: wgpu::TextureView,
    depth_format: wgpu::TextureFormat,
}

impl Gpu {
    pub async fn new(window: Arc<Window>, init: GpuInit) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no GPU adapter can present to this window")?;

        let info = adapter.get_info();
        log::info!("GPU adapter: {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("phong device"),
                required_features: wgpu::Features::empty(),
                required_limits: init.required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let caps = surface.get_capabilities(&adapter);
        let format = surface::choose_surface_format(&caps, init.prefer_srgb)
            .context("surface reports no supported formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode: init.present_mode,
            alpha_mode: surface::choose_alpha_mode(&caps),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_view = surface::create_depth_view(&device, init.depth_format, size);

        Ok(Self {
            _instance: instance,
            surface,
            device,
            queue,
            config,
            depth_view,
            depth_format: init.depth_format,
        })
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn depth_format(&self) -> wgpu::TextureFormat {
        self.depth_format
    }

    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.depth_view
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        PhysicalSize::new(self.config.width, self.config.height)
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Acquires the next swapchain texture.
    ///
    /// `Ok(None)` means this frame is dropped (surface lost, outdated or timed
    /// out); the caller should carry on with the next one.
    pub fn acquire(&self) -> Result<Option<GpuFrame>, DeviceError> {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(err) => {
                return match surface::classify_surface_error(&err) {
                    SurfaceErrorAction::Reconfigure => {
                        log::warn!("surface {err}; reconfiguring");
                        self.surface.configure(&self.device, &self.config);
                        Ok(None)
                    }
                    SurfaceErrorAction::SkipFrame => {
                        log::debug!("surface {err}; skipping frame");
                        Ok(None)
                    }
                    SurfaceErrorAction::Fatal => Err(DeviceError::Surface(err.to_string())),
                };
            }
        };

        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("phong frame encoder"),
            });

        Ok(Some(GpuFrame {
            surface_texture,
            view,
            encoder,
        }))
    }

    /// Submits the frame's commands and queues it for display.
    pub fn submit(&self, frame: GpuFrame) {
        let GpuFrame {
            surface_texture,
            view,
            encoder,
        } = frame;
        self.queue.submit(std::iter::once(encoder.finish()));
        drop(view);
        surface_texture.present();
    }
}
