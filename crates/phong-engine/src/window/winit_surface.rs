use std::sync::Arc;
use std::time::Duration;

use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowId};

use crate::error::InitError;

use super::Surface;

/// Pumps allowed for the platform to deliver `resumed` at startup.
const STARTUP_PUMPS: u32 = 100;

/// Window configuration.
#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub title: String,
    pub size: PhysicalSize<u32>,
    pub resizable: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Phong Illumination".to_string(),
            size: PhysicalSize::new(1920, 1080),
            resizable: false,
        }
    }
}

/// Event handler state shared with winit during a pump.
struct WindowState {
    config: WindowConfig,
    window: Option<Arc<Window>>,
    create_error: Option<winit::error::OsError>,
    close_requested: bool,
}

impl ApplicationHandler for WindowState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        event_loop.set_control_flow(ControlFlow::Poll);

        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.size)
            .with_resizable(self.config.resizable);

        match event_loop.create_window(attrs) {
            Ok(window) => {
                let size = window.inner_size();
                log::info!(
                    "window '{}' opened at {}x{}",
                    self.config.title,
                    size.width,
                    size.height
                );
                self.window = Some(Arc::new(window));
            }
            Err(err) => {
                log::error!("failed to create window: {err}");
                self.create_error = Some(err);
            }
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let ours = self.window.as_ref().is_some_and(|w| w.id() == window_id);
        if !ours {
            return;
        }

        if let WindowEvent::CloseRequested = event {
            log::info!("close requested");
            self.close_requested = true;
        }
    }
}

/// Native window driven by pumping the winit event loop once per frame.
pub struct WinitSurface {
    event_loop: EventLoop<()>,
    state: WindowState,
}

impl WinitSurface {
    /// Creates the event loop and pumps it until the window exists.
    pub fn open(config: WindowConfig) -> Result<Self, InitError> {
        let mut event_loop = EventLoop::new().map_err(InitError::EventLoop)?;
        let mut state = WindowState {
            config,
            window: None,
            create_error: None,
            close_requested: false,
        };

        for _ in 0..STARTUP_PUMPS {
            let status = event_loop.pump_app_events(Some(Duration::from_millis(10)), &mut state);

            if let Some(err) = state.create_error.take() {
                return Err(InitError::Window(err));
            }
            if state.window.is_some() {
                return Ok(Self { event_loop, state });
            }
            if let PumpStatus::Exit(code) = status {
                log::warn!("event loop exited during startup with code {code}");
                break;
            }
        }

        Err(InitError::WindowNotReady(STARTUP_PUMPS))
    }

    /// Shared handle for the GPU surface.
    pub fn window(&self) -> Option<Arc<Window>> {
        self.state.window.clone()
    }
}

impl Surface for WinitSurface {
    fn poll_events(&mut self) {
        if let PumpStatus::Exit(code) = self
            .event_loop
            .pump_app_events(Some(Duration::ZERO), &mut self.state)
        {
            log::debug!("event loop exited with code {code}");
            self.state.close_requested = true;
        }
    }

    fn close_requested(&self) -> bool {
        self.state.close_requested
    }

    fn size(&self) -> (u32, u32) {
        match &self.state.window {
            Some(w) => {
                let s = w.inner_size();
                (s.width, s.height)
            }
            None => (self.state.config.size.width, self.state.config.size.height),
        }
    }
}
