use crate::core::surface::RenderSurface;
use crate::core::*;

use std::process;
use winit::application::ApplicationHandler;
use winit::error::EventLoopError;
use winit::event::{StartCause, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy};
use winit::window::{WindowAttributes, WindowId};

/// A module with known application exit codes.
mod exit_codes {
    /// An error thrown by the OS.
    pub const OS_ERROR: i32 = 1;
    /// An operation is not supported by the rendering backend.
    pub const OP_NOT_SUPPORTED: i32 = 2;
    /// An error with the event loop.
    pub const EVENT_LOOP_ERROR: i32 = 3;
    /// A shader failed to compile or link.
    pub const SHADER_ERROR: i32 = 4;
}

/// A task posted to the UI thread through the event loop's proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UiTask {
    /// Brings up the render surface and starts its frame loop.
    RunRenderSurface,
}

/// An application, the main entrypoint of the program.
pub struct Application {
    event_loop: EventLoop<UiTask>,
    application: ApplicationInternal,
}

/// An internal struct handling OS events when the application is run.
struct ApplicationInternal {
    proxy: EventLoopProxy<UiTask>,
    host: Option<RawWindow>,
    surface: Option<RenderSurface>,
    surface_dispatched: bool,
}

impl Application {
    /// Creates a new application.
    pub fn new() -> Self {
        let event_loop = EventLoop::with_user_event()
            .build()
            .expect("Failed to create event loop");
        let proxy = event_loop.create_proxy();

        event_loop.set_control_flow(winit::event_loop::ControlFlow::Poll);

        Application {
            event_loop,
            application: ApplicationInternal {
                proxy,
                host: None,
                surface: None,
                surface_dispatched: false,
            },
        }
    }

    /// Runs the application on the calling thread.
    pub fn run(self) -> ! {
        let Application {
            event_loop,
            mut application,
        } = self;
        match event_loop.run_app(&mut application) {
            Ok(_) => process::exit(0),
            Err(e) => match e {
                EventLoopError::NotSupported(e) => {
                    log::error!("operation not supported: {e}");
                    process::exit(exit_codes::OP_NOT_SUPPORTED)
                }
                EventLoopError::Os(e) => {
                    log::error!("OS error: {e}");
                    process::exit(exit_codes::OS_ERROR)
                }
                EventLoopError::RecreationAttempt => {
                    log::error!("event loop cannot be recreated");
                    process::exit(exit_codes::EVENT_LOOP_ERROR)
                }
                EventLoopError::ExitFailure(code) => {
                    log::error!("event loop exited with code {code}");
                    process::exit(code)
                }
            },
        }
    }
}

impl Default for Application {
    fn default() -> Self {
        Application::new()
    }
}

impl ApplicationInternal {
    /// Opens the main application window.
    fn open_host_window(&mut self, event_loop: &ActiveEventLoop) {
        let attrs = WindowAttributes::default().with_title("Mag3DView");
        let host = event_loop
            .create_window(attrs)
            .expect("Failed to create the main window");
        log::info!("main window open");
        self.host = Some(host);
    }

    /// Posts the one-shot task that brings up the render surface.
    ///
    /// The task is posted at most once per process; later calls are ignored.
    fn dispatch_render_surface(&mut self) {
        if self.surface_dispatched {
            return;
        }
        self.surface_dispatched = true;

        self.proxy
            .send_event(UiTask::RunRenderSurface)
            .expect("Event loop is gone");
    }

    fn host_event(&mut self, event_loop: &ActiveEventLoop, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                // Tear the scene down while its GL context is still alive.
                if let Some(surface) = &mut self.surface {
                    surface.unload();
                }
                event_loop.exit();
            }
            _ => {}
        }
    }

    fn surface_event(&mut self, event: WindowEvent) {
        let Some(surface) = &mut self.surface else {
            return;
        };
        match event {
            WindowEvent::ActivationTokenDone { .. } => {}
            WindowEvent::Resized(physical_size) => surface.resize(physical_size),
            WindowEvent::Moved(_) => {}
            WindowEvent::CloseRequested => {
                // Only the render surface goes away; the main window stays up.
                if let Some(mut surface) = self.surface.take() {
                    surface.unload();
                }
            }
            WindowEvent::Destroyed => {}
            WindowEvent::DroppedFile(_) => {}
            WindowEvent::HoveredFile(_) => {}
            WindowEvent::HoveredFileCancelled => {}
            WindowEvent::Focused(_) => {}
            WindowEvent::KeyboardInput { .. } => {}
            WindowEvent::ModifiersChanged(_) => {}
            WindowEvent::Ime(_) => {}
            WindowEvent::CursorMoved { .. } => {}
            WindowEvent::CursorEntered { .. } => {}
            WindowEvent::CursorLeft { .. } => {}
            WindowEvent::MouseWheel { .. } => {}
            WindowEvent::MouseInput { .. } => {}
            WindowEvent::PinchGesture { .. } => {}
            WindowEvent::PanGesture { .. } => {}
            WindowEvent::DoubleTapGesture { .. } => {}
            WindowEvent::RotationGesture { .. } => {}
            WindowEvent::TouchpadPressure { .. } => {}
            WindowEvent::AxisMotion { .. } => {}
            WindowEvent::Touch(_) => {}
            WindowEvent::ScaleFactorChanged { .. } => {}
            WindowEvent::ThemeChanged(_) => {}
            WindowEvent::Occluded(_) => {}
            WindowEvent::RedrawRequested => surface.render_frame(),
        }
    }
}

impl ApplicationHandler<UiTask> for ApplicationInternal {
    fn new_events(&mut self, _: &ActiveEventLoop, cause: StartCause) {
        // Continuous rendering: ask for the next frame on every poll pass.
        if let StartCause::Poll = cause {
            if let Some(surface) = &self.surface {
                surface.request_redraw();
            }
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.host.is_none() {
            self.open_host_window(event_loop);
            self.dispatch_render_surface();
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, task: UiTask) {
        match task {
            UiTask::RunRenderSurface => {
                let mut surface = RenderSurface::open(event_loop);
                if let Err(e) = surface.load() {
                    log::error!("{e}");
                    process::exit(exit_codes::SHADER_ERROR);
                }
                surface.request_redraw();
                self.surface = Some(surface);
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.surface.as_ref().map(RenderSurface::id) == Some(window_id) {
            self.surface_event(event);
        } else if self.host.as_ref().map(RawWindow::id) == Some(window_id) {
            self.host_event(event_loop, event);
        }
    }
}
