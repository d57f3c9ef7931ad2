//! A minimal desktop shell that opens an OpenGL render window next to the
//! main application window and draws a single static triangle.
#![warn(missing_docs)]

mod logging;
mod renderer;
pub mod core;

/// Runs the viewer application.
pub fn run() {
    logging::init();
    let app = core::Application::new();
    app.run();
}
