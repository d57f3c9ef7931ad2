//! A module with the core UI elements - Application and the render surface.

mod application;
mod surface;

use glutin::prelude::*;
use surface::RawWindow;

pub use application::Application;
