use self::helper::*;
use crate::core::*;
use crate::renderer::{ShaderError, TriangleScene};

use glutin::config::{Config, ConfigTemplateBuilder};
use glutin::context::{
    ContextApi, ContextAttributesBuilder, GlProfile, PossiblyCurrentContext, Version,
};
use glutin::display::GetGlDisplay;
use glutin::surface::{Surface as GLSurface, SurfaceAttributesBuilder, WindowSurface};
use glutin_winit::DisplayBuilder;
#[allow(deprecated)]
use raw_window_handle::HasRawWindowHandle;
use std::ffi::CString;
use std::mem;
use winit::dpi::PhysicalSize;
use winit::event_loop::ActiveEventLoop;
use winit::window::{WindowAttributes, WindowId};

/// A window produced by `winit`.
///
/// A window that renders must have an OpenGL context attached, so it should
/// only be created using [`glutin_winit::DisplayBuilder::build`] or
/// [`glutin_winit::finalize_window`]; the host window carries no context and
/// can be created directly.
pub(super) type RawWindow = winit::window::Window;

/// The window the triangle is rendered into.
///
/// The surface walks a fixed lifecycle: it opens [uninitialized](SurfaceState),
/// [`load`](RenderSurface::load) uploads the scene once, frames are drawn
/// until the window closes, and [`unload`](RenderSurface::unload) releases the
/// GPU objects.
pub struct RenderSurface {
    raw: RawWindow,
    gl: OpenGL,
    state: SurfaceState,
}

/// Properties required to draw with OpenGL.
struct OpenGL {
    surface: GLSurface<WindowSurface>,
    ctx: PossiblyCurrentContext,
}

/// Where the surface is in its setup/teardown lifecycle.
///
/// The scene's GPU handles exist exactly while the state is
/// [`SurfaceState::Loaded`]; [`SurfaceState::Unloaded`] is terminal.
enum SurfaceState {
    Uninitialized,
    Loaded(TriangleScene),
    Unloaded,
}

impl SurfaceState {
    /// Moves the machine to [`SurfaceState::Unloaded`] and takes the scene
    /// out, if one is loaded.
    ///
    /// Returns the scene only on the first call after a load, so the GPU
    /// release runs at most once.
    fn take_scene(&mut self) -> Option<TriangleScene> {
        match mem::replace(self, SurfaceState::Unloaded) {
            SurfaceState::Loaded(scene) => Some(scene),
            _ => None,
        }
    }
}

impl RenderSurface {
    /// Opens the render window along with its OpenGL 3.3 core context.
    ///
    /// The surface starts uninitialized; call [`RenderSurface::load`] before
    /// the first frame.
    pub(super) fn open(event_loop: &ActiveEventLoop) -> Self {
        let template = ConfigTemplateBuilder::new().with_depth_size(24);

        /// A comparator for finding the [`Config`] with the fewest samples.
        fn fewest_samples(c1: Config, c2: Config) -> Config {
            if c1.num_samples() < c2.num_samples() {
                c1
            } else {
                c2
            }
        }

        let (raw_window, gl_config) = DisplayBuilder::new()
            .with_window_attributes(Some(RenderSurface::default_attrs()))
            .build(event_loop, template, |configs| {
                configs.reduce(fewest_samples).unwrap()
            })
            .expect("Could not create OpenGL config");
        let raw = raw_window.expect("Could not create window with OpenGL context");

        let gl = OpenGL::new(&gl_config, &raw);

        log::info!("render surface open");

        RenderSurface {
            raw,
            gl,
            state: SurfaceState::Uninitialized,
        }
    }

    /// Returns the window's unique ID.
    pub fn id(&self) -> WindowId {
        self.raw.id()
    }

    /// Uploads the scene to the GPU, moving the surface to the loaded state.
    ///
    /// Runs once, before the first frame. A load request in any other state
    /// is flagged and ignored.
    pub(super) fn load(&mut self) -> Result<(), ShaderError> {
        if !matches!(self.state, SurfaceState::Uninitialized) {
            log::warn!("load requested but the scene was already loaded");
            return Ok(());
        }

        self.make_current();
        let scene = TriangleScene::load()?;
        self.state = SurfaceState::Loaded(scene);

        log::info!("scene loaded");
        Ok(())
    }

    /// Draws one frame and presents it.
    pub fn render_frame(&self) {
        // Drawing is valid only between load and unload.
        let SurfaceState::Loaded(scene) = &self.state else {
            return;
        };

        self.make_current();
        scene.draw();
        self.gl
            .surface
            .swap_buffers(&self.gl.ctx)
            .expect("Could not swap buffers");
    }

    /// Releases the scene's GPU objects, moving the surface to the unloaded
    /// state.
    ///
    /// The state machine makes the release run at most once; a request with
    /// no loaded scene is flagged and ignored.
    pub(super) fn unload(&mut self) {
        match self.state.take_scene() {
            Some(scene) => {
                self.make_current();
                scene.unload();
                log::info!("scene unloaded");
            }
            None => log::debug!("unload requested but no scene is loaded"),
        }
    }

    /// Requests the window to be redrawn.
    pub(super) fn request_redraw(&self) {
        self.raw.request_redraw();
    }

    /// Resizes the GL surface to the new window size.
    ///
    /// Only the surface tracks the new size; the viewport stays as set up at
    /// load time.
    pub(super) fn resize(&self, new_size: PhysicalSize<u32>) {
        let PhysicalSize { width, height } = new_size;
        self.gl
            .surface
            .resize(&self.gl.ctx, u32_to_nonzero(width), u32_to_nonzero(height));
    }

    /// Makes the window's OpenGL context current. Should be called before
    /// any GL call that targets this surface.
    fn make_current(&self) {
        self.gl
            .ctx
            .make_current(&self.gl.surface)
            .expect("Could not make OpenGL context current");
    }

    /// Default attributes for the render window.
    pub(super) fn default_attrs() -> WindowAttributes {
        WindowAttributes::default()
            .with_title("OpenTK Window")
            .with_inner_size(PhysicalSize::new(800, 450))
    }
}

impl Drop for RenderSurface {
    fn drop(&mut self) {
        self.unload();
    }
}

impl OpenGL {
    fn new(config: &Config, raw_window: &RawWindow) -> Self {
        #[allow(deprecated)]
        let raw_window_handle = raw_window
            .raw_window_handle()
            .expect("Failed to retrieve RawWindowHandle");

        // The shaders are written against GLSL 330 core, so nothing older
        // (and no GLES profile) can back the surface.
        let not_current_ctx = unsafe {
            let attrs = ContextAttributesBuilder::new()
                .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
                .with_profile(GlProfile::Core)
                .build(Some(raw_window_handle));
            config
                .display()
                .create_context(config, &attrs)
                .expect("Failed to create OpenGL 3.3 core context")
        };

        let PhysicalSize { width, height } = raw_window.inner_size();

        let surface = unsafe {
            let attrs = SurfaceAttributesBuilder::<WindowSurface>::new().build(
                raw_window_handle,
                u32_to_nonzero(width),
                u32_to_nonzero(height),
            );

            config
                .display()
                .create_window_surface(config, &attrs)
                .expect("Could not create OpenGL window surface")
        };

        let ctx = not_current_ctx
            .make_current(&surface)
            .expect("Could not make OpenGL context current");

        // Resolve the gl function pointers before the first gl:: call.
        gl::load_with(|addr| {
            let addr = CString::new(addr).unwrap();
            config.display().get_proc_address(&addr)
        });

        OpenGL { surface, ctx }
    }
}

mod helper {
    use std::num::NonZeroU32;

    /// Converts the `value` to a [`NonZeroU32`] if it's greater than 0,
    /// or returns [`NonZeroU32::MIN`] otherwise.
    pub fn u32_to_nonzero(value: u32) -> NonZeroU32 {
        NonZeroU32::new(value).unwrap_or(NonZeroU32::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::Size;

    // ── window attributes ───────────────────────────────────────────────────

    #[test]
    fn render_window_title_matches_the_sample() {
        let attrs = RenderSurface::default_attrs();
        assert_eq!(attrs.title, "OpenTK Window");
    }

    #[test]
    fn render_window_requests_an_800_by_450_pixel_client_area() {
        let attrs = RenderSurface::default_attrs();
        let expected: Size = PhysicalSize::new(800, 450).into();
        assert_eq!(attrs.inner_size, Some(expected));
    }

    // ── lifecycle state machine ─────────────────────────────────────────────

    #[test]
    fn take_scene_yields_the_scene_exactly_once() {
        let mut state = SurfaceState::Loaded(TriangleScene::stub());
        assert!(state.take_scene().is_some());
        assert!(matches!(state, SurfaceState::Unloaded));
        assert!(state.take_scene().is_none());
    }

    #[test]
    fn take_scene_before_load_skips_straight_to_unloaded() {
        let mut state = SurfaceState::Uninitialized;
        assert!(state.take_scene().is_none());
        assert!(matches!(state, SurfaceState::Unloaded));
    }
}
