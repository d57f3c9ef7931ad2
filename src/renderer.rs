//! The OpenGL scene - a single static triangle on a gray background.

use gl::types::{GLchar, GLenum, GLint, GLsizei, GLsizeiptr, GLuint};
use std::fmt;
use std::mem;
use std::ptr;

/// Color the framebuffer is cleared to before each draw: mid gray, opaque.
pub(crate) const CLEAR_COLOR: [f32; 4] = [0.5, 0.5, 0.5, 1.0];

/// Triangle vertex positions, three vertices of (x, y, z) each, already in
/// clip space.
#[rustfmt::skip]
pub(crate) const TRIANGLE_VERTICES: [f32; 9] = [
    -0.5, -0.5, 0.0, // bottom left
     0.5, -0.5, 0.0, // bottom right
     0.0,  0.5, 0.0, // top
];

/// Vertices submitted by the per-frame draw call.
const VERTEX_COUNT: GLsizei = 3;

const VERTEX_SHADER_SOURCE: &str = r"
#version 330 core
layout (location = 0) in vec3 aPosition;
void main()
{
    gl_Position = vec4(aPosition, 1.0);
}
";

const FRAGMENT_SHADER_SOURCE: &str = r"
#version 330 core
out vec4 FragColor;
void main()
{
    FragColor = vec4(1.0, 0.0, 0.0, 1.0);
}
";

/// The GPU objects backing the triangle.
///
/// Handles are valid from [`TriangleScene::load`] until
/// [`TriangleScene::unload`]; the surface's state machine keeps draw calls
/// inside that window.
pub(crate) struct TriangleScene {
    vbo: GLuint,
    vao: GLuint,
    program: GLuint,
}

impl TriangleScene {
    /// One-time setup: clear color, vertex upload, attribute layout, shader
    /// program, depth testing.
    ///
    /// The rendering context must be current on the calling thread.
    pub(crate) fn load() -> Result<Self, ShaderError> {
        unsafe {
            gl::ClearColor(
                CLEAR_COLOR[0],
                CLEAR_COLOR[1],
                CLEAR_COLOR[2],
                CLEAR_COLOR[3],
            );

            let mut vbo = 0;
            gl::GenBuffers(1, &mut vbo);
            gl::BindBuffer(gl::ARRAY_BUFFER, vbo);
            gl::BufferData(
                gl::ARRAY_BUFFER,
                mem::size_of_val(&TRIANGLE_VERTICES) as GLsizeiptr,
                TRIANGLE_VERTICES.as_ptr().cast(),
                gl::STATIC_DRAW,
            );

            let mut vao = 0;
            gl::GenVertexArrays(1, &mut vao);
            gl::BindVertexArray(vao);

            // Attribute 0: three tightly packed floats per vertex.
            let stride = (3 * mem::size_of::<f32>()) as GLsizei;
            gl::VertexAttribPointer(0, 3, gl::FLOAT, gl::FALSE, stride, ptr::null());
            gl::EnableVertexAttribArray(0);

            let program = link_program()?;
            gl::UseProgram(program);

            gl::Enable(gl::DEPTH_TEST);

            Ok(TriangleScene { vbo, vao, program })
        }
    }

    /// Renders one frame: clear, then a single 3-vertex triangle-list draw.
    pub(crate) fn draw(&self) {
        unsafe {
            gl::Clear(gl::COLOR_BUFFER_BIT | gl::DEPTH_BUFFER_BIT);

            gl::UseProgram(self.program);
            gl::BindVertexArray(self.vao);

            gl::DrawArrays(gl::TRIANGLES, 0, VERTEX_COUNT);
        }
    }

    /// Releases the GPU objects: buffer, vertex array, then program.
    ///
    /// Consumes the scene, so a second release cannot be expressed.
    pub(crate) fn unload(self) {
        unsafe {
            gl::DeleteBuffers(1, &self.vbo);
            gl::DeleteVertexArrays(1, &self.vao);
            gl::DeleteProgram(self.program);
        }
    }

    #[cfg(test)]
    pub(crate) fn stub() -> Self {
        TriangleScene {
            vbo: 1,
            vao: 2,
            program: 3,
        }
    }
}

/// Compiles both shader stages and links them into a program.
///
/// Stage objects are deleted once the program owns their code, and on every
/// failure path.
fn link_program() -> Result<GLuint, ShaderError> {
    let vertex = compile_shader(
        "vertex shader compilation",
        gl::VERTEX_SHADER,
        VERTEX_SHADER_SOURCE,
    )?;
    let fragment = match compile_shader(
        "fragment shader compilation",
        gl::FRAGMENT_SHADER,
        FRAGMENT_SHADER_SOURCE,
    ) {
        Ok(shader) => shader,
        Err(e) => {
            unsafe { gl::DeleteShader(vertex) };
            return Err(e);
        }
    };

    unsafe {
        let program = gl::CreateProgram();
        gl::AttachShader(program, vertex);
        gl::AttachShader(program, fragment);
        gl::LinkProgram(program);

        // Linked programs keep their own copy of the stages.
        gl::DeleteShader(vertex);
        gl::DeleteShader(fragment);

        let mut status = 0;
        gl::GetProgramiv(program, gl::LINK_STATUS, &mut status);
        if status == GLint::from(gl::TRUE) {
            Ok(program)
        } else {
            let log = program_info_log(program);
            gl::DeleteProgram(program);
            Err(ShaderError::new("shader program link", log))
        }
    }
}

fn compile_shader(stage: &'static str, kind: GLenum, source: &str) -> Result<GLuint, ShaderError> {
    unsafe {
        let shader = gl::CreateShader(kind);
        let src = source.as_ptr().cast::<GLchar>();
        let len = source.len() as GLint;
        gl::ShaderSource(shader, 1, &src, &len);
        gl::CompileShader(shader);

        let mut status = 0;
        gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut status);
        if status == GLint::from(gl::TRUE) {
            Ok(shader)
        } else {
            let log = shader_info_log(shader);
            gl::DeleteShader(shader);
            Err(ShaderError::new(stage, log))
        }
    }
}

fn shader_info_log(shader: GLuint) -> String {
    let mut len: GLint = 0;
    unsafe { gl::GetShaderiv(shader, gl::INFO_LOG_LENGTH, &mut len) };
    if len <= 0 {
        return String::new();
    }

    let mut buf = vec![0u8; len as usize];
    let mut written: GLsizei = 0;
    unsafe { gl::GetShaderInfoLog(shader, len, &mut written, buf.as_mut_ptr().cast()) };
    buf.truncate(written.max(0) as usize);
    String::from_utf8_lossy(&buf).into_owned()
}

fn program_info_log(program: GLuint) -> String {
    let mut len: GLint = 0;
    unsafe { gl::GetProgramiv(program, gl::INFO_LOG_LENGTH, &mut len) };
    if len <= 0 {
        return String::new();
    }

    let mut buf = vec![0u8; len as usize];
    let mut written: GLsizei = 0;
    unsafe { gl::GetProgramInfoLog(program, len, &mut written, buf.as_mut_ptr().cast()) };
    buf.truncate(written.max(0) as usize);
    String::from_utf8_lossy(&buf).into_owned()
}

/// A shader compile or program link failure, carrying the driver's info log.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ShaderError {
    stage: &'static str,
    log: String,
}

impl ShaderError {
    fn new(stage: &'static str, log: String) -> Self {
        let log = if log.trim().is_empty() {
            "no info log from the driver".to_string()
        } else {
            log.trim_end().to_string()
        };
        ShaderError { stage, log }
    }
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.stage, self.log)
    }
}

impl std::error::Error for ShaderError {}

#[cfg(test)]
mod tests {
    use super::*;

    // ── fixed scene data ────────────────────────────────────────────────────

    #[test]
    fn triangle_is_three_clip_space_vertices() {
        assert_eq!(TRIANGLE_VERTICES.len(), 9);
        #[rustfmt::skip]
        let expected = [
            -0.5, -0.5, 0.0,
             0.5, -0.5, 0.0,
             0.0,  0.5, 0.0,
        ];
        assert_eq!(TRIANGLE_VERTICES, expected);
    }

    #[test]
    fn draw_call_covers_the_whole_vertex_buffer() {
        assert_eq!(TRIANGLE_VERTICES.len(), VERTEX_COUNT as usize * 3);
    }

    #[test]
    fn clear_color_is_opaque_mid_gray() {
        assert_eq!(CLEAR_COLOR, [0.5, 0.5, 0.5, 1.0]);
    }

    #[test]
    fn shader_sources_target_glsl_330_core() {
        assert!(VERTEX_SHADER_SOURCE.trim_start().starts_with("#version 330 core"));
        assert!(FRAGMENT_SHADER_SOURCE.trim_start().starts_with("#version 330 core"));
    }

    // ── failure reporting ───────────────────────────────────────────────────

    #[test]
    fn shader_error_display_names_the_stage() {
        let err = ShaderError::new(
            "vertex shader compilation",
            "0:3(1): error: syntax error\n".to_string(),
        );
        assert_eq!(
            err.to_string(),
            "vertex shader compilation failed: 0:3(1): error: syntax error"
        );
    }

    #[test]
    fn shader_error_display_survives_an_empty_driver_log() {
        let err = ShaderError::new("shader program link", String::new());
        assert_eq!(
            err.to_string(),
            "shader program link failed: no info log from the driver"
        );
    }
}
