//! WebGL2 point-cloud renderer for a [`ParticleField`].
//!
//! Colors and sizes are uploaded once. Positions live in a `DYNAMIC_DRAW`
//! buffer of fixed size that is overwritten with `bufferSubData` only on
//! frames where the field reports itself dirty.

use log::debug;

use super::shader::{compile_program, ShaderError};
use crate::camera::Camera;
use crate::particles::ParticleField;
use crate::sprite::POINT_SCALE;

const ATTR_POSITION: u32 = 0;
const ATTR_COLOR: u32 = 1;
const ATTR_SIZE: u32 = 2;

/// Vertex stage: perspective-attenuated point size.
pub const POINT_VERTEX_SHADER: &str = r#"#version 300 es
layout(location = 0) in vec3 a_position;
layout(location = 1) in vec3 a_color;
layout(location = 2) in float a_size;
uniform mat4 u_model_view;
uniform mat4 u_projection;
uniform float u_point_scale;
out vec3 v_color;
void main() {
    v_color = a_color;
    vec4 mv = u_model_view * vec4(a_position, 1.0);
    gl_PointSize = a_size * (u_point_scale / -mv.z);
    gl_Position = u_projection * mv;
}
"#;

/// Fragment stage: round sprite with quadratic falloff and glow gain.
pub const POINT_FRAGMENT_SHADER: &str = r#"#version 300 es
precision mediump float;
uniform float u_glow_intensity;
in vec3 v_color;
out vec4 frag_color;
void main() {
    vec2 center = gl_PointCoord - vec2(0.5);
    float dist = length(center);
    if (dist > 0.5) discard;
    float falloff = 1.0 - dist * 2.0;
    frag_color = vec4(v_color * u_glow_intensity, falloff * falloff);
}
"#;

/// Reinterprets `src` as native-endian bytes into `dst`, reusing its capacity.
pub fn write_f32_bytes(dst: &mut Vec<u8>, src: &[f32]) {
    dst.clear();
    dst.reserve(src.len() * 4);
    for v in src {
        dst.extend_from_slice(&v.to_ne_bytes());
    }
}

/// Creates the vertex array and the three attribute buffers, recording each
/// handle in `vao` / `buffers` as soon as it exists so the caller can
/// release them if a later step fails.
#[allow(unsafe_code)]
fn upload_attributes(
    gl: &glow::Context,
    field: &ParticleField,
    vao: &mut Option<glow::VertexArray>,
    buffers: &mut Vec<glow::Buffer>,
    scratch: &mut Vec<u8>,
) -> Result<(), ShaderError> {
    use glow::HasContext;

    let attributes: [(u32, i32, &[f32], u32); 3] = [
        (ATTR_POSITION, 3, field.positions(), glow::DYNAMIC_DRAW),
        (ATTR_COLOR, 3, field.colors(), glow::STATIC_DRAW),
        (ATTR_SIZE, 1, field.sizes(), glow::STATIC_DRAW),
    ];
    // SAFETY: every handle used below was created on this context in this
    // function; buffer sizes match the attribute layouts.
    unsafe {
        let array = gl.create_vertex_array().map_err(ShaderError::Resource)?;
        *vao = Some(array);
        gl.bind_vertex_array(Some(array));

        let result = attributes
            .into_iter()
            .try_for_each(|(index, components, data, usage)| {
                let buffer = gl.create_buffer().map_err(ShaderError::Resource)?;
                buffers.push(buffer);
                gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
                write_f32_bytes(scratch, data);
                gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, scratch.as_slice(), usage);
                gl.vertex_attrib_pointer_f32(index, components, glow::FLOAT, false, 0, 0);
                gl.enable_vertex_attrib_array(index);
                Ok(())
            });
        gl.bind_vertex_array(None);
        gl.bind_buffer(glow::ARRAY_BUFFER, None);
        result
    }
}

/// Deletes the handles of a renderer whose setup failed part way.
#[allow(unsafe_code)]
fn release_partial(
    gl: &glow::Context,
    program: glow::Program,
    vao: Option<glow::VertexArray>,
    buffers: &[glow::Buffer],
) {
    use glow::HasContext;

    // SAFETY: all handles were created on this context and are dropped by
    // the caller without further use.
    unsafe {
        for &buffer in buffers {
            gl.delete_buffer(buffer);
        }
        if let Some(vao) = vao {
            gl.delete_vertex_array(vao);
        }
        gl.delete_program(program);
    }
}

/// GPU resources for drawing one particle field.
pub struct PointCloudRenderer {
    program: glow::Program,
    vao: glow::VertexArray,
    buffers: [glow::Buffer; 3],
    count: i32,
    u_model_view: Option<glow::UniformLocation>,
    u_projection: Option<glow::UniformLocation>,
    u_point_scale: Option<glow::UniformLocation>,
    u_glow_intensity: Option<glow::UniformLocation>,
    scratch: Vec<u8>,
}

impl PointCloudRenderer {
    /// Compiles the point program and uploads the field's attributes.
    ///
    /// On failure every handle created so far is deleted again.
    #[allow(unsafe_code)]
    pub fn new(gl: &glow::Context, field: &ParticleField) -> Result<Self, ShaderError> {
        use glow::HasContext;

        let count = i32::try_from(field.len())
            .map_err(|_| ShaderError::Resource("too many particles".to_string()))?;
        let program = compile_program(gl, POINT_VERTEX_SHADER, POINT_FRAGMENT_SHADER)?;
        let mut scratch = Vec::new();
        let mut vao = None;
        let mut buffers = Vec::with_capacity(3);

        let uploaded = upload_attributes(gl, field, &mut vao, &mut buffers, &mut scratch);
        let vao = match (uploaded, vao) {
            (Ok(()), Some(vao)) if buffers.len() == 3 => vao,
            (result, vao) => {
                release_partial(gl, program, vao, &buffers);
                result?;
                return Err(ShaderError::Resource("incomplete attribute setup".to_string()));
            }
        };

        debug!("uploaded {count} particles to GPU");
        // SAFETY: program was linked on this context above.
        unsafe {
            Ok(Self {
                program,
                vao,
                buffers: [buffers[0], buffers[1], buffers[2]],
                count,
                u_model_view: gl.get_uniform_location(program, "u_model_view"),
                u_projection: gl.get_uniform_location(program, "u_projection"),
                u_point_scale: gl.get_uniform_location(program, "u_point_scale"),
                u_glow_intensity: gl.get_uniform_location(program, "u_glow_intensity"),
                scratch,
            })
        }
    }

    /// Draws the field, re-uploading positions first if they changed.
    ///
    /// Uses additive blending without depth writes.
    #[allow(unsafe_code)]
    pub fn draw(
        &mut self,
        gl: &glow::Context,
        field: &mut ParticleField,
        camera: &Camera,
        glow_intensity: f32,
    ) {
        use glow::HasContext;

        let model_view = camera.view() * field.model_matrix();
        // SAFETY: handles were created in new() on the same context; the
        // position upload writes exactly the bytes allocated there.
        unsafe {
            if field.take_dirty() {
                write_f32_bytes(&mut self.scratch, field.positions());
                gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.buffers[0]));
                gl.buffer_sub_data_u8_slice(glow::ARRAY_BUFFER, 0, &self.scratch);
                gl.bind_buffer(glow::ARRAY_BUFFER, None);
            }

            gl.use_program(Some(self.program));
            gl.uniform_matrix_4_f32_slice(
                self.u_model_view.as_ref(),
                false,
                &model_view.to_cols_array(),
            );
            gl.uniform_matrix_4_f32_slice(
                self.u_projection.as_ref(),
                false,
                &camera.projection().to_cols_array(),
            );
            gl.uniform_1_f32(self.u_point_scale.as_ref(), POINT_SCALE);
            gl.uniform_1_f32(self.u_glow_intensity.as_ref(), glow_intensity);

            gl.enable(glow::BLEND);
            gl.blend_func(glow::SRC_ALPHA, glow::ONE);
            gl.depth_mask(false);

            gl.bind_vertex_array(Some(self.vao));
            gl.draw_arrays(glow::POINTS, 0, self.count);
            gl.bind_vertex_array(None);

            gl.depth_mask(true);
        }
    }

    /// Releases all GPU resources.
    #[allow(unsafe_code)]
    pub fn destroy(self, gl: &glow::Context) {
        use glow::HasContext;

        // SAFETY: handles are owned by self and not used after this call.
        unsafe {
            for buffer in self.buffers {
                gl.delete_buffer(buffer);
            }
            gl.delete_vertex_array(self.vao);
            gl.delete_program(self.program);
        }
    }
}
