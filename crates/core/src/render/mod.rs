//! WebGL2 rendering of the particle field.
//!
//! Only available with the `render` feature.
//!
//! - [`shader`] -- shader compilation, linking, and error formatting.
//! - [`points`] -- the point-cloud program and its attribute buffers.

pub mod points;
pub mod shader;

pub use points::{PointCloudRenderer, POINT_FRAGMENT_SHADER, POINT_VERTEX_SHADER};
pub use shader::{compile_program, compile_shader, format_shader_error, ShaderError};
