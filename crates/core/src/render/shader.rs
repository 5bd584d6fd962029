//! Shader compilation and linking for the point-cloud program.
//!
//! The compile/link functions need a live `glow::Context`; error
//! formatting is plain string work and is tested without a GPU.

use thiserror::Error;

/// Errors raised while creating GPU resources for the portrait.
#[derive(Debug, Clone, Error)]
pub enum ShaderError {
    /// A shader stage failed to compile.
    #[error("shader compile error ({stage}):\n{log}")]
    CompileError { stage: String, log: String },
    /// The program failed to link.
    #[error("shader link error:\n{0}")]
    LinkError(String),
    /// A buffer or vertex array could not be allocated.
    #[error("GPU resource error: {0}")]
    Resource(String),
}

/// Prefixes every source line with a right-aligned line number and
/// appends the driver log, so log line references can be matched up.
pub fn format_shader_error(source: &str, log: &str) -> String {
    let lines: Vec<&str> = source.lines().collect();
    let width = lines.len().max(1).to_string().len();
    let numbered = lines
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{:>width$}: {line}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");

    match (numbered.is_empty(), log.is_empty()) {
        (true, _) => log.to_string(),
        (false, true) => numbered,
        (false, false) => format!("{numbered}\n\n{log}"),
    }
}

fn stage_name(shader_type: u32) -> &'static str {
    match shader_type {
        glow::VERTEX_SHADER => "vertex",
        glow::FRAGMENT_SHADER => "fragment",
        _ => "unknown",
    }
}

/// Compiles one shader stage, deleting it again on failure.
#[allow(unsafe_code)]
pub fn compile_shader(
    gl: &glow::Context,
    shader_type: u32,
    source: &str,
) -> Result<glow::Shader, ShaderError> {
    use glow::HasContext;

    let stage = stage_name(shader_type);
    // SAFETY: valid stage constant and source; the handle is deleted on
    // the failure path below.
    let shader = unsafe {
        gl.create_shader(shader_type)
            .map_err(|log| ShaderError::CompileError {
                stage: stage.to_string(),
                log,
            })?
    };
    let compiled = unsafe {
        gl.shader_source(shader, source);
        gl.compile_shader(shader);
        gl.get_shader_compile_status(shader)
    };
    if compiled {
        return Ok(shader);
    }
    let log = unsafe {
        let log = gl.get_shader_info_log(shader);
        gl.delete_shader(shader);
        log
    };
    Err(ShaderError::CompileError {
        stage: stage.to_string(),
        log: format_shader_error(source, &log),
    })
}

/// Compiles both stages and links them; stage handles are always released.
#[allow(unsafe_code)]
pub fn compile_program(
    gl: &glow::Context,
    vertex_src: &str,
    fragment_src: &str,
) -> Result<glow::Program, ShaderError> {
    use glow::HasContext;

    let vert = compile_shader(gl, glow::VERTEX_SHADER, vertex_src)?;
    let frag = match compile_shader(gl, glow::FRAGMENT_SHADER, fragment_src) {
        Ok(f) => f,
        Err(e) => {
            // SAFETY: vert came from a successful compile_shader call.
            unsafe { gl.delete_shader(vert) };
            return Err(e);
        }
    };

    // SAFETY: both handles are valid; the program keeps its own copies,
    // so detaching and deleting them after linking is correct.
    let linked = unsafe {
        match gl.create_program() {
            Ok(program) => {
                gl.attach_shader(program, vert);
                gl.attach_shader(program, frag);
                gl.link_program(program);
                gl.detach_shader(program, vert);
                gl.detach_shader(program, frag);
                if gl.get_program_link_status(program) {
                    Ok(program)
                } else {
                    let log = gl.get_program_info_log(program);
                    gl.delete_program(program);
                    Err(ShaderError::LinkError(log))
                }
            }
            Err(e) => Err(ShaderError::LinkError(e)),
        }
    };
    unsafe {
        gl.delete_shader(vert);
        gl.delete_shader(frag);
    }
    linked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_numbers_lines_and_appends_log() {
        let formatted = format_shader_error("#version 300 es\nvoid main() {\n}", "ERROR: 0:2");
        assert!(formatted.contains("1: #version 300 es"), "{formatted}");
        assert!(formatted.contains("3: }"), "{formatted}");
        assert!(formatted.ends_with("ERROR: 0:2"), "{formatted}");
    }

    #[test]
    fn format_right_aligns_line_numbers() {
        let source = (1..=12)
            .map(|i| format!("line {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let formatted = format_shader_error(&source, "");
        let lines: Vec<&str> = formatted.lines().collect();
        assert!(lines[0].starts_with(" 1: "), "got '{}'", lines[0]);
        assert!(lines[11].starts_with("12: "), "got '{}'", lines[11]);
    }

    #[test]
    fn format_handles_empty_inputs() {
        assert_eq!(format_shader_error("", ""), "");
        assert_eq!(format_shader_error("", "log only"), "log only");
    }

    #[test]
    fn stage_names_cover_both_stages() {
        assert_eq!(stage_name(glow::VERTEX_SHADER), "vertex");
        assert_eq!(stage_name(glow::FRAGMENT_SHADER), "fragment");
        assert_eq!(stage_name(0), "unknown");
    }

    #[test]
    fn errors_display_their_details() {
        let compile = ShaderError::CompileError {
            stage: "fragment".into(),
            log: "undeclared identifier".into(),
        };
        assert!(compile.to_string().contains("fragment"));
        assert!(compile.to_string().contains("undeclared identifier"));
        assert!(ShaderError::Resource("no vao".into())
            .to_string()
            .contains("no vao"));
    }
}
