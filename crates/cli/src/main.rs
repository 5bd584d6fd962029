#![deny(unsafe_code)]
//! CLI for rendering particle portrait frames offline.
//!
//! Subcommands:
//! - `render <image>`: assemble the portrait to a given progress, write PNG
//! - `sweep <image>`: write a frame sequence from scattered to assembled
//! - `params`: print default parameters and their schema

mod error;

use clap::{Parser, Subcommand};
use error::CliError;
use log::info;
use portrait_core::scroll::section_top_for;
use portrait_core::{PortraitConfig, PortraitScene, SectionBounds, TargetSource, Viewport};
use portrait_snapshot::decode::load_raster;
use portrait_snapshot::snapshot::write_png;
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "portrait", about = "Particle portrait renderer")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

/// Arguments shared by the rendering subcommands.
#[derive(clap::Args)]
struct SceneArgs {
    /// Source image; if it cannot be loaded the fallback sphere is used.
    image: PathBuf,

    /// Output width in CSS pixels.
    #[arg(short = 'W', long, default_value_t = 512)]
    width: u32,

    /// Output height in CSS pixels.
    #[arg(short = 'H', long, default_value_t = 512)]
    height: u32,

    /// Device pixel ratio (capped at 2).
    #[arg(long, default_value_t = 1.0)]
    dpr: f32,

    /// Portrait parameters as a JSON string.
    #[arg(long, default_value = "{}")]
    params: String,
}

#[derive(Subcommand)]
enum Command {
    /// Render one frame at the given assembly progress.
    Render {
        #[command(flatten)]
        scene: SceneArgs,

        /// Assembly progress in [0, 1].
        #[arg(short, long, default_value_t = 1.0)]
        progress: f32,

        /// Output file path.
        #[arg(short, long, default_value = "portrait.png")]
        output: PathBuf,
    },
    /// Render evenly spaced frames from progress 0 to 1.
    Sweep {
        #[command(flatten)]
        scene: SceneArgs,

        /// Number of frames (at least 2).
        #[arg(short, long, default_value_t = 10)]
        frames: usize,

        /// Output directory; created if missing.
        #[arg(short, long, default_value = "frames")]
        output: PathBuf,
    },
    /// Print default parameters and their schema.
    Params,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// Builds a scene for `args` and performs the one-shot image load.
fn load_scene(args: &SceneArgs) -> Result<(PortraitScene, TargetSource), CliError> {
    let params: serde_json::Value = serde_json::from_str(&args.params)
        .map_err(|e| CliError::Input(format!("invalid --params JSON: {e}")))?;
    let config = PortraitConfig::from_json(&params);
    let viewport = Viewport::new(args.width as f32, args.height as f32, args.dpr)?;
    let mut scene = PortraitScene::new(config, viewport)?;
    let (w, h) = (scene.config().image_width, scene.config().image_height);
    let source = scene.load_image(load_raster(&args.image, w, h))?;
    Ok((scene, source))
}

/// Replays a scroll position that maps to `progress`, ticks once, and
/// writes the frame.
fn render_frame(
    scene: &mut PortraitScene,
    progress: f32,
    now_ms: f64,
    path: &Path,
) -> Result<(), CliError> {
    let vh = scene.camera().viewport().height;
    let top = section_top_for(progress, vh);
    scene.on_scroll(SectionBounds::new(top, top + vh), vh);
    scene.frame(now_ms);

    let glow = scene.config().glow_intensity;
    let camera = *scene.camera();
    let field = scene
        .field()
        .ok_or_else(|| CliError::Input("particle field was not initialized".into()))?;
    write_png(field, &camera, glow, path)?;
    info!("wrote {} at progress {progress:.3}", path.display());
    Ok(())
}

fn source_name(source: TargetSource) -> &'static str {
    match source {
        TargetSource::Image => "image",
        TargetSource::FallbackSphere => "fallback_sphere",
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Params => {
            let info = serde_json::json!({
                "defaults": PortraitConfig::default().to_json(),
                "schema": PortraitConfig::param_schema(),
            });
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                let defaults = PortraitConfig::default().to_json();
                let schema = PortraitConfig::param_schema();
                if let Some(map) = defaults.as_object() {
                    for (name, value) in map {
                        let desc = schema[name]["description"].as_str().unwrap_or_default();
                        println!("  {name:<16} {value:<8} {desc}");
                    }
                }
            }
        }
        Command::Render {
            scene: args,
            progress,
            output,
        } => {
            if !(0.0..=1.0).contains(&progress) {
                return Err(CliError::Input(format!(
                    "--progress must be within [0, 1], got {progress}"
                )));
            }
            let (mut scene, source) = load_scene(&args)?;
            render_frame(&mut scene, progress, 0.0, &output)?;

            if cli.json {
                let info = serde_json::json!({
                    "image": args.image.display().to_string(),
                    "source": source_name(source),
                    "particles": scene.config().particle_count,
                    "progress": progress,
                    "output": output.display().to_string(),
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                eprintln!(
                    "rendered {} particles ({}) at progress {progress} -> {}",
                    scene.config().particle_count,
                    source_name(source),
                    output.display()
                );
            }
        }
        Command::Sweep {
            scene: args,
            frames,
            output,
        } => {
            if frames < 2 {
                return Err(CliError::Input(format!(
                    "--frames must be at least 2, got {frames}"
                )));
            }
            std::fs::create_dir_all(&output)?;
            let (mut scene, source) = load_scene(&args)?;

            let mut written = Vec::with_capacity(frames);
            for k in 0..frames {
                let progress = k as f32 / (frames - 1) as f32;
                let path = output.join(format!("frame_{k:04}.png"));
                render_frame(&mut scene, progress, k as f64 * 16.0, &path)?;
                written.push(path.display().to_string());
            }

            if cli.json {
                let info = serde_json::json!({
                    "source": source_name(source),
                    "frames": written,
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                eprintln!(
                    "wrote {frames} frames ({}) -> {}",
                    source_name(source),
                    output.display()
                );
            }
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let json_mode = cli.json;
    if let Err(e) = run(cli) {
        if json_mode {
            let j = serde_json::json!({"error": e.to_string(), "exit_code": e.exit_code()});
            eprintln!("{}", serde_json::to_string_pretty(&j).unwrap_or_default());
        } else {
            eprintln!("error: {e}");
        }
        process::exit(e.exit_code());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(image: PathBuf, params: &str) -> SceneArgs {
        SceneArgs {
            image,
            width: 64,
            height: 48,
            dpr: 1.0,
            params: params.to_string(),
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn missing_image_uses_fallback_sphere() {
        let dir = tempfile::tempdir().unwrap();
        let a = args(dir.path().join("nope.jpeg"), r#"{"particle_count": 200}"#);
        let (scene, source) = load_scene(&a).unwrap();
        assert_eq!(source, TargetSource::FallbackSphere);
        assert_eq!(scene.field().unwrap().len(), 200);
    }

    #[test]
    fn bad_params_json_is_input_error() {
        let a = args(PathBuf::from("x.png"), "{oops");
        assert_eq!(load_scene(&a).unwrap_err().exit_code(), 12);
    }

    #[test]
    fn invalid_config_is_input_error() {
        let a = args(PathBuf::from("x.png"), r#"{"scatter_radius": -1}"#);
        assert_eq!(load_scene(&a).unwrap_err().exit_code(), 12);
    }

    #[test]
    fn render_frame_writes_png_at_full_progress() {
        let dir = tempfile::tempdir().unwrap();
        let a = args(dir.path().join("nope.jpeg"), r#"{"particle_count": 100}"#);
        let (mut scene, _) = load_scene(&a).unwrap();
        let out = dir.path().join("out.png");
        render_frame(&mut scene, 1.0, 0.0, &out).unwrap();
        assert!(out.exists());
        assert!((scene.progress() - 1.0).abs() < 1e-5);
        let f = scene.field().unwrap();
        for (a, b) in f.positions().iter().zip(f.target_positions()) {
            assert!((a - b).abs() < 1e-3);
        }
    }

    #[test]
    fn parse_render_subcommand() {
        let cli = Cli::try_parse_from([
            "portrait", "render", "me.jpeg", "--progress", "0.5", "-o", "a.png", "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Render {
                scene, progress, ..
            } => {
                assert_eq!(scene.image, PathBuf::from("me.jpeg"));
                assert_eq!(progress, 0.5);
            }
            _ => panic!("expected render"),
        }
    }
}
