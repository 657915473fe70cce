//! Command line arguments.
//!
//! Uses clap for CLI parsing with help text (`--help`) and validation of
//! the render settings.

use std::path::PathBuf;

use clap::Parser;

use crate::engine::{RenderSettings, RESOLUTION_FACTOR_RANGE};
use crate::ViewerConfig;

/// Raytrace viewer arguments.
#[derive(Parser, Debug)]
#[command(
    name = "raytrace-viewer",
    about = "Interactive raytraced sphere scene viewer",
    long_about = "Flies a camera through a scene of spheres rendered by a GPU raytracer.\n\n\
        CONTROLS:\n\
          Enter          toggle play mode (pointer captured)\n\
          Escape         back to edit mode\n\
          W/A/S/D        move (play mode)\n\
          Space / LCtrl  up / down (play mode)\n\
          Mouse, wheel   look around, zoom (play mode)\n\
          F              toggle fullscreen\n\
          F5             reload shaders from --shader-dir\n\
        \n\
        EXAMPLES:\n\
          # Sharper image, fewer samples\n\
          ./raytrace-viewer --resolution-factor 1.0 --samples-per-pixel 8\n\
        \n\
          # Reproducible random preset and a quick smoke run\n\
          ./raytrace-viewer --seed 7 --max-frames 10",
    version
)]
pub struct ClapArgs {
    /// Initial window width in pixels.
    #[arg(long, default_value = "1280")]
    pub width: u32,

    /// Initial window height in pixels.
    #[arg(long, default_value = "800")]
    pub height: u32,

    /// Run in borderless fullscreen mode.
    #[arg(long)]
    pub fullscreen: bool,

    /// Disable vertical sync (may cause tearing).
    #[arg(long)]
    pub no_vsync: bool,

    /// Maximum bounces per ray.
    #[arg(long, default_value = "20", value_parser = clap::value_parser!(u32).range(1..=128))]
    pub light_bounces: u32,

    /// Rays traced per pixel.
    #[arg(long, default_value = "64", value_parser = clap::value_parser!(u32).range(1..=256))]
    pub samples_per_pixel: u32,

    /// Offscreen render size relative to the window (0.1 to 1.0).
    #[arg(long, default_value = "0.5", value_parser = parse_resolution_factor)]
    pub resolution_factor: f32,

    /// Start with the controls window hidden.
    #[arg(long)]
    pub hide_tooltip: bool,

    /// Seed for the random preset; random when omitted.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Load raytracing.wgsl and composite.wgsl from this directory instead
    /// of the built-in shaders.
    #[arg(long)]
    pub shader_dir: Option<PathBuf>,

    /// Exit after rendering N frames (useful for testing).
    #[arg(long)]
    pub max_frames: Option<u64>,
}

fn parse_resolution_factor(value: &str) -> Result<f32, String> {
    let factor: f32 = value
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    if RESOLUTION_FACTOR_RANGE.contains(&factor) {
        Ok(factor)
    } else {
        Err(format!(
            "must be between {} and {}",
            RESOLUTION_FACTOR_RANGE.start(),
            RESOLUTION_FACTOR_RANGE.end()
        ))
    }
}

impl From<ClapArgs> for ViewerConfig {
    fn from(args: ClapArgs) -> Self {
        Self {
            width: args.width,
            height: args.height,
            fullscreen: args.fullscreen,
            vsync: !args.no_vsync,
            render: RenderSettings {
                light_bounces: args.light_bounces,
                samples_per_pixel: args.samples_per_pixel,
                resolution_factor: args.resolution_factor,
            },
            show_tooltip: !args.hide_tooltip,
            seed: args.seed,
            shader_dir: args.shader_dir,
            max_frames: args.max_frames,
            ..Default::default()
        }
    }
}

impl ViewerConfig {
    /// Parse the process command line
    pub fn from_args() -> Self {
        ClapArgs::parse().into()
    }
}
