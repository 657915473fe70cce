//! Raytrace viewer
//!
//! Run with:
//!   cargo run --release
//!   cargo run --release -- --resolution-factor 1.0 --samples-per-pixel 16
//!
//! Set `RUST_LOG=debug` for per-frame diagnostics.

use raytrace_viewer::{app, ViewerConfig};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ViewerConfig::from_args();
    log::info!(
        "Starting {} at {}x{} ({:?})",
        config.title,
        config.width,
        config.height,
        config.render
    );

    if let Err(e) = app::run(config) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
