//! Headless driver for the orrery scene.
//!
//! Loads configuration, sets up logging, and runs the scene without a
//! window: a few seconds of free orbiting and one full lock/unlock cycle.
//! The embedding host that owns a real surface drives [`SceneContext`] the
//! same way, with `init_gpu` and per-frame `GpuFrame`s added.

use clap::Parser;

use orrery_app::SceneContext;
use orrery_config::{CliArgs, Config};

fn main() {
    let args = CliArgs::parse();

    let config_dir = args.config.clone().or_else(Config::default_dir);
    let mut config = match &config_dir {
        Some(dir) => match Config::load_or_create(dir) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config: {e}");
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };
    config.apply_cli_overrides(&args);

    orrery_log::init_logging(None, cfg!(debug_assertions), Some(&config));

    let mut context = match SceneContext::new(&config) {
        Ok(context) => context,
        Err(e) => {
            eprintln!("Failed to build the scene: {e}");
            std::process::exit(1);
        }
    };

    let frame_time = 1.0 / 60.0;
    for frame in 0..600u32 {
        let now = frame as f64 * frame_time;
        context.update(now);
        if let Err(e) = context.render(None) {
            eprintln!("Frame {frame} failed: {e}");
            std::process::exit(1);
        }
        match frame {
            120 => context.select(1),
            420 => context.select(-1),
            _ => {}
        }
    }

    tracing::info!(zoomed = context.is_zoomed(), "headless run complete");
}
