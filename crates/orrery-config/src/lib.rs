//! Configuration for the orrery background scene.
//!
//! Runtime-configurable settings persisted to disk as RON, with CLI
//! overrides via clap and forward/backward compatible serialization.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{BloomConfig, Config, DebugConfig, SceneConfig, WindowConfig};
pub use error::ConfigError;
