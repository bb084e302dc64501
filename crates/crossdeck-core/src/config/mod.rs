//! Configuration for crossdeck hosts
//!
//! This module provides the configuration infrastructure shared by every
//! host of the deck engine:
//!
//! - Generic YAML config loading/saving
//! - Default config file location
//! - The deck engine's own settings
//!
//! # Usage
//!
//! ```ignore
//! use crossdeck_core::config::{load_config, save_config, default_config_path, EngineConfig};
//!
//! let path = default_config_path("engine.yaml");
//! let config: EngineConfig = load_config(&path);
//!
//! save_config(&config, &path)?;
//! ```

mod engine;
mod io;
mod paths;

pub use engine::EngineConfig;
pub use io::{load_config, save_config};
pub use paths::{default_config_dir, default_config_path};
