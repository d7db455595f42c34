//! Configuration management for the phorm system.
//!
//! Handles loading and saving `.phorm/config.yaml`, discovering `.phorm/`
//! directories in the filesystem, and turning configured lookup tables
//! into a lookup provider for the engine.

pub mod config;
pub mod phorm_dir;

pub use config::{ConfigError, PhormConfig, load_config, save_config};
pub use phorm_dir::{ensure_phorm_dir, find_phorm_dir, find_phorm_dir_or_error};
