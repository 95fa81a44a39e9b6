//! Configuration management for pushfolder.
//!
//! This crate defines [`PublishConfig`](config::PublishConfig), the set of
//! knobs shared by both publishing paths, and loads it from defaults, an
//! optional YAML file and `PUSHFOLDER_*` environment variables.

pub mod config;

pub use config::{ConfigError, GitConfig, PublishConfig, load_config, load_config_file, save_config};
