use std::path::PathBuf;

use clap::{command, Parser};

use crate::core::config::Config;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Where to load settings from (defaults to ~/.coil_data/config/settings.json)
    #[arg(long = "config")]
    pub config_path: Option<PathBuf>,

    /// Recorded landmark session to play back, overriding the configured one
    #[arg(long = "recording")]
    pub recording_path: Option<PathBuf>,

    /// Write per-frame overlay annotations as JSON lines to this file
    #[arg(long = "annotations")]
    pub annotations_path: Option<PathBuf>,

    /// Credential database, overriding the configured one
    #[arg(long = "database")]
    pub database_path: Option<PathBuf>,

    #[arg(long = "loglevel", default_value_t = String::from("info"))]
    pub log_level: String,
}

impl Cli {
    /// Command line flags take precedence over the settings file
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(path) = &self.recording_path {
            config.recording_path = path.clone();
        }
        if let Some(path) = &self.annotations_path {
            config.annotations_path = Some(path.clone());
        }
        if let Some(path) = &self.database_path {
            config.database_path = path.clone();
        }
    }
}
