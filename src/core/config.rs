use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// SQLite file holding registered credentials
    pub database_path: PathBuf,
    /// Connections kept open to the credential store while the gate runs
    pub max_connections: u32,
    /// Recorded landmark session played back by the frame loop
    pub recording_path: PathBuf,
    /// Where per-frame overlay annotations are written, if anywhere
    pub annotations_path: Option<PathBuf>,
    /// Pause between frames in milliseconds
    pub frame_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = Self::data_dir();

        Self {
            database_path: data_dir.join("database").join("credentials.db"),
            max_connections: 1,
            recording_path: data_dir.join("recordings").join("session.jsonl"),
            annotations_path: None,
            frame_interval_ms: 10,
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it with defaults if it doesn't exist
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Self::load_from(&Self::get_config_path()?)
    }

    /// Load configuration from `path`, creating it with defaults if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.database_path.as_os_str().is_empty() {
            return Err("Database path cannot be empty".into());
        }

        if self.max_connections == 0 || self.max_connections > 16 {
            return Err(format!(
                "Invalid max connections: {}. Must be between 1 and 16",
                self.max_connections
            )
            .into());
        }

        if self.recording_path.as_os_str().is_empty() {
            return Err("Recording path cannot be empty".into());
        }

        if self.frame_interval_ms > 1000 {
            return Err(format!(
                "Invalid frame interval: {}ms. Must be at most 1000ms",
                self.frame_interval_ms
            )
            .into());
        }

        Ok(())
    }

    /// Get the default configuration file path
    pub fn get_config_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| "Could not determine home directory")?;

        let mut path = PathBuf::from(home);
        path.push(".coil_data");
        path.push("config");
        path.push("settings.json");

        Ok(path)
    }

    fn data_dir() -> PathBuf {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string());

        PathBuf::from(home).join(".coil_data")
    }
}
