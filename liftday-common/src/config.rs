//! Configuration loading
//!
//! Values resolve in priority order: command-line argument, environment
//! variable (both handled by clap in the binary), TOML config file,
//! compiled default.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Service configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listen port
    pub port: u16,
    /// Path to the SQLite database file
    pub database_path: PathBuf,
    /// Number of judge votes required to close an attempt
    pub judge_panel_size: u32,
    /// Maximum athletes per draw group (flight)
    pub max_group_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5730,
            database_path: PathBuf::from("liftday.db"),
            judge_panel_size: 3,
            max_group_size: 12,
        }
    }
}

/// Optional overrides read from a TOML file
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    port: Option<u16>,
    database_path: Option<PathBuf>,
    judge_panel_size: Option<u32>,
    max_group_size: Option<usize>,
}

impl Config {
    /// Load configuration, overlaying the TOML file (if given) on the
    /// compiled defaults.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(path) = config_file {
            let content = std::fs::read_to_string(path).map_err(|e| {
                Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
            })?;
            let file: ConfigFile = toml::from_str(&content)
                .map_err(|e| Error::Config(format!("Invalid config file: {}", e)))?;

            if let Some(port) = file.port {
                config.port = port;
            }
            if let Some(db) = file.database_path {
                config.database_path = db;
            }
            if let Some(panel) = file.judge_panel_size {
                config.judge_panel_size = panel;
            }
            if let Some(size) = file.max_group_size {
                config.max_group_size = size;
            }
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.judge_panel_size == 0 {
            return Err(Error::Config("judge_panel_size must be at least 1".into()));
        }
        if self.max_group_size == 0 {
            return Err(Error::Config("max_group_size must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.judge_panel_size, 3);
        assert_eq!(config.max_group_size, 12);
    }

    #[test]
    fn toml_overlay() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = 8080\njudge_panel_size = 5").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.judge_panel_size, 5);
        // untouched fields keep their defaults
        assert_eq!(config.max_group_size, 12);
    }

    #[test]
    fn zero_panel_size_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "judge_panel_size = 0").unwrap();

        assert!(Config::load(Some(file.path())).is_err());
    }
}
