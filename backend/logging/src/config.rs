//! `[logger]` table of a TOML config file.
//!
//! ```toml
//! [logger]
//! log_level = "info"
//! console_level = "err"
//! log_path = "logs/app.log"
//! stacktrace = false
//! ```
//!
//! Level strings go through [`crate::translate`], so unknown or missing
//! levels disable the corresponding sink.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{LoggerError, Result};
use crate::level::OutputLevel;
use crate::logger::{Logger, LoggerBuilder};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggerConfig {
    #[serde(default)]
    pub log_level: OutputLevel,
    #[serde(default)]
    pub console_level: OutputLevel,
    pub log_path: PathBuf,
    #[serde(default)]
    pub name: Option<String>,
    /// Attach backtraces to error records.
    #[serde(default)]
    pub stacktrace: bool,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    logger: LoggerConfig,
}

impl LoggerConfig {
    pub fn from_toml_str(raw: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str::<ConfigFile>(raw).map(|file| file.logger)
    }

    /// Read the `[logger]` table from the TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|source| LoggerError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&raw).map_err(|source| LoggerError::ParseConfig {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(config)
    }

    pub fn builder(&self) -> LoggerBuilder {
        let builder = Logger::builder(&self.log_path)
            .file_level(self.log_level)
            .console_level(self.console_level)
            .stacktrace(self.stacktrace);
        match &self.name {
            Some(name) => builder.name(name.as_str()),
            None => builder,
        }
    }

    pub fn build(&self) -> Result<Logger> {
        self.builder().build()
    }
}
