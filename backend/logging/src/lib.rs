//! File + console structured logging built on `tracing`.
//!
//! A [`Logger`] writes JSON records to a log file and human-readable records
//! to stdout, each side filtered at its own [`OutputLevel`]. Levels come from
//! free-form strings through [`translate`], optionally read from a TOML
//! `[logger]` table with [`LoggerConfig`].
//!
//! ```no_run
//! use serde_json::json;
//! use teelog::{Logger, translate};
//!
//! let logger = Logger::new("logs/app.log", translate("info"), translate("err"))?;
//! logger.info("started", Some(json!(8080)), &["port"]);
//! logger.close()?;
//! # Ok::<(), teelog::LoggerError>(())
//! ```

pub mod attach;
pub mod config;
pub mod error;
mod format;
pub mod level;
pub mod logger;
mod sink;

pub use attach::{error_chain, to_value};
pub use config::LoggerConfig;
pub use error::{LoggerError, Result};
pub use level::{OutputLevel, translate};
pub use logger::{Logger, LoggerBuilder};
