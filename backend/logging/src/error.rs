use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building, configuring or closing a [`crate::Logger`].
///
/// Log calls themselves never fail; everything here comes from construction,
/// config loading or [`crate::Logger::close`].
#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("log directory can not be created at '{}': {source}", .path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("log file can not be opened at '{}': {source}", .path.display())]
    Open { path: PathBuf, source: io::Error },

    #[error("log file can not be closed: {0}")]
    Close(#[source] io::Error),

    #[error("log file is already closed")]
    AlreadyClosed,

    #[error("logger config can not be read from '{}': {source}", .path.display())]
    ReadConfig { path: PathBuf, source: io::Error },

    #[error("logger config at '{}' is invalid: {source}", .path.display())]
    ParseConfig {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl LoggerError {
    /// Setup and shutdown failures after which logging can not continue
    /// meaningfully. Applications usually terminate on these.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::CreateDir { .. } | Self::Open { .. } | Self::Close(_) | Self::AlreadyClosed
        )
    }
}

pub type Result<T> = std::result::Result<T, LoggerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_and_shutdown_errors_are_fatal() {
        let open = LoggerError::Open {
            path: PathBuf::from("/nope/out.log"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert!(open.is_fatal());
        assert!(open.to_string().contains("/nope/out.log"));
        assert!(LoggerError::AlreadyClosed.is_fatal());
        assert!(LoggerError::Close(io::Error::other("disk gone")).is_fatal());
    }

    #[test]
    fn config_errors_are_not_fatal() {
        let err = LoggerError::ReadConfig {
            path: PathBuf::from("config.toml"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("config.toml"));
    }
}
