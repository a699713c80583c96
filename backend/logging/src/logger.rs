//! Two-sink logger.
//!
//! Wraps `tracing` with a private registry holding up to two `fmt` layers:
//! a JSON layer writing to the log file and a human-readable layer writing to
//! stdout. Each layer carries its own `LevelFilter`, so the file and the
//! console can log at different thresholds. The registry is never installed
//! as the global subscriber; log calls enter it with a scoped dispatch.

use std::backtrace::Backtrace;
use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use serde_json::Value;
use tracing::Dispatch;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{Layer, Registry};

use crate::attach::{error_chain, to_value};
use crate::error::Result;
use crate::format::{RecordFormat, short_caller};
use crate::level::OutputLevel;
use crate::sink::LogFile;

type Sink = Box<dyn Layer<Registry> + Send + Sync + 'static>;

// `tracing` macros need the level at compile time.
macro_rules! emit {
    ($level:expr, $($arg:tt)+) => {
        match $level {
            OutputLevel::Debug => tracing::debug!($($arg)+),
            OutputLevel::Info => tracing::info!($($arg)+),
            OutputLevel::Warn => tracing::warn!($($arg)+),
            OutputLevel::Error => tracing::error!($($arg)+),
            OutputLevel::Unused => {}
        }
    };
}

/// Configures and opens a [`Logger`].
pub struct LoggerBuilder {
    path: PathBuf,
    file_level: OutputLevel,
    console_level: OutputLevel,
    name: Option<String>,
    console_writer: Option<BoxMakeWriter>,
    stacktrace: bool,
}

impl LoggerBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file_level: OutputLevel::Unused,
            console_level: OutputLevel::Unused,
            name: None,
            console_writer: None,
            stacktrace: false,
        }
    }

    pub fn file_level(mut self, level: OutputLevel) -> Self {
        self.file_level = level;
        self
    }

    pub fn console_level(mut self, level: OutputLevel) -> Self {
        self.console_level = level;
        self
    }

    /// Logger name written under the `name` key of every record.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attach a backtrace of the call site to error records. Off by default;
    /// capturing resolves symbols on every error call.
    pub fn stacktrace(mut self, enabled: bool) -> Self {
        self.stacktrace = enabled;
        self
    }

    /// Send console records somewhere other than stdout.
    pub fn console_writer<M>(mut self, writer: M) -> Self
    where
        M: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        self.console_writer = Some(BoxMakeWriter::new(writer));
        self
    }

    /// Open the log file and wire the sinks.
    ///
    /// The file is created (with any missing parent directories) even when
    /// the file level is [`OutputLevel::Unused`].
    pub fn build(self) -> Result<Logger> {
        let file = LogFile::open(&self.path)?;

        let mut sinks: Vec<Sink> = Vec::with_capacity(2);
        if let Some(filter) = self.file_level.level_filter() {
            sinks.push(
                tracing_subscriber::fmt::layer()
                    .event_format(RecordFormat::json(self.name.clone()))
                    .with_writer(file.clone())
                    .with_ansi(false)
                    .with_filter(filter)
                    .boxed(),
            );
        }
        if let Some(filter) = self.console_level.level_filter() {
            let writer = self
                .console_writer
                .unwrap_or_else(|| BoxMakeWriter::new(io::stdout));
            sinks.push(
                tracing_subscriber::fmt::layer()
                    .event_format(RecordFormat::console(self.name.clone()))
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_filter(filter)
                    .boxed(),
            );
        }

        let dispatch = Dispatch::new(tracing_subscriber::registry().with(sinks));

        Ok(Logger {
            path: self.path,
            file_level: self.file_level,
            console_level: self.console_level,
            stacktrace: self.stacktrace,
            dispatch,
            file,
            close_lock: Mutex::new(()),
        })
    }
}

/// File + console logger. Call [`Logger::close`] exactly once at shutdown.
pub struct Logger {
    path: PathBuf,
    file_level: OutputLevel,
    console_level: OutputLevel,
    stacktrace: bool,
    dispatch: Dispatch,
    file: LogFile,
    close_lock: Mutex<()>,
}

impl Logger {
    /// Open `path` for appending and log to it at `file_level` and to stdout
    /// at `console_level`. [`OutputLevel::Unused`] leaves that sink out.
    pub fn new(
        path: impl Into<PathBuf>,
        file_level: OutputLevel,
        console_level: OutputLevel,
    ) -> Result<Self> {
        LoggerBuilder::new(path)
            .file_level(file_level)
            .console_level(console_level)
            .build()
    }

    pub fn builder(path: impl Into<PathBuf>) -> LoggerBuilder {
        LoggerBuilder::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_level(&self) -> OutputLevel {
        self.file_level
    }

    pub fn console_level(&self) -> OutputLevel {
        self.console_level
    }

    /// Whether at least one sink would write a record at `level`.
    pub fn enabled(&self, level: OutputLevel) -> bool {
        self.file_level.admits(level) || self.console_level.admits(level)
    }

    /// Log `message`, attaching `value` under `keys[0]` (or `""` when no key
    /// is given). Keys after the first are ignored; the slice form is kept
    /// for call-site compatibility with the original variadic API.
    #[track_caller]
    pub fn log(&self, level: OutputLevel, message: &str, value: Option<Value>, keys: &[&str]) {
        self.emit(level, message, value, keys, Location::caller());
    }

    #[track_caller]
    pub fn debug(&self, message: &str, value: Option<Value>, keys: &[&str]) {
        self.emit(OutputLevel::Debug, message, value, keys, Location::caller());
    }

    #[track_caller]
    pub fn info(&self, message: &str, value: Option<Value>, keys: &[&str]) {
        self.emit(OutputLevel::Info, message, value, keys, Location::caller());
    }

    #[track_caller]
    pub fn warn(&self, message: &str, value: Option<Value>, keys: &[&str]) {
        self.emit(OutputLevel::Warn, message, value, keys, Location::caller());
    }

    #[track_caller]
    pub fn error(&self, message: &str, value: Option<Value>, keys: &[&str]) {
        self.emit(OutputLevel::Error, message, value, keys, Location::caller());
    }

    /// Like [`Logger::log`], serializing any `Serialize` value.
    #[track_caller]
    pub fn log_value<T>(&self, level: OutputLevel, message: &str, value: &T, keys: &[&str])
    where
        T: Serialize + ?Sized,
    {
        if self.enabled(level) {
            self.emit(level, message, Some(to_value(value)), keys, Location::caller());
        }
    }

    /// Like [`Logger::log`], attaching `err` with its `source()` chain.
    #[track_caller]
    pub fn log_error(
        &self,
        level: OutputLevel,
        message: &str,
        err: &(dyn StdError + 'static),
        keys: &[&str],
    ) {
        if self.enabled(level) {
            self.emit(level, message, Some(error_chain(err)), keys, Location::caller());
        }
    }

    /// Flush and release the log file.
    ///
    /// A failed sync is only logged. A failed final flush is returned as
    /// [`LoggerError::Close`](crate::LoggerError::Close), and a second call
    /// returns [`LoggerError::AlreadyClosed`](crate::LoggerError::AlreadyClosed).
    #[track_caller]
    pub fn close(&self) -> Result<()> {
        self.info("Close logger.", None, &[]);

        let _guard = self.close_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if self.file.is_open() {
            if let Err(err) = self.file.sync() {
                self.info(
                    "Log file can not be synchronized.",
                    Some(Value::String(err.to_string())),
                    &["error"],
                );
            }
        }
        self.file.close()
    }

    fn emit(
        &self,
        level: OutputLevel,
        message: &str,
        value: Option<Value>,
        keys: &[&str],
        location: &Location<'_>,
    ) {
        if !self.enabled(level) {
            return;
        }

        let caller = short_caller(location);
        let attached_key = value.as_ref().map(|_| keys.first().copied().unwrap_or(""));
        let attached_value = value.map(|value| value.to_string());
        let stacktrace = (self.stacktrace && level == OutputLevel::Error)
            .then(|| Backtrace::force_capture().to_string());

        tracing::dispatcher::with_default(&self.dispatch, || {
            emit!(
                level,
                caller = caller.as_str(),
                attached_key = attached_key,
                attached_value = attached_value.as_deref(),
                stacktrace = stacktrace.as_deref(),
                "{}",
                message
            )
        });
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("path", &self.path)
            .field("file_level", &self.file_level)
            .field("console_level", &self.console_level)
            .field("stacktrace", &self.stacktrace)
            .field("open", &self.file.is_open())
            .finish()
    }
}
