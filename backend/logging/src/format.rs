//! Record encoders for the two sinks.
//!
//! Both sinks see the same logical record: time, level, optional logger
//! name, caller, message, optional stacktrace and at most one attached field.
//! The file sink writes it as one JSON object per line, the console sink as a
//! tab-separated line.

use std::fmt::{self, Write as _};
use std::panic::Location;

use chrono::{DateTime, Local};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

const TIME_KEY: &str = "time";
const LEVEL_KEY: &str = "level";
const NAME_KEY: &str = "name";
const CALLER_KEY: &str = "caller";
const MESSAGE_KEY: &str = "msg";
const STACKTRACE_KEY: &str = "stacktrace";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Encoding {
    Json,
    Console,
}

/// `FormatEvent` used by both sink layers.
#[derive(Debug, Clone)]
pub(crate) struct RecordFormat {
    encoding: Encoding,
    name: Option<String>,
}

impl RecordFormat {
    pub(crate) fn json(name: Option<String>) -> Self {
        Self {
            encoding: Encoding::Json,
            name,
        }
    }

    pub(crate) fn console(name: Option<String>) -> Self {
        Self {
            encoding: Encoding::Console,
            name,
        }
    }
}

impl<S, N> FormatEvent<S, N> for RecordFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut fields = RecordFields::default();
        event.record(&mut fields);
        let record = fields.record(
            Local::now(),
            level_name(event.metadata().level()),
            self.name.as_deref(),
        );

        match self.encoding {
            Encoding::Json => {
                let line = serde_json::to_string(&record).map_err(|_| fmt::Error)?;
                writeln!(writer, "{line}")
            }
            Encoding::Console => writeln!(writer, "{}", record.to_console()),
        }
    }
}

fn level_name(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "error",
        Level::WARN => "warn",
        Level::INFO => "info",
        Level::DEBUG => "debug",
        _ => "trace",
    }
}

/// `parent/file.rs:line`, the last directory plus file name of a call site.
pub(crate) fn short_caller(location: &Location<'_>) -> String {
    let file = location.file();
    let mut cut = file.rmatch_indices(['/', '\\']).map(|(index, _)| index);
    let short = match (cut.next(), cut.next()) {
        (Some(_), Some(start)) => &file[start + 1..],
        _ => file,
    };
    format!("{short}:{}", location.line())
}

/// Fields the facade attaches to every event it emits.
#[derive(Debug, Default)]
struct RecordFields {
    message: String,
    caller: Option<String>,
    attached_key: Option<String>,
    attached_value: Option<String>,
    stacktrace: Option<String>,
}

impl RecordFields {
    fn record<'a>(
        &'a self,
        time: DateTime<Local>,
        level: &'static str,
        name: Option<&'a str>,
    ) -> Record<'a> {
        // `attached_value` is always JSON text written by `Logger`.
        let field = self
            .attached_value
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
            .map(|value| (self.attached_key.as_deref().unwrap_or(""), value));
        Record {
            time,
            level,
            name,
            caller: self.caller.as_deref(),
            message: &self.message,
            stacktrace: self.stacktrace.as_deref(),
            field,
        }
    }
}

impl Visit for RecordFields {
    fn record_str(&mut self, field: &Field, value: &str) {
        let slot = match field.name() {
            "message" => {
                self.message = value.to_owned();
                return;
            }
            "caller" => &mut self.caller,
            "attached_key" => &mut self.attached_key,
            "attached_value" => &mut self.attached_value,
            "stacktrace" => &mut self.stacktrace,
            _ => return,
        };
        *slot = Some(value.to_owned());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record_str(field, &format!("{value:?}"));
    }
}

/// One log record as seen by the encoders.
#[derive(Debug)]
pub(crate) struct Record<'a> {
    pub time: DateTime<Local>,
    pub level: &'static str,
    pub name: Option<&'a str>,
    pub caller: Option<&'a str>,
    pub message: &'a str,
    pub stacktrace: Option<&'a str>,
    pub field: Option<(&'a str, Value)>,
}

impl Record<'_> {
    pub(crate) fn to_console(&self) -> String {
        let mut line = format!("{}\t{}", self.time.format(TIME_FORMAT), self.level);
        for part in [self.name, self.caller].into_iter().flatten() {
            line.push('\t');
            line.push_str(part);
        }
        line.push('\t');
        line.push_str(self.message);
        if let Some((key, value)) = &self.field {
            let mut object = Map::new();
            object.insert((*key).to_owned(), value.clone());
            let _ = write!(line, "\t{}", Value::Object(object));
        }
        if let Some(stacktrace) = self.stacktrace {
            line.push('\n');
            line.push_str(stacktrace.trim_end());
        }
        line
    }
}

// Hand-written so the key order is fixed and an attached key that collides
// with a fixed key is written twice rather than overwriting it.
impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(TIME_KEY, &self.time.format(TIME_FORMAT).to_string())?;
        map.serialize_entry(LEVEL_KEY, self.level)?;
        if let Some(name) = self.name {
            map.serialize_entry(NAME_KEY, name)?;
        }
        if let Some(caller) = self.caller {
            map.serialize_entry(CALLER_KEY, caller)?;
        }
        map.serialize_entry(MESSAGE_KEY, self.message)?;
        if let Some(stacktrace) = self.stacktrace {
            map.serialize_entry(STACKTRACE_KEY, stacktrace)?;
        }
        if let Some((key, value)) = &self.field {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
