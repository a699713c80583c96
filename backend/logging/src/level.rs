//! Output levels and the free-form level string translator.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};
use tracing::level_filters::LevelFilter;

/// Threshold for one sink. `Unused` means the sink is not created at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputLevel {
    #[default]
    Unused,
    Debug,
    Info,
    Warn,
    Error,
}

/// Synonyms per level, checked in this order. First family with a
/// substring hit wins.
const SYNONYMS: [(OutputLevel, &[&str]); 4] = [
    (OutputLevel::Debug, &["debug", "dbg"]),
    (OutputLevel::Info, &["information", "info"]),
    (OutputLevel::Warn, &["warning", "warn"]),
    (OutputLevel::Error, &["error", "err"]),
];

/// Normalize a free-form level string such as `" DBG "` or `"Warning"`.
///
/// Unrecognized input (including the empty string) yields
/// [`OutputLevel::Unused`], which disables the sink instead of falling back
/// to a verbose level.
pub fn translate(raw: &str) -> OutputLevel {
    let normalized = raw.trim().to_lowercase();
    SYNONYMS
        .iter()
        .find(|(_, words)| words.iter().any(|word| normalized.contains(*word)))
        .map(|(level, _)| *level)
        .unwrap_or(OutputLevel::Unused)
}

impl OutputLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unused => "",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn is_used(self) -> bool {
        self != Self::Unused
    }

    /// Per-sink filter for this threshold, `None` when no sink should exist.
    pub fn level_filter(self) -> Option<LevelFilter> {
        match self {
            Self::Unused => None,
            Self::Debug => Some(LevelFilter::DEBUG),
            Self::Info => Some(LevelFilter::INFO),
            Self::Warn => Some(LevelFilter::WARN),
            Self::Error => Some(LevelFilter::ERROR),
        }
    }

    /// Whether a sink filtered at `self` emits a record of severity `record`.
    pub fn admits(self, record: OutputLevel) -> bool {
        match (self.level_filter(), record.level_filter()) {
            (Some(threshold), Some(severity)) => severity <= threshold,
            _ => false,
        }
    }
}

impl fmt::Display for OutputLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for OutputLevel {
    fn from(raw: &str) -> Self {
        translate(raw)
    }
}

impl FromStr for OutputLevel {
    type Err = Infallible;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Ok(translate(raw))
    }
}

impl<'de> Deserialize<'de> for OutputLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(translate(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_synonyms() {
        let cases = [
            ("debug", OutputLevel::Debug),
            ("dbg", OutputLevel::Debug),
            ("info", OutputLevel::Info),
            ("information", OutputLevel::Info),
            ("warn", OutputLevel::Warn),
            ("warning", OutputLevel::Warn),
            ("error", OutputLevel::Error),
            ("err", OutputLevel::Error),
        ];
        for (raw, expected) in cases {
            assert_eq!(translate(raw), expected, "input {raw:?}");
        }
    }

    #[test]
    fn ignores_case_and_surrounding_whitespace() {
        assert_eq!(translate(" DeBuG "), OutputLevel::Debug);
        assert_eq!(translate("WARNING"), OutputLevel::Warn);
        assert_eq!(translate("\tErr\n"), OutputLevel::Error);
    }

    #[test]
    fn unrecognized_input_disables_the_sink() {
        for raw in ["", "   ", "trace", "verbose", "fatal", "off"] {
            assert_eq!(translate(raw), OutputLevel::Unused, "input {raw:?}");
        }
    }

    #[test]
    fn substring_match_follows_family_priority() {
        assert_eq!(translate("log-info"), OutputLevel::Info);
        assert_eq!(translate("debug-or-error"), OutputLevel::Debug);
        assert_eq!(translate("information-warning"), OutputLevel::Info);
        assert_eq!(translate("warn_err"), OutputLevel::Warn);
    }

    #[test]
    fn admits_records_at_or_above_threshold() {
        assert!(OutputLevel::Info.admits(OutputLevel::Info));
        assert!(OutputLevel::Info.admits(OutputLevel::Error));
        assert!(!OutputLevel::Info.admits(OutputLevel::Debug));
        assert!(OutputLevel::Debug.admits(OutputLevel::Warn));
        assert!(!OutputLevel::Error.admits(OutputLevel::Warn));
        assert!(!OutputLevel::Unused.admits(OutputLevel::Error));
        assert!(!OutputLevel::Debug.admits(OutputLevel::Unused));
    }

    #[test]
    fn maps_to_level_filters() {
        assert_eq!(OutputLevel::Unused.level_filter(), None);
        assert_eq!(OutputLevel::Warn.level_filter(), Some(LevelFilter::WARN));
        assert_eq!(OutputLevel::Error.to_string(), "error");
        assert_eq!("dbg".parse::<OutputLevel>(), Ok(OutputLevel::Debug));
    }
}
