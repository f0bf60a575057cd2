//! Log configuration for embedding drivers.
//!
//! The library only emits `tracing` events; it never installs a
//! subscriber. This module parses the `SABLE_SEMA_LOG` spec a driver can
//! forward into its subscriber: a default level plus per-area overrides,
//! e.g. `debug,subtype=trace,implicits=trace`. Area names follow the
//! crate's event targets (`namer`, `typer`, `subtype`, `solver`,
//! `implicits`).

use std::env;
use std::fmt;

/// Rendering style a driver should use for forwarded events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    pub fn parse(spec: &str) -> Option<Self> {
        match spec.to_ascii_lowercase().as_str() {
            "text" | "plain" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
        })
    }
}

/// Verbosity threshold, ordered from quietest to loudest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn parse(spec: &str) -> Option<Self> {
        match spec.to_ascii_lowercase().as_str() {
            "error" | "err" => Some(Self::Error),
            "warn" | "warning" => Some(Self::Warn),
            "info" => Some(Self::Info),
            "debug" => Some(Self::Debug),
            "trace" | "verbose" => Some(Self::Trace),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        })
    }
}

/// Parsed log spec: a base level plus per-area overrides.
#[derive(Debug, Clone)]
pub struct LogSpec {
    pub format: LogFormat,
    base: LogLevel,
    areas: Vec<(String, LogLevel)>,
}

impl LogSpec {
    pub const DEFAULT_LEVEL: LogLevel = LogLevel::Info;

    /// Parse a spec string. Unknown fragments are skipped rather than
    /// failing the whole spec, so a partially valid `SABLE_SEMA_LOG`
    /// still takes effect.
    #[must_use]
    pub fn parse(spec: &str) -> Self {
        let mut parsed = Self {
            format: LogFormat::default(),
            base: Self::DEFAULT_LEVEL,
            areas: Vec::new(),
        };
        for fragment in spec.split(',').map(str::trim).filter(|f| !f.is_empty()) {
            match fragment.split_once('=') {
                None => {
                    if let Some(level) = LogLevel::parse(fragment) {
                        parsed.base = level;
                    }
                }
                Some(("format", value)) => {
                    if let Some(format) = LogFormat::parse(value) {
                        parsed.format = format;
                    }
                }
                Some((area, value)) => {
                    if let Some(level) = LogLevel::parse(value) {
                        parsed.areas.push((area.to_string(), level));
                    }
                }
            }
        }
        parsed
    }

    /// Read the spec from `SABLE_SEMA_LOG`, falling back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        match env::var_os("SABLE_SEMA_LOG") {
            Some(value) => Self::parse(&value.to_string_lossy()),
            None => Self::parse(""),
        }
    }

    /// Effective threshold for an event target such as `subtype` or
    /// `sable_sema::sema::subtype`. The last matching override wins.
    #[must_use]
    pub fn level_for(&self, target: &str) -> LogLevel {
        let area = target.rsplit("::").next().unwrap_or(target);
        self.areas
            .iter()
            .rev()
            .find(|(name, _)| name == area)
            .map_or(self.base, |(_, level)| *level)
    }

    #[must_use]
    pub fn base_level(&self) -> LogLevel {
        self.base
    }
}

impl Default for LogSpec {
    fn default() -> Self {
        Self::parse("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_and_formats_parse_loosely() {
        assert_eq!(LogLevel::parse("WARN"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("verbose"), Some(LogLevel::Trace));
        assert_eq!(LogLevel::parse("noop"), None);
        assert_eq!(LogFormat::parse("JSON"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse("xml"), None);
    }

    #[test]
    fn spec_combines_base_level_area_overrides_and_format() {
        let spec = LogSpec::parse("debug,subtype=trace,format=json");
        assert_eq!(spec.base_level(), LogLevel::Debug);
        assert_eq!(spec.format, LogFormat::Json);
        assert_eq!(spec.level_for("subtype"), LogLevel::Trace);
        assert_eq!(spec.level_for("typer"), LogLevel::Debug);
    }

    #[test]
    fn module_paths_match_their_trailing_area() {
        let spec = LogSpec::parse("warn,implicits=debug");
        assert_eq!(
            spec.level_for("sable_sema::sema::implicits"),
            LogLevel::Debug
        );
        assert_eq!(spec.level_for("sable_sema::sema::namer"), LogLevel::Warn);
    }

    #[test]
    fn malformed_fragments_are_skipped() {
        let spec = LogSpec::parse("bogus,solver=nope,trace");
        assert_eq!(spec.base_level(), LogLevel::Trace);
        assert_eq!(spec.level_for("solver"), LogLevel::Trace);
    }

    #[test]
    fn tracing_levels_map_one_to_one() {
        assert_eq!(LogLevel::Error.as_tracing_level(), tracing::Level::ERROR);
        assert_eq!(LogLevel::Trace.as_tracing_level(), tracing::Level::TRACE);
    }
}
