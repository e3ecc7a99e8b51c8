//! Log line formatting

use crate::logging::LogLevel;
use std::str::FromStr;

/// How log lines are rendered
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line
    /// Example: {"timestamp":"2024-01-15T10:30:00+00:00","level":"WARN","target":"permatrix_core::keys","message":"..."}
    Json,
    /// Example: 2024-01-15 10:30:00.000 WARN  [permatrix_core::keys] ...
    Human,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "human" | "text" => Ok(LogFormat::Human),
            _ => Err(format!("unknown log format: {}", s)),
        }
    }
}

impl LogFormat {
    pub fn format_entry(&self, entry: &LogEntry) -> String {
        match self {
            LogFormat::Json => format_json(entry),
            LogFormat::Human => format_human(entry),
        }
    }
}

/// A single log record, detached from `log::Record` lifetimes
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub level: LogLevel,
    pub target: String,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: LogLevel, target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Utc::now(),
            level,
            target: target.into(),
            message: message.into(),
        }
    }

    pub fn from_record(record: &log::Record) -> Self {
        Self::new(record.level().into(), record.target(), record.args().to_string())
    }
}

fn level_name(level: LogLevel) -> String {
    format!("{:?}", level).to_uppercase()
}

fn format_json(entry: &LogEntry) -> String {
    let json = serde_json::json!({
        "timestamp": entry.timestamp.to_rfc3339(),
        "level": level_name(entry.level),
        "target": entry.target,
        "message": entry.message,
    });
    json.to_string()
}

fn format_human(entry: &LogEntry) -> String {
    format!(
        "{} {:5} [{}] {}",
        entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
        level_name(entry.level),
        entry.target,
        entry.message
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> LogEntry {
        LogEntry::new(LogLevel::Warn, "permatrix_core::keys", "Catalog key \"x\" matches no menu node")
    }

    #[test]
    fn test_json_format() {
        let line = LogFormat::Json.format_entry(&entry());
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["level"], "WARN");
        assert_eq!(value["target"], "permatrix_core::keys");
        assert_eq!(value["message"], "Catalog key \"x\" matches no menu node");
    }

    #[test]
    fn test_human_format() {
        let line = LogFormat::Human.format_entry(&entry());
        assert!(line.contains("WARN  [permatrix_core::keys] Catalog key"));
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert!("logfmt".parse::<LogFormat>().is_err());
    }
}
