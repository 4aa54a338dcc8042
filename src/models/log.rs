use serde::{Deserialize, Serialize};

/// Severity of a console log line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    #[default]
    Info,
    Warn,
    Success,
}

/// A single line of the system console.
///
/// Entries are created by the log buffer and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    /// Append order, strictly increasing across the session and restarts.
    #[serde(default)]
    pub seq: u64,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: LogKind,
    /// Wall-clock time of the append, `HH:MM:SS` on a 24-hour clock.
    pub timestamp: String,
}
