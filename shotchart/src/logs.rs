//! Pipeline logging.
//!
//! Stages report progress through the `log_*` helpers instead of printing.
//! Each entry is emitted as a `tracing` event, so the binary decides where
//! it ends up (stderr by default). Reports are persisted as pretty JSON with
//! [`write_report`].

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Log level for pipeline output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A single log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    /// Nesting level for detail lines
    #[serde(default)]
    pub indent: u8,
}

impl LogEntry {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Info, message: message.into(), indent: 0 }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Success, message: message.into(), indent: 0 }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Warning, message: message.into(), indent: 0 }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Error, message: message.into(), indent: 0 }
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }

    /// Message with its indentation applied.
    pub fn display(&self) -> String {
        format!("{}{}", "  ".repeat(self.indent as usize), self.message)
    }

    /// Emit this entry as a tracing event.
    pub fn emit(&self) {
        let text = self.display();
        match self.level {
            LogLevel::Info => tracing::info!(indent = self.indent, "{}", text),
            LogLevel::Success => tracing::info!(status = "ok", indent = self.indent, "{}", text),
            LogLevel::Warning => tracing::warn!(indent = self.indent, "{}", text),
            LogLevel::Error => tracing::error!(indent = self.indent, "{}", text),
        }
    }
}

pub fn log_info(msg: impl Into<String>) {
    LogEntry::info(msg).emit();
}

pub fn log_success(msg: impl Into<String>) {
    LogEntry::success(msg).emit();
}

pub fn log_warning(msg: impl Into<String>) {
    LogEntry::warning(msg).emit();
}

pub fn log_error(msg: impl Into<String>) {
    LogEntry::error(msg).emit();
}

pub fn log_info_indent(msg: impl Into<String>, indent: u8) {
    LogEntry::info(msg).with_indent(indent).emit();
}

pub fn log_warning_indent(msg: impl Into<String>, indent: u8) {
    LogEntry::warning(msg).with_indent(indent).emit();
}

/// Write a report as pretty JSON, creating the parent directory if needed.
pub fn write_report<T: Serialize>(path: &Path, report: &T) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json)?;
    log_success(format!("Saved report to: {}", path.display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indent_display() {
        let entry = LogEntry::warning("LOC_X: 3").with_indent(2);
        assert_eq!(entry.display(), "    LOC_X: 3");
        assert_eq!(entry.level, LogLevel::Warning);
    }

    #[test]
    fn test_entry_serializes_lowercase_level() {
        let json = serde_json::to_value(LogEntry::success("done")).unwrap();
        assert_eq!(json["level"], "success");
        assert_eq!(json["indent"], 0);
    }

    #[test]
    fn test_write_report_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("report.json");
        write_report(&path, &serde_json::json!({ "start_rows": 3 })).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["start_rows"], 3);
    }
}
