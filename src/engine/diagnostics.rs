use crate::error::{Result, SeqGrepError};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, warn};

/// File name of the persisted diagnostic log in the output directory.
pub const LOG_FILE_NAME: &str = "log.yaml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Key substring present but the full expression did not match.
    LineMismatch,
    DecodeFailure,
    UnreadableFile,
    LossyEncoding,
    TableWritten,
}

impl DiagnosticKind {
    pub fn is_problem(&self) -> bool {
        !matches!(self, DiagnosticKind::TableWritten)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticEntry {
    pub timestamp: DateTime<Local>,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl DiagnosticEntry {
    pub fn render(&self) -> String {
        format!("{} {}", self.timestamp.format("%H:%M:%S"), self.message)
    }
}

/// Append-only record of everything noteworthy that happened during a run.
///
/// With `echo` enabled every entry is surfaced through the log as soon as it
/// is recorded; otherwise entries stay quiet until [`DiagnosticLog::save_yaml`].
#[derive(Debug, Default)]
pub struct DiagnosticLog {
    entries: Vec<DiagnosticEntry>,
    echo: bool,
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub fn record<S: Into<String>>(&mut self, kind: DiagnosticKind, message: S) {
        let entry = DiagnosticEntry {
            timestamp: Local::now(),
            kind,
            message: message.into(),
        };

        match (self.echo, kind.is_problem()) {
            (true, true) => warn!("{}", entry.message),
            (true, false) => info!("{}", entry.message),
            (false, _) => debug!(kind = ?kind, "{}", entry.message),
        }

        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[DiagnosticEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }

    pub fn problem_count(&self) -> usize {
        self.entries.iter().filter(|e| e.kind.is_problem()).count()
    }

    /// Writes the log as a YAML list of `"HH:MM:SS message"` strings.
    pub fn save_yaml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let rendered: Vec<String> = self.entries.iter().map(DiagnosticEntry::render).collect();
        let content = serde_yaml::to_string(&rendered).map_err(|e| SeqGrepError::Serialization {
            message: format!("Failed to serialize diagnostic log: {}", e),
        })?;

        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }
}
