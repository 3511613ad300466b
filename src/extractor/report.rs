use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    Grep,
    Concatenate,
}

impl RunMode {
    pub fn describe(&self) -> &'static str {
        match self {
            RunMode::Grep => "table creation",
            RunMode::Concatenate => "table concatenation",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TableSummary {
    pub table_name: String,
    pub path: PathBuf,
    pub rows: usize,
}

/// Outcome of one run, printed at the end in the chosen output format.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub mode: RunMode,
    pub started_at: DateTime<Local>,
    pub duration: Duration,
    pub files_scanned: usize,
    pub lines_read: u64,
    pub undecodable_lines: u64,
    pub tables: Vec<TableSummary>,
    pub diagnostics: usize,
    /// Lines that held a key substring but failed the full pattern.
    pub mismatched_lines: usize,
    pub log_file: Option<PathBuf>,
}

impl RunReport {
    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.rows).sum()
    }

    pub fn has_problems(&self) -> bool {
        self.diagnostics > 0
    }

    /// Problems other than pattern mismatches: undecodable or unreadable
    /// input and lossy output.
    pub fn has_data_problems(&self) -> bool {
        self.diagnostics > self.mismatched_lines
    }
}

/// Running counters for the file loop; also drives the progress bar.
#[derive(Debug, Clone)]
pub struct ScanProgress {
    pub files_processed: usize,
    pub lines_read: u64,
    pub undecodable_lines: u64,
    pub rows_recorded: usize,
    pub current_file: Option<String>,
    pub start_time: Instant,
}

impl ScanProgress {
    pub fn new() -> Self {
        Self {
            files_processed: 0,
            lines_read: 0,
            undecodable_lines: 0,
            rows_recorded: 0,
            current_file: None,
            start_time: Instant::now(),
        }
    }

    pub fn start_file(&mut self, filename: String) {
        self.current_file = Some(filename);
    }

    pub fn finish_file(&mut self) {
        self.files_processed += 1;
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl Default for ScanProgress {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_progress_counts_files() {
        let mut progress = ScanProgress::default();
        assert_eq!(progress.files_processed, 0);

        progress.start_file("a.log".to_string());
        progress.finish_file();
        assert_eq!(progress.files_processed, 1);
        assert_eq!(progress.current_file.as_deref(), Some("a.log"));
    }

    #[test]
    fn test_report_totals() {
        let report = RunReport {
            mode: RunMode::Grep,
            started_at: Local::now(),
            duration: Duration::from_millis(5),
            files_scanned: 1,
            lines_read: 10,
            undecodable_lines: 0,
            tables: vec![
                TableSummary {
                    table_name: "a".to_string(),
                    path: PathBuf::from("a.tsv"),
                    rows: 2,
                },
                TableSummary {
                    table_name: "b".to_string(),
                    path: PathBuf::from("b.tsv"),
                    rows: 3,
                },
            ],
            diagnostics: 0,
            mismatched_lines: 0,
            log_file: None,
        };

        assert_eq!(report.total_rows(), 5);
        assert!(!report.has_problems());

        let mismatches_only = RunReport {
            diagnostics: 2,
            mismatched_lines: 2,
            ..report.clone()
        };
        assert!(mismatches_only.has_problems());
        assert!(!mismatches_only.has_data_problems());

        let with_decode_failure = RunReport {
            diagnostics: 3,
            ..mismatches_only
        };
        assert!(with_decode_failure.has_data_problems());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["mode"], "grep");
        assert_eq!(json["tables"][1]["rows"], 3);
    }
}
