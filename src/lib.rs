pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod extractor;
pub mod scanner;
pub mod ui;

// Public API re-exports
pub use cli::{Cli, OutputFormat};
pub use config::{CommonPattern, FileSettings, Settings, UniquePattern};
pub use error::{Result, SeqGrepError, UserFriendlyError};

// Core functionality re-exports
pub use engine::{
    DiagnosticKind, DiagnosticLog, LineIdSequence, Matcher, PatternSet, PatternSpec, Row,
    LOG_FILE_NAME,
};
pub use extractor::{RunMode, RunReport, ScanProgress, TableConcatenator, TableSummary, TableWriter};
pub use scanner::{CandidateFile, FileEnumerator, LineSource, SourceLine};
pub use ui::{OutputFormatter, OutputMode, ProgressManager};

use chrono::Local;
use extractor::SourceTable;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Main library interface: runs table creation or concatenation for one
/// settings file.
pub struct SeqGrep {
    settings: Settings,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
    write_log_file: bool,
}

impl SeqGrep {
    pub fn new(settings: Settings, output_mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        Self {
            settings,
            output_formatter: OutputFormatter::new(output_mode, verbose, quiet),
            progress_manager: ProgressManager::new(!quiet && output_mode == OutputMode::Human),
            write_log_file: true,
        }
    }

    /// When disabled, diagnostics are printed as they occur and no
    /// `log.yaml` is written.
    pub fn with_log_file(mut self, write_log_file: bool) -> Self {
        self.write_log_file = write_log_file;
        self
    }

    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let settings = cli_args.load_settings()?;
        let output_mode = match cli_args.output_format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        };

        Ok(Self::new(settings, output_mode, cli_args.verbose, cli_args.quiet)
            .with_log_file(cli_args.write_log_file()))
    }

    /// Reads every candidate file under `input_dir` and writes one table per
    /// pattern into `output_dir`.
    pub fn create_tables(&self, input_dir: &Path, output_dir: &Path) -> Result<RunReport> {
        let started_at = Local::now();
        let start_time = Instant::now();

        // Everything that can fail on configuration happens before any file is read
        let mut patterns = PatternSet::from_settings(&self.settings)?;
        let writer = TableWriter::from_settings(&self.settings)?;
        let line_source = LineSource::new(self.settings.read_encoding()?);
        let files = FileEnumerator::new(&self.settings.files)?.enumerate(input_dir)?;

        std::fs::create_dir_all(output_dir)?;
        info!(
            "Processing {} files with {} patterns",
            files.len(),
            patterns.len()
        );

        let mut log = DiagnosticLog::new().with_echo(!self.write_log_file);

        self.output_formatter.start_operation("start reading files...");
        let scan = self.scan_files(&files, &mut patterns, line_source, &mut log);

        self.output_formatter.start_operation("saving files...");
        let table_progress = self
            .progress_manager
            .create_table_progress(patterns.len() as u64, "Saving tables...");
        let mut tables = Vec::with_capacity(patterns.len());

        for matcher in patterns.matchers() {
            let written = writer.write_matcher(matcher, output_dir)?;
            if written.lossy {
                log.record(
                    DiagnosticKind::LossyEncoding,
                    format!(
                        "{} contains characters not representable in {}",
                        written.path.display(),
                        writer.encoding().name()
                    ),
                );
            }
            log.record(
                DiagnosticKind::TableWritten,
                format!("{} was created.", written.path.display()),
            );
            table_progress.inc(1);

            tables.push(TableSummary {
                table_name: written.table_name,
                path: written.path,
                rows: written.rows,
            });
        }
        ui::progress::finish_progress_with_summary(
            &table_progress,
            &format!("Saved {} tables", tables.len()),
            start_time.elapsed(),
        );

        self.output_formatter.start_operation("completed table creation.");

        let log_file = if self.write_log_file {
            let path = output_dir.join(LOG_FILE_NAME);
            log.save_yaml(&path)?;
            self.output_formatter
                .start_operation(&format!("log file \"{}\" was created.", path.display()));
            Some(path)
        } else {
            None
        };

        Ok(RunReport {
            mode: RunMode::Grep,
            started_at,
            duration: start_time.elapsed(),
            files_scanned: scan.files_processed,
            lines_read: scan.lines_read,
            undecodable_lines: scan.undecodable_lines,
            tables,
            diagnostics: log.problem_count(),
            mismatched_lines: log.count(DiagnosticKind::LineMismatch),
            log_file,
        })
    }

    /// Classifies every line of every file, in enumeration order.
    fn scan_files(
        &self,
        files: &[CandidateFile],
        patterns: &mut PatternSet,
        line_source: LineSource,
        log: &mut DiagnosticLog,
    ) -> ScanProgress {
        let mut progress = ScanProgress::new();
        let file_progress = self.progress_manager.create_file_progress(files.len() as u64);

        for file in files {
            let display_path = file.display_path();
            progress.start_file(display_path.clone());
            debug!("Reading {}", display_path);

            let lines = match line_source.open(&file.path) {
                Ok(lines) => lines,
                Err(e) => {
                    log.record(
                        DiagnosticKind::UnreadableFile,
                        format!("Cannot open {}. Details: {}", display_path, e),
                    );
                    progress.finish_file();
                    ui::progress::update_scan_progress(&file_progress, &progress);
                    continue;
                }
            };

            for line in lines {
                match line {
                    Ok(SourceLine::Text { text, .. }) => {
                        progress.lines_read += 1;
                        if patterns.classify(&text, log).is_some() {
                            progress.rows_recorded += 1;
                        }
                    }
                    Ok(SourceLine::Undecodable { number, byte_len }) => {
                        progress.undecodable_lines += 1;
                        log.record(
                            DiagnosticKind::DecodeFailure,
                            format!(
                                "Decode Error on {} line {}. Details: {} bytes are not valid {}",
                                display_path,
                                number,
                                byte_len,
                                line_source.encoding().name()
                            ),
                        );
                    }
                    Err(e) => {
                        log.record(
                            DiagnosticKind::UnreadableFile,
                            format!("Read error on {}. Details: {}", display_path, e),
                        );
                        break;
                    }
                }
            }

            progress.finish_file();
            ui::progress::update_scan_progress(&file_progress, &progress);
        }

        ui::progress::finish_progress_with_summary(
            &file_progress,
            &format!(
                "Read {} files, recorded {} rows",
                progress.files_processed, progress.rows_recorded
            ),
            progress.elapsed(),
        );

        progress
    }

    /// Merges the tables under `input_dir` into one combined table in
    /// `output_dir`.
    pub fn concatenate_tables(&self, input_dir: &Path, output_dir: &Path) -> Result<RunReport> {
        let started_at = Local::now();
        let start_time = Instant::now();

        let concatenator = TableConcatenator::new(TableWriter::from_settings(&self.settings)?);
        std::fs::create_dir_all(output_dir)?;

        self.output_formatter.start_operation("start concatenating tables...");
        let spinner = self.progress_manager.create_spinner("Reading tables...");
        let on_table = |table: &SourceTable| {
            spinner.set_message(format!("Read {} ({} rows)", table.key, table.records.len()));
        };

        let combined = concatenator.concatenate(input_dir, output_dir, Some(&on_table))?;
        ui::progress::finish_progress_with_summary(
            &spinner,
            &format!("Concatenated {} tables", combined.sources.len()),
            start_time.elapsed(),
        );

        if combined.lossy {
            self.output_formatter.warning(&format!(
                "{} contains characters not representable in the output encoding",
                combined.path.display()
            ));
        }
        self.output_formatter.start_operation(&format!("{} was created.", combined.path.display()));

        let table_name = combined
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        Ok(RunReport {
            mode: RunMode::Concatenate,
            started_at,
            duration: start_time.elapsed(),
            files_scanned: combined.sources.len(),
            lines_read: 0,
            undecodable_lines: 0,
            tables: vec![TableSummary {
                table_name,
                path: combined.path,
                rows: combined.rows,
            }],
            diagnostics: usize::from(combined.lossy),
            mismatched_lines: 0,
            log_file: None,
        })
    }

    /// Compiles the patterns and enumerates the input without reading or
    /// writing anything.
    pub fn plan(&self, input_dir: &Path) -> Result<(PatternSet, Vec<CandidateFile>)> {
        let patterns = PatternSet::from_settings(&self.settings)?;
        let files = FileEnumerator::new(&self.settings.files)?.enumerate(input_dir)?;
        Ok((patterns, files))
    }

    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        std::fs::write(output_path.as_ref(), Settings::create_sample_config())?;
        Ok(())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    pub fn handle_error(&self, error: &SeqGrepError) {
        self.progress_manager
            .suspend(|| self.output_formatter.print_user_friendly_error(error));
    }
}

pub fn version_info() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
