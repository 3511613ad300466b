use crate::engine::diagnostics::LOG_FILE_NAME;
use crate::error::{Result, SeqGrepError};
use crate::extractor::table_writer::TableWriter;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// First column of a combined table: the stem of the file each row came from.
pub const SOURCE_TABLE_FIELD: &str = "source_table";

/// A previously written table, keyed by its file stem.
#[derive(Debug, Clone)]
pub struct SourceTable {
    pub key: String,
    pub header: Vec<String>,
    pub records: Vec<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct ConcatenatedTable {
    pub path: PathBuf,
    pub sources: Vec<(String, usize)>,
    pub rows: usize,
    pub lossy: bool,
}

/// Outer-joins a directory of tables into one, keyed by source file stem
/// and each table's own row index.
pub struct TableConcatenator {
    writer: TableWriter,
}

impl TableConcatenator {
    pub fn new(writer: TableWriter) -> Self {
        Self { writer }
    }

    /// Tables under `input_dir` (recursively) carrying the output extension,
    /// in file-name order.
    pub fn find_tables(&self, input_dir: &Path) -> Result<Vec<PathBuf>> {
        if !input_dir.is_dir() {
            return Err(SeqGrepError::InvalidPath {
                path: format!("{} is not a directory", input_dir.display()),
            });
        }

        let extension = self.writer.extension();
        let mut tables = Vec::new();

        for entry in WalkDir::new(input_dir).min_depth(1).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("Skipping unreadable entry: {}", err);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            if name == LOG_FILE_NAME || !name.ends_with(extension) {
                continue;
            }
            tables.push(entry.into_path());
        }

        Ok(tables)
    }

    pub fn read_table(&self, path: &Path) -> Result<SourceTable> {
        let bytes = std::fs::read(path)?;
        let (text, _, had_errors) = self.writer.encoding().decode(&bytes);
        if had_errors {
            warn!(
                "{} is not valid {}; undecodable bytes were replaced",
                path.display(),
                self.writer.encoding().name()
            );
        }

        let table_error = |source: csv::Error| SeqGrepError::Table {
            path: path.display().to_string(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.writer.delimiter())
            .flexible(true)
            .from_reader(text.as_bytes());

        let header = reader
            .headers()
            .map_err(table_error)?
            .iter()
            .map(str::to_string)
            .collect();

        let mut records = Vec::new();
        for record in reader.records() {
            let record = record.map_err(table_error)?;
            records.push(record.iter().map(str::to_string).collect());
        }

        Ok(SourceTable {
            key: table_key(path, self.writer.extension()),
            header,
            records,
        })
    }

    /// Reads every table under `input_dir` and writes the combined table to
    /// `output_dir`, named after the joined source keys.
    pub fn concatenate(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        progress_callback: Option<&dyn Fn(&SourceTable)>,
    ) -> Result<ConcatenatedTable> {
        let paths = self.find_tables(input_dir)?;
        if paths.is_empty() {
            return Err(SeqGrepError::NoTablesFound {
                path: input_dir.display().to_string(),
            });
        }

        let mut tables = Vec::with_capacity(paths.len());
        for path in &paths {
            let table = self.read_table(path)?;
            if table.header.is_empty() {
                warn!("Skipping {}: no header row", path.display());
                continue;
            }
            debug!("Read {} rows from {}", table.records.len(), path.display());
            if let Some(callback) = progress_callback {
                callback(&table);
            }
            tables.push(table);
        }

        if tables.is_empty() {
            return Err(SeqGrepError::NoTablesFound {
                path: input_dir.display().to_string(),
            });
        }

        let keys: Vec<&str> = tables.iter().map(|t| t.key.as_str()).collect();
        let path = output_dir.join(format!("{}{}", keys.join("~"), self.writer.extension()));

        let (header, records) = merge_tables(&tables);
        let rows = records.len();
        let lossy = self.writer.write_records(&path, &header, records)?;

        Ok(ConcatenatedTable {
            path,
            sources: tables
                .iter()
                .map(|t| (t.key.clone(), t.records.len()))
                .collect(),
            rows,
            lossy,
        })
    }
}

/// Stacks tables on top of each other. The combined header is
/// `source_table`, the first table's key column, then every other column in
/// first-seen order; cells a table does not have are left empty.
pub fn merge_tables(tables: &[SourceTable]) -> (Vec<String>, Vec<Vec<String>>) {
    let key_column = tables
        .first()
        .and_then(|t| t.header.first())
        .cloned()
        .unwrap_or_default();

    for key in mismatched_key_columns(tables) {
        warn!(
            "Table '{}' has a different first column; its values are placed under '{}'",
            key, key_column
        );
    }

    let mut columns: Vec<String> = Vec::new();
    for table in tables {
        for name in table.header.iter().skip(1) {
            if !columns.contains(name) {
                columns.push(name.clone());
            }
        }
    }

    let mut header = Vec::with_capacity(columns.len() + 2);
    header.push(SOURCE_TABLE_FIELD.to_string());
    header.push(key_column);
    header.extend(columns.iter().cloned());

    let mut records = Vec::new();
    for table in tables {
        let positions: HashMap<&str, usize> = table
            .header
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, name)| (name.as_str(), i))
            .collect();

        for record in &table.records {
            let mut merged = Vec::with_capacity(header.len());
            merged.push(table.key.clone());
            merged.push(record.first().cloned().unwrap_or_default());
            for column in &columns {
                let cell = positions
                    .get(column.as_str())
                    .and_then(|&i| record.get(i))
                    .cloned()
                    .unwrap_or_default();
                merged.push(cell);
            }
            records.push(merged);
        }
    }

    (header, records)
}

/// Keys of the tables whose first header differs from the first table's.
pub fn mismatched_key_columns(tables: &[SourceTable]) -> Vec<&str> {
    let Some(expected) = tables.first().and_then(|t| t.header.first()) else {
        return Vec::new();
    };

    tables
        .iter()
        .filter(|t| t.header.first() != Some(expected))
        .map(|t| t.key.as_str())
        .collect()
}

fn table_key(path: &Path, extension: &str) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    match name.strip_suffix(extension) {
        Some(stem) if !extension.is_empty() && !stem.is_empty() => stem.to_string(),
        _ => path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or(name),
    }
}
