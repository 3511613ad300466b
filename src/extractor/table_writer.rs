use crate::config::Settings;
use crate::engine::{Matcher, Row};
use crate::error::{Result, SeqGrepError};
use encoding_rs::Encoding;
use std::borrow::Cow;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Name of the leading row-index column of every table.
pub const ROW_ID_FIELD: &str = "row_id";

#[derive(Debug, Clone)]
pub struct WrittenTable {
    pub table_name: String,
    pub path: PathBuf,
    pub rows: usize,
    /// Some characters had no mapping in the output encoding and were
    /// written as numeric character references.
    pub lossy: bool,
}

/// Serializes tables as delimited text in the configured encoding.
#[derive(Debug, Clone)]
pub struct TableWriter {
    delimiter: u8,
    encoding: &'static Encoding,
    extension: String,
}

impl TableWriter {
    pub fn new<S: Into<String>>(delimiter: u8, encoding: &'static Encoding, extension: S) -> Self {
        Self {
            delimiter,
            encoding,
            extension: extension.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::new(
            settings.delimiter()?,
            settings.write_encoding()?,
            settings.output_extension(),
        ))
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn table_path(&self, output_dir: &Path, table_name: &str) -> PathBuf {
        output_dir.join(format!("{}{}", table_name, self.extension))
    }

    /// Writes `<table_name><extension>`: a `row_id` column, then `line_id`
    /// and the captured fields.
    pub fn write_matcher(&self, matcher: &Matcher, output_dir: &Path) -> Result<WrittenTable> {
        self.write_table(
            matcher.table_name(),
            matcher.field_names(),
            matcher.rows(),
            output_dir,
        )
    }

    pub fn write_table(
        &self,
        table_name: &str,
        field_names: &[String],
        rows: &[Row],
        output_dir: &Path,
    ) -> Result<WrittenTable> {
        let path = self.table_path(output_dir, table_name);

        let mut header = Vec::with_capacity(field_names.len() + 1);
        header.push(ROW_ID_FIELD.to_string());
        header.extend(field_names.iter().cloned());

        let records = rows.iter().enumerate().map(|(row_id, row)| {
            let mut record = Vec::with_capacity(row.captures.len() + 2);
            record.push(row_id.to_string());
            record.push(row.line_id.to_string());
            record.extend(row.captures.iter().cloned());
            record
        });

        let lossy = self.write_records(&path, &header, records)?;

        Ok(WrittenTable {
            table_name: table_name.to_string(),
            path,
            rows: rows.len(),
            lossy,
        })
    }

    /// Writes a header and records to `path`, replacing any existing file
    /// only once the whole table has been written. Returns true when the
    /// output encoding could not represent every character.
    pub fn write_records<I>(&self, path: &Path, header: &[String], records: I) -> Result<bool>
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        let table_error = |source: csv::Error| SeqGrepError::Table {
            path: path.display().to_string(),
            source,
        };

        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        writer.write_record(header).map_err(table_error)?;
        for record in records {
            writer.write_record(&record).map_err(table_error)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| SeqGrepError::Io(e.into_error()))?;
        let text = String::from_utf8(bytes).map_err(|e| SeqGrepError::Serialization {
            message: format!("Table {} is not valid text: {}", path.display(), e),
        })?;

        let (encoded, lossy): (Cow<[u8]>, bool) = if self.encoding == encoding_rs::UTF_8 {
            (Cow::Borrowed(text.as_bytes()), false)
        } else {
            let (encoded, _, had_unmappable) = self.encoding.encode(&text);
            (encoded, had_unmappable)
        };

        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut temp_file = NamedTempFile::new_in(parent)?;
        temp_file.write_all(&encoded)?;
        temp_file.flush()?;
        temp_file.persist(path).map_err(|e| SeqGrepError::Io(e.error))?;

        Ok(lossy)
    }
}
