use thiserror::Error;

#[derive(Error, Debug)]
pub enum SeqGrepError {
    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid regular expression for table '{table_name}'")]
    InvalidPattern {
        table_name: String,
        #[source]
        source: regex::Error,
    },

    #[error("Table '{table_name}' declares {fields} fields but its pattern has {groups} capture groups")]
    FieldCountMismatch {
        table_name: String,
        fields: usize,
        groups: usize,
    },

    #[error("Duplicate table name: {table_name}")]
    DuplicateTable { table_name: String },

    #[error("Unknown text encoding: {label}")]
    UnknownEncoding { label: String },

    #[error("Path validation failed: {path}")]
    InvalidPath { path: String },

    #[error("No tables found to concatenate in {path}")]
    NoTablesFound { path: String },

    #[error("Table operation failed on {path}")]
    Table {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("Serialization failed: {message}")]
    Serialization { message: String },
}

impl SeqGrepError {
    /// True for errors raised while loading or validating settings.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SeqGrepError::Config { .. }
                | SeqGrepError::InvalidPattern { .. }
                | SeqGrepError::FieldCountMismatch { .. }
                | SeqGrepError::DuplicateTable { .. }
                | SeqGrepError::UnknownEncoding { .. }
        )
    }
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for SeqGrepError {
    fn user_message(&self) -> String {
        match self {
            SeqGrepError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            SeqGrepError::InvalidPattern { table_name, source } => {
                format!("Invalid regular expression for table '{}': {}", table_name, source)
            }
            SeqGrepError::FieldCountMismatch {
                table_name,
                fields,
                groups,
            } => format!(
                "Table '{}' names {} fields but its pattern captures {} groups",
                table_name, fields, groups
            ),
            SeqGrepError::DuplicateTable { table_name } => {
                format!("Table name '{}' is used by more than one pattern", table_name)
            }
            SeqGrepError::UnknownEncoding { label } => {
                format!("Unknown text encoding: {}", label)
            }
            SeqGrepError::InvalidPath { path } => {
                format!("Invalid path: {}", path)
            }
            SeqGrepError::NoTablesFound { path } => {
                format!("No tables found to concatenate in {}", path)
            }
            SeqGrepError::Table { path, source } => {
                format!("Failed to process table {}: {}", path, source)
            }
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            SeqGrepError::Config { .. } => Some(
                "Check that the settings file holds three YAML documents: file settings, common pattern and unique patterns.".to_string()
            ),
            SeqGrepError::InvalidPattern { .. } => Some(
                "Remember that the common regexp_pattern is prepended to every unique regexp_pattern before compiling.".to_string()
            ),
            SeqGrepError::FieldCountMismatch { .. } => Some(
                "Each capture group in the common and unique patterns needs exactly one entry in field_names.".to_string()
            ),
            SeqGrepError::DuplicateTable { .. } => Some(
                "Give every unique pattern its own table_name; each one becomes an output file.".to_string()
            ),
            SeqGrepError::UnknownEncoding { .. } => Some(
                "Use an encoding label such as utf-8, shift_jis, cp932, windows-1252 or latin1.".to_string()
            ),
            SeqGrepError::InvalidPath { .. } => Some(
                "Ensure the input and output directories exist and are readable/writable.".to_string()
            ),
            SeqGrepError::NoTablesFound { .. } => Some(
                "Point --inputdir at a directory holding tables produced with --grep and the same settings file.".to_string()
            ),
            _ => None,
        }
    }
}

impl From<serde_yaml::Error> for SeqGrepError {
    fn from(error: serde_yaml::Error) -> Self {
        SeqGrepError::Config {
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SeqGrepError>;
