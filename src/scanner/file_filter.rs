use crate::config::FileSettings;
use crate::error::{Result, SeqGrepError};
use regex::Regex;
use std::path::Path;

/// Accepts paths whose full string form matches `file_path_filter_regexp`
/// from its first character.
pub struct FileFilter {
    path_pattern: Regex,
}

impl FileFilter {
    pub fn new(settings: &FileSettings) -> Result<Self> {
        Self::from_pattern(&settings.file_path_filter_regexp)
    }

    pub fn from_pattern(pattern: &str) -> Result<Self> {
        let path_pattern =
            Regex::new(&format!("^(?:{})", pattern)).map_err(|e| SeqGrepError::Config {
                message: format!("Invalid file_path_filter_regexp '{}': {}", pattern, e),
            })?;

        Ok(Self { path_pattern })
    }

    pub fn accepts(&self, path: &Path) -> bool {
        self.path_pattern.is_match(&path.to_string_lossy())
    }
}
