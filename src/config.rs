use crate::error::{Result, SeqGrepError};
use encoding_rs::Encoding;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// First document of the settings stream: how files are found, read and written.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FileSettings {
    pub search_recursively: bool,
    pub file_path_filter_regexp: String,
    pub sort_by_date_modified: bool,
    pub code_page_read: String,
    pub code_page_write: String,
    pub output_file_extension: String,
    pub column_separator_character_integer: u32,
}

/// Second document: the prefix shared by every pattern.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CommonPattern {
    #[serde(default)]
    pub field_names: Vec<String>,
    #[serde(default)]
    pub regexp_pattern: String,
}

/// One entry of the third document.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UniquePattern {
    pub table_name: String,
    pub key_substring: String,
    #[serde(default)]
    pub field_names: Vec<String>,
    pub regexp_pattern: String,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub files: FileSettings,
    pub common: CommonPattern,
    pub patterns: Vec<UniquePattern>,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            search_recursively: true,
            file_path_filter_regexp: r".*\.log$".to_string(),
            sort_by_date_modified: true,
            code_page_read: "utf-8".to_string(),
            code_page_write: "utf-8".to_string(),
            output_file_extension: ".tsv".to_string(),
            column_separator_character_integer: 9, // tab
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            files: FileSettings::default(),
            common: CommonPattern {
                field_names: vec!["time".to_string(), "level".to_string()],
                regexp_pattern: r"(\d{2}:\d{2}:\d{2}) \[(\w+)\] ".to_string(),
            },
            patterns: vec![
                UniquePattern {
                    table_name: "errors".to_string(),
                    key_substring: "[ERROR]".to_string(),
                    field_names: vec!["message".to_string()],
                    regexp_pattern: "(.*)".to_string(),
                },
                UniquePattern {
                    table_name: "requests".to_string(),
                    key_substring: "request".to_string(),
                    field_names: vec![
                        "method".to_string(),
                        "path".to_string(),
                        "status".to_string(),
                    ],
                    regexp_pattern: r"request (\w+) (\S+) -> (\d{3})".to_string(),
                },
            ],
        }
    }
}

impl Settings {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(SeqGrepError::Config {
                message: format!("Settings file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| SeqGrepError::Config {
            message: format!("Failed to read settings file {}: {}", path.display(), e),
        })?;

        Self::from_yaml_str(&content).map_err(|e| match e {
            SeqGrepError::Config { message } => SeqGrepError::Config {
                message: format!("{}: {}", path.display(), message),
            },
            other => other,
        })
    }

    /// Parses the three-document YAML stream. Document order is significant;
    /// anything after the third document is ignored.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let mut documents = serde_yaml::Deserializer::from_str(content);

        let files = match documents.next() {
            Some(document) => FileSettings::deserialize(document)?,
            None => return Err(missing_document("file settings")),
        };
        let common = match documents.next() {
            Some(document) => Option::<CommonPattern>::deserialize(document)?.unwrap_or_default(),
            None => return Err(missing_document("common pattern")),
        };
        let patterns = match documents.next() {
            Some(document) => Vec::<UniquePattern>::deserialize(document)?,
            None => return Err(missing_document("unique patterns")),
        };

        Ok(Self {
            files,
            common,
            patterns,
        })
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        let serialize = |e: serde_yaml::Error| SeqGrepError::Serialization {
            message: e.to_string(),
        };
        let files = serde_yaml::to_string(&self.files).map_err(serialize)?;
        let common = serde_yaml::to_string(&self.common).map_err(serialize)?;
        let patterns = serde_yaml::to_string(&self.patterns).map_err(serialize)?;

        Ok(format!("---\n{}---\n{}---\n{}", files, common, patterns))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = self.to_yaml_string()?;

        std::fs::write(path, content).map_err(|e| SeqGrepError::Config {
            message: format!("Failed to write settings file {}: {}", path.display(), e),
        })?;

        Ok(())
    }

    pub fn create_sample_config() -> String {
        Self::default().to_yaml_string().unwrap_or_default()
    }

    pub fn validate(&self) -> Result<()> {
        Regex::new(&self.files.file_path_filter_regexp).map_err(|e| SeqGrepError::Config {
            message: format!("Invalid file_path_filter_regexp: {}", e),
        })?;

        let read_encoding = self.read_encoding()?;
        if !read_encoding.is_ascii_compatible() {
            return Err(SeqGrepError::Config {
                message: format!(
                    "code_page_read '{}' is not line-oriented; use an ASCII compatible encoding",
                    self.files.code_page_read
                ),
            });
        }
        self.write_encoding()?;
        self.delimiter()?;

        if self.patterns.is_empty() {
            return Err(SeqGrepError::Config {
                message: "At least one unique pattern must be specified".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for pattern in &self.patterns {
            if pattern.table_name.trim().is_empty() {
                return Err(SeqGrepError::Config {
                    message: "Every unique pattern needs a non-empty table_name".to_string(),
                });
            }
            if !seen.insert(pattern.table_name.as_str()) {
                return Err(SeqGrepError::DuplicateTable {
                    table_name: pattern.table_name.clone(),
                });
            }
        }

        Ok(())
    }

    /// Column delimiter decoded from `column_separator_character_integer`.
    pub fn delimiter(&self) -> Result<u8> {
        let code = self.files.column_separator_character_integer;
        match char::from_u32(code) {
            Some(c) if c.is_ascii() && c != '\n' && c != '\r' && c != '"' => Ok(c as u8),
            _ => Err(SeqGrepError::Config {
                message: format!(
                    "column_separator_character_integer {} is not a usable single-byte separator",
                    code
                ),
            }),
        }
    }

    pub fn read_encoding(&self) -> Result<&'static Encoding> {
        resolve_encoding(&self.files.code_page_read)
    }

    pub fn write_encoding(&self) -> Result<&'static Encoding> {
        resolve_encoding(&self.files.code_page_write)
    }

    pub fn output_extension(&self) -> &str {
        &self.files.output_file_extension
    }
}

fn missing_document(name: &str) -> SeqGrepError {
    SeqGrepError::Config {
        message: format!("Missing {} document", name),
    }
}

/// Resolves WHATWG encoding labels plus the `cpNNN` and `latin-1` style
/// spellings commonly found in settings files.
pub fn resolve_encoding(label: &str) -> Result<&'static Encoding> {
    let normalized = label.trim().to_ascii_lowercase();

    let mut candidates = vec![
        normalized.clone(),
        normalized.replace('_', "-"),
        normalized.replace(['_', '-'], ""),
    ];

    if let Some(number) = normalized.strip_prefix("cp") {
        match number {
            "932" => candidates.push("windows-31j".to_string()),
            "936" => candidates.push("gbk".to_string()),
            "949" => candidates.push("euc-kr".to_string()),
            "950" => candidates.push("big5".to_string()),
            "65001" => candidates.push("utf-8".to_string()),
            _ => candidates.push(format!("windows-{}", number)),
        }
    }

    candidates
        .iter()
        .find_map(|candidate| Encoding::for_label(candidate.as_bytes()))
        .ok_or_else(|| SeqGrepError::UnknownEncoding {
            label: label.to_string(),
        })
}
