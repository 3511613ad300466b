use crate::config::FileSettings;
use crate::error::{Result, SeqGrepError};
use crate::scanner::file_filter::FileFilter;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct CandidateFile {
    pub path: PathBuf,
    pub size: u64,
    pub modified: SystemTime,
}

impl CandidateFile {
    pub fn display_path(&self) -> String {
        self.path.display().to_string()
    }
}

/// Lists the files a run will read, in processing order.
pub struct FileEnumerator {
    filter: FileFilter,
    recursive: bool,
    sort_by_modified: bool,
}

impl FileEnumerator {
    pub fn new(settings: &FileSettings) -> Result<Self> {
        Ok(Self {
            filter: FileFilter::new(settings)?,
            recursive: settings.search_recursively,
            sort_by_modified: settings.sort_by_date_modified,
        })
    }

    pub fn enumerate<P: AsRef<Path>>(&self, root: P) -> Result<Vec<CandidateFile>> {
        let root_path = root.as_ref();

        if !root_path.exists() {
            return Err(SeqGrepError::InvalidPath {
                path: root_path.display().to_string(),
            });
        }

        if !root_path.is_dir() {
            return Err(SeqGrepError::InvalidPath {
                path: format!("{} is not a directory", root_path.display()),
            });
        }

        let walker = WalkDir::new(root_path)
            .min_depth(1)
            .max_depth(if self.recursive { usize::MAX } else { 1 })
            .follow_links(false)
            .sort_by_file_name();

        let mut files = Vec::new();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("Skipping unreadable entry: {}", err);
                    continue;
                }
            };

            if entry.file_type().is_dir() || !self.filter.accepts(entry.path()) {
                continue;
            }

            // follows a symlink to its target; linked directories are not descended
            let metadata = match fs::metadata(entry.path()) {
                Ok(metadata) => metadata,
                Err(err) => {
                    warn!("Cannot stat {}: {}", entry.path().display(), err);
                    continue;
                }
            };
            if !metadata.is_file() {
                continue;
            }

            files.push(CandidateFile {
                path: entry.path().to_path_buf(),
                size: metadata.len(),
                modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            });
        }

        // stable, so equal timestamps keep file-name order
        if self.sort_by_modified {
            files.sort_by_key(|f| f.modified);
        }

        debug!("Enumerated {} candidate files under {}", files.len(), root_path.display());
        Ok(files)
    }
}
