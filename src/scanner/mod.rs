pub mod file_enumerator;
pub mod file_filter;
pub mod line_source;

pub use file_enumerator::{CandidateFile, FileEnumerator};
pub use file_filter::FileFilter;
pub use line_source::{DecodedLines, LineSource, SourceLine};
