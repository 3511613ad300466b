pub mod diagnostics;
pub mod matcher;
pub mod pattern;
pub mod pattern_set;

pub use diagnostics::{DiagnosticEntry, DiagnosticKind, DiagnosticLog, LOG_FILE_NAME};
pub use matcher::{LineIdSequence, Matcher, Row};
pub use pattern::{PatternSpec, LINE_ID_FIELD};
pub use pattern_set::PatternSet;
