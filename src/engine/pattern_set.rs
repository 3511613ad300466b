use crate::config::Settings;
use crate::engine::diagnostics::DiagnosticLog;
use crate::engine::matcher::{LineIdSequence, Matcher};
use crate::engine::pattern::PatternSpec;
use crate::error::{Result, SeqGrepError};
use std::collections::HashSet;

/// Matchers in priority order. A line lands in at most one table.
#[derive(Debug)]
pub struct PatternSet {
    matchers: Vec<Matcher>,
    sequence: LineIdSequence,
}

impl PatternSet {
    /// Compiles every unique pattern against the common prefix. Any
    /// compilation failure aborts construction.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let specs = settings
            .patterns
            .iter()
            .map(|unique| PatternSpec::compose(&settings.common, unique))
            .collect::<Result<Vec<_>>>()?;

        Self::with_sequence(specs, LineIdSequence::new())
    }

    pub fn with_sequence(specs: Vec<PatternSpec>, sequence: LineIdSequence) -> Result<Self> {
        let mut seen = HashSet::new();
        for spec in &specs {
            if !seen.insert(spec.table_name().to_string()) {
                return Err(SeqGrepError::DuplicateTable {
                    table_name: spec.table_name().to_string(),
                });
            }
        }

        let matchers = specs
            .into_iter()
            .map(|spec| Matcher::new(spec, &sequence))
            .collect();

        Ok(Self { matchers, sequence })
    }

    /// Index of the matcher that recorded the line, if any.
    pub fn classify(&mut self, line: &str, log: &mut DiagnosticLog) -> Option<usize> {
        self.matchers
            .iter_mut()
            .position(|matcher| matcher.classify_and_record(line, log))
    }

    pub fn matchers(&self) -> &[Matcher] {
        &self.matchers
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    pub fn total_rows(&self) -> usize {
        self.matchers.iter().map(Matcher::row_count).sum()
    }

    pub fn sequence(&self) -> &LineIdSequence {
        &self.sequence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CommonPattern, UniquePattern};

    fn settings() -> Settings {
        let mut settings = Settings::default();
        settings.common = CommonPattern {
            field_names: vec!["level".to_string()],
            regexp_pattern: r"\[(\w+)\] ".to_string(),
        };
        settings.patterns = vec![
            UniquePattern {
                table_name: "disk".to_string(),
                key_substring: "disk".to_string(),
                field_names: vec!["device".to_string()],
                regexp_pattern: r"disk (\w+) full".to_string(),
            },
            UniquePattern {
                table_name: "errors".to_string(),
                key_substring: "ERROR".to_string(),
                field_names: vec!["message".to_string()],
                regexp_pattern: "(.*)".to_string(),
            },
        ];
        settings
    }

    #[test]
    fn test_first_match_wins() {
        let mut set = PatternSet::from_settings(&settings()).unwrap();
        let mut log = DiagnosticLog::new();

        assert_eq!(set.classify("[ERROR] disk sda full", &mut log), Some(0));
        assert_eq!(set.matchers()[0].row_count(), 1);
        assert_eq!(set.matchers()[1].row_count(), 0);
        assert_eq!(set.total_rows(), 1);
    }

    #[test]
    fn test_mismatch_falls_through_to_later_patterns() {
        let mut set = PatternSet::from_settings(&settings()).unwrap();
        let mut log = DiagnosticLog::new();

        // "disk" is present but the disk pattern does not match
        assert_eq!(set.classify("[ERROR] disk quota exceeded", &mut log), Some(1));
        assert_eq!(log.len(), 1);
        assert_eq!(set.matchers()[1].rows()[0].captures[1], "disk quota exceeded");
    }

    #[test]
    fn test_unmatched_line_is_dropped() {
        let mut set = PatternSet::from_settings(&settings()).unwrap();
        let mut log = DiagnosticLog::new();

        assert_eq!(set.classify("[INFO] all good", &mut log), None);
        assert_eq!(set.total_rows(), 0);
        assert!(log.is_empty());
    }

    #[test]
    fn test_line_ids_are_global_across_tables() {
        let mut set = PatternSet::from_settings(&settings()).unwrap();
        let mut log = DiagnosticLog::new();

        set.classify("[ERROR] first", &mut log);
        set.classify("[WARN] disk sdb full", &mut log);
        set.classify("[ERROR] second", &mut log);

        let error_ids: Vec<u64> = set.matchers()[1].rows().iter().map(|r| r.line_id).collect();
        let disk_ids: Vec<u64> = set.matchers()[0].rows().iter().map(|r| r.line_id).collect();
        assert_eq!(error_ids, vec![0, 2]);
        assert_eq!(disk_ids, vec![1]);
        assert_eq!(set.sequence().last_allocated(), Some(2));
    }

    #[test]
    fn test_invalid_pattern_aborts_construction() {
        let mut settings = settings();
        settings.patterns[1].regexp_pattern = "([".to_string();

        let err = PatternSet::from_settings(&settings).unwrap_err();
        assert!(matches!(err, SeqGrepError::InvalidPattern { ref table_name, .. } if table_name == "errors"));
    }

    #[test]
    fn test_duplicate_tables_rejected() {
        let spec = PatternSpec::new("t", "k", "(.*)", vec!["x".to_string()]).unwrap();
        let result = PatternSet::with_sequence(vec![spec.clone(), spec], LineIdSequence::new());
        assert!(matches!(result, Err(SeqGrepError::DuplicateTable { .. })));
    }
}
