use crate::engine::diagnostics::{DiagnosticKind, DiagnosticLog};
use crate::engine::pattern::PatternSpec;
use std::cell::Cell;
use std::rc::Rc;

/// Run-wide source of line identities.
///
/// Cloning yields another handle to the same counter, which is how every
/// matcher of a run shares one sequence. Identities start at 0.
#[derive(Debug, Clone, Default)]
pub struct LineIdSequence {
    next: Rc<Cell<u64>>,
}

impl LineIdSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&self) -> u64 {
        let id = self.next.get();
        self.next.set(id + 1);
        id
    }

    /// Number of identities handed out so far.
    pub fn issued(&self) -> u64 {
        self.next.get()
    }

    pub fn last_allocated(&self) -> Option<u64> {
        self.issued().checked_sub(1)
    }

    pub fn reset(&self) {
        self.next.set(0);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub line_id: u64,
    pub captures: Vec<String>,
}

/// One pattern plus the rows it has collected so far.
#[derive(Debug)]
pub struct Matcher {
    spec: PatternSpec,
    sequence: LineIdSequence,
    rows: Vec<Row>,
}

impl Matcher {
    pub fn new(spec: PatternSpec, sequence: &LineIdSequence) -> Self {
        Self {
            spec,
            sequence: sequence.clone(),
            rows: Vec::new(),
        }
    }

    /// Returns true when the line was recorded as a new row.
    ///
    /// Lines without the key substring are rejected before the expression is
    /// evaluated. A line that has the substring but does not match adds one
    /// mismatch entry to `log`.
    pub fn classify_and_record(&mut self, line: &str, log: &mut DiagnosticLog) -> bool {
        let line = trim_line_ending(line);

        if !line.contains(self.spec.key_substring()) {
            return false;
        }

        let Some(captures) = self.spec.expression().captures(line) else {
            log.record(
                DiagnosticKind::LineMismatch,
                format!(
                    "Pattern '{}' failed with keyword '{}' on line '{}'",
                    self.spec.expression().as_str(),
                    self.spec.key_substring(),
                    line
                ),
            );
            return false;
        };

        let fields = captures
            .iter()
            .skip(1)
            .map(|group| group.map_or_else(String::new, |m| m.as_str().to_string()))
            .collect();

        self.rows.push(Row {
            line_id: self.sequence.allocate(),
            captures: fields,
        });
        true
    }

    pub fn spec(&self) -> &PatternSpec {
        &self.spec
    }

    pub fn table_name(&self) -> &str {
        self.spec.table_name()
    }

    pub fn field_names(&self) -> &[String] {
        self.spec.field_names()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

fn trim_line_ending(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}
