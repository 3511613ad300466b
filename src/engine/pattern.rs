use crate::config::{CommonPattern, UniquePattern};
use crate::error::{Result, SeqGrepError};
use regex::Regex;

/// Synthetic first field of every table.
pub const LINE_ID_FIELD: &str = "line_id";

/// Immutable description of one named extraction pattern.
#[derive(Debug, Clone)]
pub struct PatternSpec {
    table_name: String,
    key_substring: String,
    expression: Regex,
    field_names: Vec<String>,
}

impl PatternSpec {
    /// Compiles `regexp_source` anchored to the whole line and checks that it
    /// captures exactly one group per entry of `capture_fields`.
    pub fn new<S: Into<String>>(
        table_name: S,
        key_substring: S,
        regexp_source: &str,
        capture_fields: Vec<String>,
    ) -> Result<Self> {
        let table_name = table_name.into();
        let expression = Regex::new(&anchored_expression(regexp_source)).map_err(|source| {
            SeqGrepError::InvalidPattern {
                table_name: table_name.clone(),
                source,
            }
        })?;

        // captures_len counts the implicit whole-match group
        let groups = expression.captures_len() - 1;
        if groups != capture_fields.len() {
            return Err(SeqGrepError::FieldCountMismatch {
                table_name,
                fields: capture_fields.len(),
                groups,
            });
        }

        let mut field_names = Vec::with_capacity(capture_fields.len() + 1);
        field_names.push(LINE_ID_FIELD.to_string());
        field_names.extend(capture_fields);

        Ok(Self {
            table_name,
            key_substring: key_substring.into(),
            expression,
            field_names,
        })
    }

    /// Builds a pattern from the shared prefix and one unique pattern. Common
    /// captures come first, so common field names precede unique ones.
    pub fn compose(common: &CommonPattern, unique: &UniquePattern) -> Result<Self> {
        let source = format!("{}{}", common.regexp_pattern, unique.regexp_pattern);
        let fields = common
            .field_names
            .iter()
            .chain(unique.field_names.iter())
            .cloned()
            .collect();

        Self::new(
            unique.table_name.as_str(),
            unique.key_substring.as_str(),
            &source,
            fields,
        )
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn key_substring(&self) -> &str {
        &self.key_substring
    }

    pub fn expression(&self) -> &Regex {
        &self.expression
    }

    /// `line_id` followed by one name per capture group.
    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    pub fn capture_count(&self) -> usize {
        self.field_names.len() - 1
    }
}

pub fn anchored_expression(source: &str) -> String {
    format!("^(?:{})$", source)
}
