use std::path::Path;

use serde_json::{Map, Value};

use crate::core::{InspectError, Result};

/// Field holding the text to classify.
pub const INPUT_FIELD: &str = "input";
/// Field holding the ground-truth label.
pub const CATEGORY_FIELD: &str = "category";

/// One row of a dataset: named fields with arbitrary JSON values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Convenience constructor for the common `input` / `category` shape.
    pub fn labeled(input: impl Into<String>, category: impl Into<Value>) -> Self {
        let mut fields = Map::new();
        fields.insert(INPUT_FIELD.to_string(), Value::String(input.into()));
        fields.insert(CATEGORY_FIELD.to_string(), category.into());
        Self { fields }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Value of `name`, or [`InspectError::MissingField`].
    ///
    /// A record does not know its position, so errors report index 0;
    /// the [`Dataset`] accessors replace it with the row index.
    pub fn field(&self, name: &str) -> Result<&Value> {
        self.get(name).ok_or_else(|| InspectError::MissingField {
            index: 0,
            field: name.to_string(),
        })
    }

    /// Text of the `input` field; it must be a string.
    pub fn input(&self) -> Result<&str> {
        match self.field(INPUT_FIELD)? {
            Value::String(text) => Ok(text),
            other => Err(InspectError::InvalidField {
                index: 0,
                field: INPUT_FIELD.to_string(),
                reason: format!("expected a string, found {other}"),
            }),
        }
    }

    /// The `category` field, stringified with [`display_value`].
    pub fn category(&self) -> Result<String> {
        self.field(CATEGORY_FIELD).map(display_value)
    }
}

/// Rewrite the row position of a field error raised by a [`Record`].
fn at_row(err: InspectError, index: usize) -> InspectError {
    match err {
        InspectError::MissingField { field, .. } => InspectError::MissingField { index, field },
        InspectError::InvalidField { field, reason, .. } => InspectError::InvalidField {
            index,
            field,
            reason,
        },
        other => other,
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

/// Stringify a cell the way a dataframe prints it: strings verbatim, `null`
/// as `None`, anything else as JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}

/// An ordered, positionally indexed collection of records.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Parse a JSON array of objects.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let rows: Vec<Map<String, Value>> = serde_json::from_str(json)?;
        Ok(rows.into_iter().map(Record::from).collect())
    }

    /// Parse JSON Lines: one object per line, blank lines skipped.
    pub fn from_jsonl_str(jsonl: &str) -> Result<Self> {
        jsonl
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(number, line)| {
                serde_json::from_str::<Map<String, Value>>(line)
                    .map(Record::from)
                    .map_err(|e| {
                        InspectError::InvalidInput(format!("line {}: {e}", number + 1))
                    })
            })
            .collect()
    }

    /// Load a `.json` or `.jsonl` / `.ndjson` file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        let content = std::fs::read_to_string(path)?;
        let dataset = match extension.as_deref() {
            Some("json") => Self::from_json_str(&content)?,
            Some("jsonl") | Some("ndjson") => Self::from_jsonl_str(&content)?,
            _ => {
                return Err(InspectError::InvalidInput(format!(
                    "unsupported dataset format {path:?}, expected .json, .jsonl or .ndjson"
                )))
            }
        };

        tracing::debug!(path = ?path, rows = dataset.len(), "loaded dataset");
        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The record at `index`, or [`InspectError::IndexOutOfRange`].
    pub fn get(&self, index: usize) -> Result<&Record> {
        self.records.get(index).ok_or(InspectError::IndexOutOfRange {
            index,
            len: self.records.len(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    /// Value of `field` in the record at `index`.
    pub fn field(&self, index: usize, field: &str) -> Result<&Value> {
        self.get(index)?.field(field).map_err(|e| at_row(e, index))
    }

    /// Text of the `input` field at `index`; it must be a string.
    pub fn input(&self, index: usize) -> Result<&str> {
        self.get(index)?.input().map_err(|e| at_row(e, index))
    }

    /// The `category` field at `index`, stringified.
    pub fn category(&self, index: usize) -> Result<String> {
        self.get(index)?.category().map_err(|e| at_row(e, index))
    }
}

impl FromIterator<Record> for Dataset {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Dataset {
        Dataset::from_json_str(
            r#"[
                {"input": "We are hiring a Rust engineer", "category": "jobs"},
                {"input": "Congrats on the promotion!", "category": 7},
                {"input": 42, "category": null},
                {"category": "orphan"}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn reads_input_and_category() {
        let ds = sample();
        assert_eq!(ds.len(), 4);
        assert_eq!(ds.input(0).unwrap(), "We are hiring a Rust engineer");
        assert_eq!(ds.category(0).unwrap(), "jobs");
    }

    #[test]
    fn non_string_categories_are_stringified() {
        let ds = sample();
        assert_eq!(ds.category(1).unwrap(), "7");
        assert_eq!(ds.category(2).unwrap(), "None");
    }

    #[test]
    fn record_accessors_work_without_a_dataset() {
        let record = Record::labeled("hello", json!(null));
        assert_eq!(record.input().unwrap(), "hello");
        assert_eq!(record.category().unwrap(), "None");
        assert_eq!(record.field("input").unwrap(), &json!("hello"));

        let bare = Record::default();
        assert!(matches!(
            bare.field("category"),
            Err(InspectError::MissingField { index: 0, ref field }) if field == "category"
        ));
    }

    #[test]
    fn dataset_errors_carry_the_row_index() {
        let ds = sample();
        assert!(matches!(
            ds.category(3),
            Ok(ref c) if c == "orphan"
        ));
        assert!(matches!(
            ds.field(1, "missing"),
            Err(InspectError::MissingField { index: 1, ref field }) if field == "missing"
        ));
        assert!(matches!(
            ds.get(2).unwrap().input(),
            Err(InspectError::InvalidField { index: 0, .. })
        ));
    }

    #[test]
    fn iterates_records_in_order() {
        let ds = sample();
        let inputs: Vec<Option<&str>> = ds.iter().map(|r| r.input().ok()).collect();
        assert_eq!(
            inputs,
            vec![
                Some("We are hiring a Rust engineer"),
                Some("Congrats on the promotion!"),
                None,
                None
            ]
        );
    }

    #[test]
    fn index_past_the_end_is_out_of_range() {
        let ds = sample();
        let err = ds.input(4).unwrap_err();
        assert!(matches!(
            err,
            InspectError::IndexOutOfRange { index: 4, len: 4 }
        ));
    }

    #[test]
    fn missing_and_mistyped_fields() {
        let ds = sample();
        assert!(matches!(
            ds.input(3),
            Err(InspectError::MissingField { index: 3, .. })
        ));
        assert!(matches!(
            ds.input(2),
            Err(InspectError::InvalidField { index: 2, .. })
        ));
    }

    #[test]
    fn jsonl_skips_blank_lines_and_reports_bad_ones() {
        let ds = Dataset::from_jsonl_str(
            "{\"input\": \"a\", \"category\": \"x\"}\n\n{\"input\": \"b\", \"category\": \"y\"}\n",
        )
        .unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.input(1).unwrap(), "b");

        let err = Dataset::from_jsonl_str("{\"input\": \"a\"}\nnot json").unwrap_err();
        assert!(err.to_string().starts_with("line 2:"));
    }

    #[test]
    fn loads_files_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let jsonl = dir.path().join("rows.jsonl");
        std::fs::write(&jsonl, "{\"input\": \"hello\", \"category\": \"greeting\"}\n").unwrap();
        assert_eq!(Dataset::from_path(&jsonl).unwrap().category(0).unwrap(), "greeting");

        let csv = dir.path().join("rows.csv");
        std::fs::write(&csv, "input,category\n").unwrap();
        assert!(matches!(
            Dataset::from_path(&csv),
            Err(InspectError::InvalidInput(_))
        ));
    }

    #[test]
    fn labeled_records_round_out_the_shape() {
        let record = Record::labeled("hi", json!("greeting"));
        assert_eq!(record.get("input"), Some(&json!("hi")));
        assert_eq!(display_value(record.get("category").unwrap()), "greeting");
    }
}
