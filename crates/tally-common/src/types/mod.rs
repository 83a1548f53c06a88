//! Transaction ingestion data model
//!
//! These types cross the worker boundary as owned messages, so everything
//! here is plain data: `Clone`, serde-serializable, and free of shared state.
//! JSON field names follow the wire protocol (`totalRows`, `_rowNumber`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One tokenized line of input, positionally aligned to [`Headers`].
pub type RawRow = Vec<String>;

/// Column names taken from the first row of input.
pub type Headers = Vec<String>;

/// Outcome of validating a single row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationOutcome {
    /// Build an outcome from collected diagnostics; valid iff there are none.
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

// ============================================================================
// Transaction records
// ============================================================================

/// A typed cell value in a [`TransactionRecord`].
///
/// Serialized untagged: numbers as JSON numbers, dates as ISO-8601 strings
/// with millisecond precision, everything else as the raw string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Date(#[serde(with = "iso_millis")] DateTime<Utc>),
    Text(String),
}

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Date(d) => write!(f, "{}", iso_millis::format(d)),
            FieldValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Canonical record produced from one accepted row.
///
/// Keys are canonical column names (lowercase, whitespace runs replaced by
/// `_`). The record is immutable once built; it keeps a back-reference to the
/// 1-based source row number (the header is row 1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    #[serde(rename = "_rowNumber")]
    row_number: usize,
    #[serde(flatten)]
    fields: BTreeMap<String, FieldValue>,
}

impl TransactionRecord {
    pub fn from_fields<I>(row_number: usize, fields: I) -> Self
    where
        I: IntoIterator<Item = (String, FieldValue)>,
    {
        Self {
            row_number,
            fields: fields.into_iter().collect(),
        }
    }

    pub fn row_number(&self) -> usize {
        self.row_number
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// ============================================================================
// Parse results
// ============================================================================

/// A rejected row and every diagnostic collected for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionError {
    /// 1-based row number in the source text (header is row 1)
    pub row: usize,
    pub errors: Vec<String>,
}

/// Row counters for a finished parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionStats {
    pub total_rows: usize,
    pub valid_rows: usize,
    pub invalid_rows: usize,
}

/// Everything a single parse invocation produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionResult {
    pub headers: Headers,
    pub transactions: Vec<TransactionRecord>,
    pub errors: Vec<IngestionError>,
    pub stats: IngestionStats,
}

impl IngestionResult {
    /// Assemble a result; stats are derived so they always agree with the lists.
    pub fn new(
        headers: Headers,
        transactions: Vec<TransactionRecord>,
        errors: Vec<IngestionError>,
    ) -> Self {
        let stats = IngestionStats {
            total_rows: transactions.len() + errors.len(),
            valid_rows: transactions.len(),
            invalid_rows: errors.len(),
        };

        Self {
            headers,
            transactions,
            errors,
            stats,
        }
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// ISO-8601 UTC timestamps with millisecond precision (`2024-01-01T00:00:00.000Z`).
pub mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn format(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|d| d.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(row: usize) -> TransactionRecord {
        TransactionRecord::from_fields(
            row,
            [
                ("amount".to_string(), FieldValue::Number(4.5)),
                (
                    "date".to_string(),
                    FieldValue::Date(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
                ),
                ("description".to_string(), FieldValue::Text("Coffee".to_string())),
            ],
        )
    }

    #[test]
    fn test_validation_outcome_from_errors() {
        assert!(ValidationOutcome::from_errors(vec![]).valid);

        let outcome = ValidationOutcome::from_errors(vec!["Missing required field: date".into()]);
        assert!(!outcome.valid);
        assert_eq!(outcome.errors.len(), 1);
    }

    #[test]
    fn test_stats_derived_from_lists() {
        let result = IngestionResult::new(
            vec!["date".into(), "description".into(), "amount".into()],
            vec![record(2)],
            vec![
                IngestionError { row: 3, errors: vec!["a".into()] },
                IngestionError { row: 4, errors: vec!["b".into()] },
            ],
        );

        assert_eq!(result.stats.total_rows, 3);
        assert_eq!(result.stats.valid_rows, 1);
        assert_eq!(result.stats.invalid_rows, 2);
    }

    #[test]
    fn test_record_wire_shape() {
        let json = serde_json::to_value(record(2)).unwrap();

        assert_eq!(json["_rowNumber"], 2);
        assert_eq!(json["amount"], 4.5);
        assert_eq!(json["date"], "2024-01-01T00:00:00.000Z");
        assert_eq!(json["description"], "Coffee");
    }

    #[test]
    fn test_result_wire_shape_uses_camel_case_stats() {
        let result = IngestionResult::new(vec!["amount".into()], vec![], vec![]);
        let json: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();

        assert_eq!(json["stats"]["totalRows"], 0);
        assert!(json["stats"].get("validRows").is_some());
        assert!(json["stats"].get("invalidRows").is_some());
    }

    #[test]
    fn test_record_read_back_keeps_types() {
        let original = record(7);
        let json = serde_json::to_string(&original).unwrap();
        let parsed: TransactionRecord = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, original);
        assert!(parsed.get("date").unwrap().as_date().is_some());
        assert_eq!(parsed.get("description").unwrap().as_text(), Some("Coffee"));
    }
}
