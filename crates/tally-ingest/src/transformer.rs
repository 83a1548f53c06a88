//! Row transformation into canonical transaction records

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tally_common::types::{FieldValue, TransactionRecord};
use tracing::trace;

use crate::validator::{parse_amount, ValidatedRow};

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%m/%d/%Y %H:%M:%S"];
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%d %b %Y"];

/// Lowercase the header and join whitespace-separated words with `_`.
pub fn canonical_key(header: &str) -> String {
    header
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// Build the record for an accepted row.
///
/// Columns whose key mentions `amount` or `value` become numbers (0 when
/// unparsable), columns mentioning `date` become UTC timestamps, anything else
/// keeps its text. Cells missing from a short row are treated as empty.
pub fn transform(row: ValidatedRow<'_>, headers: &[String], row_number: usize) -> TransactionRecord {
    let cells = row.cells();

    let fields = headers.iter().enumerate().map(|(idx, header)| {
        let key = canonical_key(header);
        let raw = cells.get(idx).map(String::as_str).unwrap_or_default();
        let value = coerce(&key, raw);
        (key, value)
    });

    TransactionRecord::from_fields(row_number, fields)
}

fn coerce(key: &str, raw: &str) -> FieldValue {
    if key.contains("amount") || key.contains("value") {
        return FieldValue::Number(parse_amount(raw).unwrap_or(0.0));
    }

    if key.contains("date") {
        return match parse_date(raw) {
            Some(date) => FieldValue::Date(date),
            None => {
                trace!(key, raw, "Unrecognized date, keeping text");
                FieldValue::Text(raw.to_string())
            },
        };
    }

    FieldValue::Text(raw.to_string())
}

/// Parse a date or date-time cell as UTC.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    {
        return Some(dt.and_utc());
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
