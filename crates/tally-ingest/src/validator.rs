//! Row validation
//!
//! Validation is row-local and never aborts a parse: a failing row becomes an
//! `IngestionError` and the executor moves on.

use tally_common::types::ValidationOutcome;

/// Fields every transaction row must carry, matched by header substring.
pub const REQUIRED_FIELDS: [&str; 3] = ["date", "description", "amount"];

/// Validate one row against the headers.
///
/// Every required field is checked even after an earlier one fails, so the
/// outcome lists all problems with the row at once.
pub fn validate(row: &[String], headers: &[String]) -> ValidationOutcome {
    let mut errors = Vec::new();

    for field in REQUIRED_FIELDS {
        let present = find_column(headers, field)
            .and_then(|idx| row.get(idx))
            .is_some_and(|cell| !cell.trim().is_empty());

        if !present {
            errors.push(format!("Missing required field: {}", field));
        }
    }

    if let Some(cell) = find_column(headers, "amount").and_then(|idx| row.get(idx)) {
        if !cell.trim().is_empty() && parse_amount(cell).is_none() {
            errors.push(format!("Invalid amount: {}", cell));
        }
    }

    ValidationOutcome::from_errors(errors)
}

/// Index of the first header whose lowercased text contains `field`.
pub fn find_column(headers: &[String], field: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.to_lowercase().contains(field))
}

/// Parse a currency cell, ignoring `,` and `$`. Only finite numbers count.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|c| !matches!(c, ',' | '$')).collect();

    cleaned
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

/// A row that has passed [`validate`].
///
/// The transformer only accepts this type, so a row can never be transformed
/// without having been validated first.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedRow<'a> {
    cells: &'a [String],
}

impl<'a> ValidatedRow<'a> {
    /// Validate `row`, returning the accepted row or the failed outcome.
    pub fn check(
        row: &'a [String],
        headers: &[String],
    ) -> std::result::Result<Self, ValidationOutcome> {
        let outcome = validate(row, headers);
        if outcome.valid {
            Ok(Self { cells: row })
        } else {
            Err(outcome)
        }
    }

    pub fn cells(&self) -> &'a [String] {
        self.cells
    }
}
