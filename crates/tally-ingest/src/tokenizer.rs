//! Quote-aware line tokenizer
//!
//! Input is split on `\n` before any quote handling, so a quoted field that
//! contains a newline is split across two rows. Rows stay one-per-line, which
//! keeps row numbers aligned with line numbers of non-empty lines.

use tally_common::types::RawRow;

pub const DELIMITER: char = ',';
pub const QUOTE: char = '"';

/// Tokenize a full payload, skipping lines that are blank after trimming.
pub fn tokenize(text: &str) -> Vec<RawRow> {
    text.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(tokenize_line)
        .collect()
}

/// Tokenize one line.
///
/// A `"` toggles quoting and is never copied into the field; a delimiter
/// outside quotes ends the field. Fields are trimmed.
pub fn tokenize_line(line: &str) -> RawRow {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            QUOTE => in_quotes = !in_quotes,
            DELIMITER if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            },
            _ => current.push(ch),
        }
    }
    fields.push(current.trim().to_string());

    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_delimiter_stays_in_field() {
        let row = tokenize_line(r#""Smith, John",100,"2024-01-01""#);
        assert_eq!(row, vec!["Smith, John", "100", "2024-01-01"]);
    }

    #[test]
    fn test_trailing_delimiter_yields_empty_field() {
        assert_eq!(tokenize_line("a,b,"), vec!["a", "b", ""]);
    }

    #[test]
    fn test_blank_lines_and_crlf_are_skipped() {
        let rows = tokenize("date,amount\r\n\r\n2024-01-01,5\r\n   \n");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["date", "amount"]);
        assert_eq!(rows[1], vec!["2024-01-01", "5"]);
    }

    #[test]
    fn test_embedded_newline_splits_row() {
        let rows = tokenize("\"multi\nline\",1");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["multi"]);
        // The closing quote reopens quoting on the second line.
        assert_eq!(rows[1], vec!["line,1"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("\n\n").is_empty());
    }
}
