//! Environment variable helpers shared by the binaries.
//!
//! Library crates never read the environment themselves; the CLI resolves
//! settings here and passes typed values down.

use crate::error::{Result, TallyError};
use std::str::FromStr;

/// Read `key` and parse it, falling back to `default` when unset.
///
/// A variable that is set but fails to parse is a configuration error rather
/// than a silent fallback.
pub fn var_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| TallyError::config(format!("{key}={raw:?} is invalid: {e}"))),
        Err(_) => Ok(default),
    }
}

/// Read `key` as a string, falling back to `default` when unset or empty.
pub fn string_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_var_or_default_when_unset() {
        std::env::remove_var("TALLY_TEST_UNSET_VAR");
        let value: usize = var_or("TALLY_TEST_UNSET_VAR", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_var_or_parses_value() {
        std::env::set_var("TALLY_TEST_CHUNK", " 250 ");
        let value: usize = var_or("TALLY_TEST_CHUNK", 1000).unwrap();
        assert_eq!(value, 250);
        std::env::remove_var("TALLY_TEST_CHUNK");
    }

    #[test]
    fn test_var_or_rejects_garbage() {
        std::env::set_var("TALLY_TEST_BAD", "lots");
        let err = var_or::<u64>("TALLY_TEST_BAD", 1).unwrap_err();
        assert!(err.to_string().contains("TALLY_TEST_BAD"));
        std::env::remove_var("TALLY_TEST_BAD");
    }

    #[test]
    fn test_string_or_ignores_blank() {
        std::env::set_var("TALLY_TEST_BLANK", "   ");
        assert_eq!(string_or("TALLY_TEST_BLANK", "fallback"), "fallback");
        std::env::remove_var("TALLY_TEST_BLANK");
    }
}
