//! Environment variable helpers
//!
//! Every configurable knob in the workspace is a `KEY=value` pair. An unset
//! variable and a variable set to the empty string are treated the same way.

use std::str::FromStr;

use crate::error::{EtlError, Result};

/// Read `key`, treating an empty value as unset.
pub fn var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Read `key`, falling back to `default` when unset or empty.
pub fn var_or(key: &str, default: &str) -> String {
    var(key).unwrap_or_else(|| default.to_string())
}

/// Parse `key` into `T`, falling back to `default` when unset or unparseable.
pub fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    var(key).and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

/// Parse `key` into `T`, failing when the value is present but unparseable.
pub fn parse_strict<T: FromStr>(key: &str) -> Result<Option<T>> {
    match var(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| EtlError::InvalidEnv {
                key: key.to_string(),
                value,
            }),
    }
}

/// Parse `key` as a strictly positive integer.
///
/// Non-numeric, zero and negative values are ignored and `default` is used.
pub fn positive_or(key: &str, default: usize) -> usize {
    var(key).map_or(default, |v| parse_positive(&v).unwrap_or(default))
}

/// Parse a strictly positive integer, rejecting zero, negatives and garbage.
pub fn parse_positive(value: &str) -> Option<usize> {
    match value.trim().parse::<i64>() {
        Ok(n) if n > 0 => usize::try_from(n).ok(),
        _ => None,
    }
}

/// Collects required variables so that every missing key is reported at once.
#[derive(Debug, Default)]
pub struct RequiredVars {
    missing: Vec<String>,
}

impl RequiredVars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `key`; when absent remember it and return an empty string.
    pub fn require(&mut self, key: &str) -> String {
        match var(key) {
            Some(value) => value,
            None => {
                self.missing.push(key.to_string());
                String::new()
            },
        }
    }

    /// Fail with [`EtlError::MissingEnv`] if anything was missing.
    pub fn finish(self) -> Result<()> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(EtlError::MissingEnv(self.missing))
        }
    }
}
