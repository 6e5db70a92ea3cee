//! Configuration helpers
//!
//! Configuration structs across the workspace are loaded from environment
//! variables. They read through an [`EnvSource`] so tests can supply a plain
//! map instead of mutating the process environment.

use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

/// Error raised while reading a configuration variable
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvError {
    /// Variable is required but not set
    #[error("{0} not set")]
    Missing(String),

    /// Variable is set but could not be parsed
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

/// Source of configuration variables
pub trait EnvSource {
    /// Look up a raw value; empty values count as unset
    fn var(&self, key: &str) -> Option<String>;

    /// Required string value
    fn required(&self, key: &str) -> Result<String, EnvError> {
        self.var(key).ok_or_else(|| EnvError::Missing(key.to_string()))
    }

    /// Optional value parsed with `FromStr`
    fn parsed<T>(&self, key: &str) -> Result<Option<T>, EnvError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.var(key)
            .map(|raw| {
                raw.trim().parse::<T>().map_err(|e| EnvError::Invalid {
                    key: key.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }
}

/// The process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.is_empty())
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).filter(|v| !v.is_empty()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_required_missing() {
        let source = env(&[("EMPTY", "")]);
        assert_eq!(
            source.required("EMPTY"),
            Err(EnvError::Missing("EMPTY".to_string()))
        );
    }

    #[test]
    fn test_parsed_values() {
        let source = env(&[("PORT", " 8080 "), ("BAD", "eighty")]);
        assert_eq!(source.parsed::<u16>("PORT"), Ok(Some(8080)));
        assert_eq!(source.parsed::<u16>("ABSENT"), Ok(None));
        assert!(matches!(
            source.parsed::<u16>("BAD"),
            Err(EnvError::Invalid { .. })
        ));
    }
}
