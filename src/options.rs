//! String options collected before a resource is initialized.
//!
//! ADBC 1.0.0 only carries string options across the boundary. The bridge
//! gathers them in an [`Options`] map and hands the map to the driver's
//! constructor; drivers use the typed accessors to interpret values.

use std::collections::HashMap;

use adbc_core::error::{Error as AdbcError, Result as AdbcResult, Status};

/// Well-known option keys defined by the ADBC specification.
pub mod keys {
    pub const URI: &str = "uri";
    pub const USERNAME: &str = "username";
    pub const PASSWORD: &str = "password";
    pub const AUTOCOMMIT: &str = "adbc.connection.autocommit";
    pub const READ_ONLY: &str = "adbc.connection.readonly";
    pub const ISOLATION_LEVEL: &str = "adbc.connection.transaction.isolation_level";
    pub const INGEST_TARGET_TABLE: &str = "adbc.ingest.target_table";
    pub const INGEST_MODE: &str = "adbc.ingest.mode";
}

/// Option values accepted for boolean options.
pub const OPTION_VALUE_ENABLED: &str = "true";
pub const OPTION_VALUE_DISABLED: &str = "false";

/// Pending key/value options for a resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    values: HashMap<String, String>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Raw string value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Value of `key`, or an `InvalidArguments` error naming the missing key.
    pub fn require(&self, key: &str) -> AdbcResult<&str> {
        self.get(key).ok_or_else(|| {
            AdbcError::with_message_and_status(
                format!("Required option '{}' is not set", key),
                Status::InvalidArguments,
            )
        })
    }

    /// Parse `key` as a boolean (`true`/`false`).
    pub fn get_bool(&self, key: &str) -> AdbcResult<Option<bool>> {
        match self.get(key) {
            None => Ok(None),
            Some(OPTION_VALUE_ENABLED) => Ok(Some(true)),
            Some(OPTION_VALUE_DISABLED) => Ok(Some(false)),
            Some(other) => Err(AdbcError::with_message_and_status(
                format!(
                    "Invalid value '{}' for option '{}': expected '{}' or '{}'",
                    other, key, OPTION_VALUE_ENABLED, OPTION_VALUE_DISABLED
                ),
                Status::InvalidArguments,
            )),
        }
    }

    /// Parse `key` as a signed integer.
    pub fn get_i64(&self, key: &str) -> AdbcResult<Option<i64>> {
        self.get(key)
            .map(|raw| {
                raw.parse::<i64>().map_err(|e| {
                    AdbcError::with_message_and_status(
                        format!("Invalid value '{}' for option '{}': {}", raw, key, e),
                        Status::InvalidArguments,
                    )
                })
            })
            .transpose()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Options {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut options = Options::new();
        for (key, value) in iter {
            options.set(key, value);
        }
        options
    }
}
