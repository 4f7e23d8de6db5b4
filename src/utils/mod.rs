//! Small shared helpers.

use crate::{Error, ErrorContext, Result};

/// Read and parse an environment variable. Unset is `Ok(None)`; a value that
/// does not parse is a configuration error naming the variable.
pub(crate) fn env_parse<V: std::str::FromStr>(key: &str, source: &str) -> Result<Option<V>> {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<V>().map(Some).map_err(|_| {
            Error::configuration_with_context(
                format!("{} is not a valid value", raw),
                ErrorContext::new().with_field_path(key).with_source(source),
            )
        }),
        Err(_) => Ok(None),
    }
}
