//! Run configuration.
//!
//! Inputs come from the command line. Names are validated before any
//! cluster call so a typo fails fast instead of surfacing as a confusing
//! NotFound three checks later.

use crate::constants::{
    DEFAULT_DYNAKUBE, DEFAULT_NAMESPACE, DEFAULT_RUN_TIMEOUT, MAX_NAMESPACE_LEN,
    MAX_OBJECT_NAME_LEN, MAX_RUN_TIMEOUT,
};
use crate::error::{Error, Result};
use std::time::Duration;

/// Inputs of one troubleshoot run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TroubleshootConfig {
    /// Namespace the DynaKube lives in.
    pub namespace: String,
    /// Name of the DynaKube to inspect.
    pub dynakube: String,
    /// Deadline for the whole run.
    pub timeout: Duration,
}

impl Default for TroubleshootConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            dynakube: DEFAULT_DYNAKUBE.to_string(),
            timeout: DEFAULT_RUN_TIMEOUT,
        }
    }
}

impl TroubleshootConfig {
    /// Creates a config with the default timeout.
    pub fn new(namespace: impl Into<String>, dynakube: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            dynakube: dynakube.into(),
            timeout: DEFAULT_RUN_TIMEOUT,
        }
    }

    /// Overrides the run deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validates names and timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] when the namespace is not a DNS-1123
    /// label, the DynaKube name is not a DNS-1123 subdomain, or the timeout
    /// is zero or above [`MAX_RUN_TIMEOUT`].
    pub fn validate(&self) -> Result<()> {
        validate_dns_name("namespace", &self.namespace, MAX_NAMESPACE_LEN, false)?;
        validate_dns_name("dynakube", &self.dynakube, MAX_OBJECT_NAME_LEN, true)?;
        if self.timeout.is_zero() {
            return Err(Error::InvalidConfig("timeout must be positive".to_string()));
        }
        if self.timeout > MAX_RUN_TIMEOUT {
            return Err(Error::InvalidConfig(format!(
                "timeout of {}s exceeds the maximum of {}s",
                self.timeout.as_secs(),
                MAX_RUN_TIMEOUT.as_secs()
            )));
        }
        Ok(())
    }
}

fn validate_dns_name(field: &str, value: &str, max_len: usize, allow_dots: bool) -> Result<()> {
    if value.is_empty() {
        return Err(Error::InvalidConfig(format!("{} must not be empty", field)));
    }
    if value.len() > max_len {
        return Err(Error::InvalidConfig(format!(
            "{} '{}' exceeds {} bytes",
            field, value, max_len
        )));
    }
    let valid_chars = value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || (allow_dots && c == '.'));
    let valid_edges = value
        .chars()
        .next()
        .zip(value.chars().last())
        .is_some_and(|(first, last)| first.is_ascii_alphanumeric() && last.is_ascii_alphanumeric());

    if !valid_chars || !valid_edges {
        return Err(Error::InvalidConfig(format!(
            "{} '{}' is not a valid DNS-1123 name",
            field, value
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = TroubleshootConfig::default();
        assert_eq!(config.namespace, "dynatrace");
        assert_eq!(config.dynakube, "dynakube");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_uppercase_namespace() {
        let config = TroubleshootConfig::new("Dynatrace", "dynakube");
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn dots_allowed_only_in_dynakube_name() {
        assert!(TroubleshootConfig::new("dynatrace", "dk.prod").validate().is_ok());
        assert!(TroubleshootConfig::new("dyna.trace", "dk").validate().is_err());
    }

    #[test]
    fn rejects_trailing_dash_and_zero_timeout() {
        assert!(TroubleshootConfig::new("dynatrace-", "dk").validate().is_err());
        let zero = TroubleshootConfig::default().with_timeout(Duration::ZERO);
        assert!(zero.validate().is_err());
    }

    #[test]
    fn rejects_oversized_timeout() {
        let max = TroubleshootConfig::default().with_timeout(MAX_RUN_TIMEOUT);
        assert!(max.validate().is_ok());

        let huge = TroubleshootConfig::default().with_timeout(Duration::from_secs(u64::MAX));
        assert!(matches!(huge.validate(), Err(Error::InvalidConfig(_))));
    }
}
