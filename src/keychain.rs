//! # Registry Keychain
//!
//! Resolves registry credentials from a pull secret's `.dockerconfigjson`:
//!
//! ```json
//! {
//!   "auths": {
//!     "tenant.example.com": { "username": "u", "password": "p", "auth": "dTpw" }
//!   }
//! }
//! ```
//!
//! Lookups match the registry host exactly, then keys written with a scheme
//! or path (`https://tenant.example.com/v1/`). A host without an entry, or
//! whose entry carries no username/password (e.g. only `identitytoken`),
//! resolves to anonymous credentials.

use crate::cluster::ObjectData;
use crate::constants::DOCKER_CONFIG_JSON_KEY;
use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use oci_distribution::secrets::RegistryAuth;
use serde::Deserialize;
use std::collections::BTreeMap;

/// One entry of `auths`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DockerAuthEntry {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Base64 of `username:password`.
    #[serde(default)]
    pub auth: Option<String>,
}

/// The docker config document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DockerConfig {
    pub auths: BTreeMap<String, DockerAuthEntry>,
}

impl DockerConfig {
    /// Parses the JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedPullSecret`] for invalid JSON or a missing
    /// `auths` map. Entries without usable credentials are kept and resolve
    /// to anonymous.
    pub fn parse(secret: &str, raw: &[u8]) -> Result<Self> {
        serde_json::from_slice(raw).map_err(|e| Error::MalformedPullSecret {
            secret: secret.to_string(),
            reason: e.to_string(),
        })
    }
}

impl DockerAuthEntry {
    /// Username and password, from explicit fields or the `auth` blob.
    pub fn credentials(&self) -> Option<(String, String)> {
        if let (Some(user), Some(pass)) = (&self.username, &self.password) {
            return Some((user.clone(), pass.clone()));
        }
        let decoded = STANDARD.decode(self.auth.as_deref()?.trim()).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (user, pass) = decoded.split_once(':')?;
        Some((user.to_string(), pass.to_string()))
    }
}

/// Per-registry credential resolver.
#[derive(Debug, Clone, Default)]
pub struct Keychain {
    config: DockerConfig,
}

/// Strips scheme and path from a registry key.
fn normalize_host(key: &str) -> &str {
    let without_scheme = key
        .strip_prefix("https://")
        .or_else(|| key.strip_prefix("http://"))
        .unwrap_or(key);
    without_scheme.split('/').next().unwrap_or(without_scheme)
}

impl Keychain {
    /// Builds a keychain from a parsed docker config.
    pub fn new(config: DockerConfig) -> Self {
        Self { config }
    }

    /// Builds a keychain from a pull secret.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingPullSecretField`] if `.dockerconfigjson` is absent
    /// - [`Error::MalformedPullSecret`] if its content is not a docker config
    pub fn from_secret(secret: &ObjectData) -> Result<Self> {
        let raw = secret
            .get(DOCKER_CONFIG_JSON_KEY)
            .ok_or_else(|| Error::MissingPullSecretField {
                secret: secret.name.clone(),
                field: DOCKER_CONFIG_JSON_KEY.to_string(),
            })?;
        Ok(Self::new(DockerConfig::parse(&secret.name, raw)?))
    }

    /// Registries with an entry, as written in the secret.
    pub fn registries(&self) -> impl Iterator<Item = &str> {
        self.config.auths.keys().map(String::as_str)
    }

    /// Resolves credentials for a registry host (`host[:port]`).
    pub fn resolve(&self, registry: &str) -> RegistryAuth {
        let entry = self.config.auths.get(registry).or_else(|| {
            self.config
                .auths
                .iter()
                .find(|(key, _)| normalize_host(key) == registry)
                .map(|(_, entry)| entry)
        });

        match entry.and_then(DockerAuthEntry::credentials) {
            Some((user, pass)) => RegistryAuth::Basic(user, pass),
            None => RegistryAuth::Anonymous,
        }
    }
}

/// Value of an `Authorization` header for the given credentials.
pub fn basic_authorization(auth: &RegistryAuth) -> Option<String> {
    match auth {
        RegistryAuth::Basic(user, pass) => Some(format!(
            "Basic {}",
            STANDARD.encode(format!("{}:{}", user, pass))
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_blob_decodes_to_basic() {
        let entry = DockerAuthEntry {
            auth: Some(STANDARD.encode("user:secret")),
            ..Default::default()
        };
        assert_eq!(
            entry.credentials(),
            Some(("user".to_string(), "secret".to_string()))
        );
    }

    #[test]
    fn scheme_prefixed_keys_match_host() {
        assert_eq!(normalize_host("https://index.docker.io/v1/"), "index.docker.io");
        assert_eq!(normalize_host("host:5000"), "host:5000");
    }

    #[test]
    fn basic_header_encodes_pair() {
        let header = basic_authorization(&RegistryAuth::Basic("u".into(), "p".into()));
        assert_eq!(header.as_deref(), Some("Basic dTpw"));
        assert_eq!(basic_authorization(&RegistryAuth::Anonymous), None);
    }
}
