//! # Image Reference Parsing
//!
//! Splits image strings into `{registry, repository, tag}`. Two syntactic
//! families are accepted through two entry points:
//!
//! | Parser | Shape | Used for |
//! |--------|-------|----------|
//! | [`parse_vendor_image`] | `<registry>/linux/<component>[:<tag>]` | URLs derived from `apiUrl` |
//! | [`parse_custom_image`] | `<registry>/<path>[:<tag>\|@<digest>]` | user overrides |
//!
//! A single permissive grammar is ambiguous for port-bearing registries
//! (`host:5000/repo` vs. `repo:tag`). Vendor paths carry the fixed `/linux`
//! segment, which anchors the split; custom paths split at the first `/`.
//!
//! A missing tag is `latest`; probes never default on their own.

use crate::constants::{DEFAULT_IMAGE_TAG, MAX_IMAGE_REF_LEN};
use crate::error::{Error, Result};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// A parsed image reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageReference {
    /// Registry host, optionally with port.
    pub registry: String,
    /// Repository path inside the registry.
    pub repository: String,
    /// Tag, or digest (`sha256:...`) for digest references.
    pub tag: String,
}

impl ImageReference {
    /// Whether the tag slot holds a digest.
    pub fn is_digest(&self) -> bool {
        self.tag.contains(':')
    }

    /// Path of the manifest endpoint for this reference.
    pub fn manifest_path(&self) -> String {
        format!("/v2/{}/manifests/{}", self.repository, self.tag)
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let separator = if self.is_digest() { '@' } else { ':' };
        write!(
            f,
            "{}/{}{}{}",
            self.registry, self.repository, separator, self.tag
        )
    }
}

fn vendor_registry_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.*)/linux.*$").expect("static regex"))
}

fn vendor_remainder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^.*/(linux.*)$").expect("static regex"))
}

fn invalid(image: &str, reason: impl Into<String>) -> Error {
    Error::InvalidImage {
        image: image.to_string(),
        reason: reason.into(),
    }
}

fn check_length(image: &str) -> Result<()> {
    if image.len() > MAX_IMAGE_REF_LEN {
        return Err(invalid(
            image,
            format!("exceeds {} bytes", MAX_IMAGE_REF_LEN),
        ));
    }
    if image.chars().any(char::is_whitespace) {
        return Err(invalid(image, "contains whitespace"));
    }
    Ok(())
}

/// Parses `<registry>/linux/<component>[:<tag>]`.
///
/// # Errors
///
/// Returns [`Error::InvalidImage`] when the `/linux` anchor is absent or
/// either side of it is empty.
pub fn parse_vendor_image(image: &str) -> Result<ImageReference> {
    check_length(image)?;

    let registry = vendor_registry_regex()
        .captures(image)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| invalid(image, "no registry before '/linux'"))?;
    let remainder = vendor_remainder_regex()
        .captures(image)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| invalid(image, "no '/linux' path segment"))?;

    if registry.is_empty() {
        return Err(invalid(image, "empty registry"));
    }

    let mut parts = remainder.splitn(2, ':');
    let repository = parts.next().unwrap_or_default();
    let tag = match parts.next() {
        Some("") => return Err(invalid(image, "empty tag")),
        Some(tag) => tag,
        None => DEFAULT_IMAGE_TAG,
    };

    Ok(ImageReference {
        registry: registry.to_string(),
        repository: repository.to_string(),
        tag: tag.to_string(),
    })
}

/// Parses `<registry>/<path>[:<tag>]` or `<registry>/<path>@<digest>`.
///
/// The registry is everything before the first `/`. The tag is split off
/// the last path segment only, so a port in the registry is never taken
/// for a tag.
///
/// # Errors
///
/// Returns [`Error::InvalidImage`] when the registry or repository is empty.
pub fn parse_custom_image(image: &str) -> Result<ImageReference> {
    check_length(image)?;

    let (registry, rest) = image
        .split_once('/')
        .ok_or_else(|| invalid(image, "no '/' between registry and repository"))?;
    if registry.is_empty() {
        return Err(invalid(image, "empty registry"));
    }

    let segment_start = rest.rfind('/').map_or(0, |i| i + 1);
    let (path, last) = rest.split_at(segment_start);

    let (name, tag) = if let Some((name, digest)) = last.split_once('@') {
        // the digest pins the manifest; a tag beside it is dropped
        let name = name.split_once(':').map_or(name, |(name, _)| name);
        (name, digest)
    } else if let Some((name, tag)) = last.split_once(':') {
        (name, tag)
    } else {
        (last, DEFAULT_IMAGE_TAG)
    };

    let repository = format!("{}{}", path, name);
    if name.is_empty() || repository.is_empty() {
        return Err(invalid(image, "empty repository"));
    }
    if tag.is_empty() {
        return Err(invalid(image, "empty tag"));
    }

    Ok(ImageReference {
        registry: registry.to_string(),
        repository,
        tag: tag.to_string(),
    })
}
