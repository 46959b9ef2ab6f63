//! Tests for constants module.
//!
//! Validates defaults, limits and the names shared with the cluster and the
//! tenant API.

use dynakube_troubleshoot::constants::*;

// =============================================================================
// Default Tests
// =============================================================================

#[test]
fn test_run_timeout_reasonable() {
    assert!(DEFAULT_RUN_TIMEOUT.as_secs() >= 30, "run deadline too short for slow tenants");
    assert!(DEFAULT_RUN_TIMEOUT.as_secs() <= 600, "run deadline too long for an interactive tool");
    assert!(DEFAULT_RUN_TIMEOUT <= MAX_RUN_TIMEOUT);
}

#[test]
fn test_default_names_fit_limits() {
    assert!(DEFAULT_NAMESPACE.len() <= MAX_NAMESPACE_LEN);
    assert!(DEFAULT_DYNAKUBE.len() + PULL_SECRET_SUFFIX.len() <= MAX_OBJECT_NAME_LEN);
    assert!(MAX_NAMESPACE_LEN < MAX_OBJECT_NAME_LEN);
}

// =============================================================================
// Size Limit Tests
// =============================================================================

#[test]
fn test_image_ref_length_reasonable() {
    // "registry.example.com:5000/namespace/image@sha256:<64 hex>" must fit
    assert!(MAX_IMAGE_REF_LEN >= 256, "image ref limit too restrictive");
    assert!(MAX_IMAGE_REF_LEN <= 1024, "image ref limit too permissive");
}

// =============================================================================
// Path Tests
// =============================================================================

#[test]
fn test_tenant_paths_are_relative_to_api_url() {
    for path in [LATEST_AGENT_VERSION_PATH, TOKEN_LOOKUP_PATH] {
        assert!(path.starts_with("/v1/"), "{}", path);
        assert!(!path.starts_with(API_URL_SUFFIX), "{}", path);
    }
}

#[test]
fn test_registry_paths() {
    assert_eq!(REGISTRY_API_BASE, "/v2/");
    assert_eq!(REGISTRY_SCHEME, "https");
    assert!(MANIFEST_ACCEPT.contains("application/vnd.oci.image.manifest.v1+json"));
    assert!(MANIFEST_ACCEPT.contains("application/vnd.docker.distribution.manifest.v2+json"));
}

#[test]
fn test_proxy_env_vars_cover_both_cases() {
    for name in ["HTTP_PROXY", "HTTPS_PROXY", "NO_PROXY"] {
        assert!(PROXY_ENV_VARS.contains(&name));
        assert!(PROXY_ENV_VARS.contains(&name.to_ascii_lowercase().as_str()));
    }
}
