//! Tests for the registry probe.
//!
//! Validates the two-step HEAD algorithm and its error-kind mapping.

mod common;

use common::{Script, ScriptedTransport, docker_config};
use dynakube_troubleshoot::{
    DockerConfig, Error, HttpResponse, Keychain, RegistryProbe, TransportError,
    parse_custom_image, parse_vendor_image,
};
use reqwest::Method;
use std::sync::Arc;

const HOST: &str = "registry.example.com";
const MANIFEST: &str = "/v2/linux/oneagent/manifests/latest";

fn keychain() -> Keychain {
    let raw = docker_config(HOST, "user", "pass");
    Keychain::new(DockerConfig::parse("pull", raw.as_bytes()).unwrap())
}

fn probe(script: &Arc<Script>, keychain: Keychain) -> RegistryProbe {
    RegistryProbe::new(
        Arc::new(ScriptedTransport::new(script.clone(), None)),
        keychain,
    )
}

fn reference() -> dynakube_troubleshoot::ImageReference {
    parse_vendor_image("registry.example.com/linux/oneagent").unwrap()
}

// =============================================================================
// Success Tests
// =============================================================================

#[tokio::test]
async fn test_probe_heads_base_then_manifest() {
    let script = Script::new();
    script.respond(Method::HEAD, HOST, "/v2/", HttpResponse::status(200));
    script.respond(Method::HEAD, HOST, MANIFEST, HttpResponse::status(200));

    probe(&script, keychain()).probe(&reference()).await.unwrap();

    let sent = script.recorded();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].path(), "/v2/");
    assert_eq!(sent[1].path(), MANIFEST);
    assert!(sent.iter().all(|r| r.request.method == Method::HEAD));
    assert!(sent[1].request.header_value("Accept").is_some());
    assert_eq!(sent[0].request.url.scheme(), "https");
}

#[tokio::test]
async fn test_probe_sends_credentials_on_first_request() {
    let script = Script::new();
    script.respond(Method::HEAD, HOST, "/v2/", HttpResponse::status(200));
    script.respond(Method::HEAD, HOST, MANIFEST, HttpResponse::status(200));

    probe(&script, keychain()).probe(&reference()).await.unwrap();

    let first = &script.recorded()[0];
    // base64("user:pass")
    assert_eq!(
        first.request.header_value("Authorization"),
        Some("Basic dXNlcjpwYXNz")
    );
}

#[tokio::test]
async fn test_probe_without_entry_is_anonymous() {
    let script = Script::new();
    script.respond(Method::HEAD, HOST, "/v2/", HttpResponse::status(200));
    script.respond(Method::HEAD, HOST, MANIFEST, HttpResponse::status(200));

    probe(&script, Keychain::default())
        .probe(&reference())
        .await
        .unwrap();

    assert!(script
        .recorded()
        .iter()
        .all(|r| r.request.header_value("Authorization").is_none()));
}

// =============================================================================
// Failure Mapping Tests
// =============================================================================

#[tokio::test]
async fn test_base_non_2xx_is_unreachable() {
    let script = Script::new();
    script.respond(Method::HEAD, HOST, "/v2/", HttpResponse::status(502));

    let err = probe(&script, keychain()).probe(&reference()).await.unwrap_err();
    assert!(matches!(err, Error::RegistryUnreachable { .. }));
    // the manifest is never requested
    assert_eq!(script.recorded().len(), 1);
}

#[tokio::test]
async fn test_transport_error_is_unreachable() {
    let script = Script::new();
    script.fail(Method::HEAD, HOST, "/v2/", TransportError::Timeout);

    let err = probe(&script, keychain()).probe(&reference()).await.unwrap_err();
    match err {
        Error::RegistryUnreachable { registry, .. } => assert_eq!(registry, HOST),
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_unauthorized_on_either_step() {
    for status in [401, 403] {
        let script = Script::new();
        script.respond(Method::HEAD, HOST, "/v2/", HttpResponse::status(status));
        let err = probe(&script, keychain()).probe(&reference()).await.unwrap_err();
        assert_eq!(err.kind(), "RegistryUnauthorized");

        let script = Script::new();
        script.respond(Method::HEAD, HOST, "/v2/", HttpResponse::status(200));
        script.respond(Method::HEAD, HOST, MANIFEST, HttpResponse::status(status));
        let err = probe(&script, keychain()).probe(&reference()).await.unwrap_err();
        assert_eq!(err.kind(), "RegistryUnauthorized");
    }
}

#[tokio::test]
async fn test_missing_manifest_is_image_not_found() {
    let script = Script::new();
    script.respond(Method::HEAD, HOST, "/v2/", HttpResponse::status(200));

    let err = probe(&script, keychain()).probe(&reference()).await.unwrap_err();
    match err {
        Error::ImageNotFound { image, status } => {
            assert_eq!(image, "registry.example.com/linux/oneagent:latest");
            assert_eq!(status, 404);
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_manifest_url_for_port_and_digest() {
    let script = Script::new();
    let reference = parse_custom_image("registry.local:5000/dt/cm@sha256:ab").unwrap();
    let url = probe(&script, Keychain::default())
        .manifest_url(&reference)
        .unwrap();
    assert_eq!(
        url.as_str(),
        "https://registry.local:5000/v2/dt/cm/manifests/sha256:ab"
    );
}
