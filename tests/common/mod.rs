//! Shared fixtures: a scripted transport, a recording factory and a cluster
//! seeded for the default DynaKube.

#![allow(dead_code)]

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use dynakube_troubleshoot::{
    HttpRequest, HttpResponse, HttpTransport, MemoryCluster, ObjectData, Result, RunContext,
    TransportError, TransportFactory, TransportSettings, TroubleshootConfig,
};
use reqwest::Method;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use url::Url;

pub const NAMESPACE: &str = "dynatrace";
pub const DYNAKUBE: &str = "dynakube";
pub const API_URL: &str = "https://tenant.example.com/api";
pub const REGISTRY: &str = "tenant.example.com";
pub const VERSION_PATH: &str = "/api/v1/deployment/installer/agent/unix/default/latest/metainfo";
pub const LOOKUP_PATH: &str = "/api/v1/tokens/lookup";
pub const FULLSTACK_MANIFEST: &str = "/v2/linux/oneagent/manifests/latest";

// =============================================================================
// Scripted Transport
// =============================================================================

/// A request as the transport saw it, with the proxy it resolved.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub request: HttpRequest,
    pub proxy: Option<Url>,
}

impl Recorded {
    pub fn path(&self) -> &str {
        self.request.url.path()
    }
}

#[derive(Clone)]
enum Reply {
    Response(HttpResponse),
    Error(TransportError),
}

struct Route {
    method: Method,
    host: String,
    path: String,
    reply: Reply,
}

/// Routes shared by every transport a factory builds. Unrouted requests
/// answer 404.
#[derive(Default)]
pub struct Script {
    routes: Mutex<Vec<Route>>,
    recorded: Mutex<Vec<Recorded>>,
}

impl Script {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push(&self, method: Method, host: &str, path: &str, reply: Reply) {
        self.routes.lock().unwrap().insert(
            0,
            Route {
                method,
                host: host.to_string(),
                path: path.to_string(),
                reply,
            },
        );
    }

    /// Answers `method host path`. Later routes shadow earlier ones.
    pub fn respond(&self, method: Method, host: &str, path: &str, response: HttpResponse) {
        self.push(method, host, path, Reply::Response(response));
    }

    /// Fails `method host path` below HTTP.
    pub fn fail(&self, method: Method, host: &str, path: &str, error: TransportError) {
        self.push(method, host, path, Reply::Error(error));
    }

    pub fn recorded(&self) -> Vec<Recorded> {
        self.recorded.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.recorded()
            .into_iter()
            .filter(|r| r.path() == path)
            .collect()
    }

    fn answer(&self, request: &HttpRequest) -> Reply {
        let routes = self.routes.lock().unwrap();
        routes
            .iter()
            .find(|r| {
                r.method == request.method
                    && request.url.host_str() == Some(r.host.as_str())
                    && request.url.path() == r.path
            })
            .map(|r| r.reply.clone())
            .unwrap_or(Reply::Response(HttpResponse::status(404)))
    }
}

/// Transport answering from a [`Script`] and reporting a fixed proxy.
pub struct ScriptedTransport {
    script: Arc<Script>,
    proxy: Option<Url>,
}

impl ScriptedTransport {
    pub fn new(script: Arc<Script>, proxy: Option<Url>) -> Self {
        Self { script, proxy }
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> std::result::Result<HttpResponse, TransportError> {
        let reply = self.script.answer(&request);
        self.script.recorded.lock().unwrap().push(Recorded {
            proxy: self.proxy_for(&request.url),
            request,
        });
        match reply {
            Reply::Response(response) => Ok(response),
            Reply::Error(error) => Err(error),
        }
    }

    fn proxy_for(&self, _url: &Url) -> Option<Url> {
        self.proxy.clone()
    }
}

/// Factory handing out scripted transports and recording their settings.
pub struct RecordingFactory {
    script: Arc<Script>,
    built: Mutex<Vec<TransportSettings>>,
}

impl RecordingFactory {
    pub fn new(script: Arc<Script>) -> Arc<Self> {
        Arc::new(Self {
            script,
            built: Mutex::new(Vec::new()),
        })
    }

    pub fn built(&self) -> Vec<TransportSettings> {
        self.built.lock().unwrap().clone()
    }
}

impl TransportFactory for RecordingFactory {
    fn build(&self, settings: &TransportSettings) -> Result<Arc<dyn HttpTransport>> {
        self.built.lock().unwrap().push(settings.clone());
        Ok(Arc::new(ScriptedTransport::new(
            self.script.clone(),
            settings.proxy.clone(),
        )))
    }
}

// =============================================================================
// Tenant / Registry Scripts
// =============================================================================

pub fn version_body(version: &str) -> HttpResponse {
    HttpResponse::with_body(200, json!({ "latestAgentVersion": version }).to_string())
}

pub fn scopes_body(scopes: &[&str]) -> HttpResponse {
    HttpResponse::with_body(200, json!({ "scopes": scopes }).to_string())
}

/// Tenant and registry answering like the happy path.
pub fn happy_script() -> Arc<Script> {
    let script = Script::new();
    script.respond(Method::GET, REGISTRY, VERSION_PATH, version_body("1.242.0"));
    script.respond(
        Method::POST,
        REGISTRY,
        LOOKUP_PATH,
        scopes_body(&["InstallerDownload", "DataExport"]),
    );
    script.respond(Method::HEAD, REGISTRY, "/v2/", HttpResponse::status(200));
    script.respond(Method::HEAD, REGISTRY, FULLSTACK_MANIFEST, HttpResponse::status(200));
    script
}

// =============================================================================
// Cluster Fixtures
// =============================================================================

pub fn dynakube_document(spec: Value) -> Value {
    json!({
        "apiVersion": "dynatrace.com/v1beta1",
        "kind": "DynaKube",
        "metadata": { "name": DYNAKUBE, "namespace": NAMESPACE },
        "spec": spec,
    })
}

/// Fullstack DynaKube against the test tenant.
pub fn default_spec() -> Value {
    json!({
        "apiUrl": API_URL,
        "oneAgent": { "classicFullStack": {} },
    })
}

pub fn docker_config(registry: &str, username: &str, password: &str) -> String {
    json!({
        "auths": {
            registry: {
                "username": username,
                "password": password,
                "auth": STANDARD.encode(format!("{}:{}", username, password)),
            }
        }
    })
    .to_string()
}

pub fn credentials_secret() -> ObjectData {
    ObjectData::new(DYNAKUBE)
        .with("apiToken", "abc")
        .with("paasToken", "def")
}

pub fn pull_secret() -> ObjectData {
    ObjectData::new("dynakube-pull-secret").with(
        ".dockerconfigjson",
        docker_config(REGISTRY, "dynakube", "secret"),
    )
}

/// Namespace, DynaKube with `spec`, tokens and pull secret.
pub fn cluster_with(spec: Value) -> MemoryCluster {
    MemoryCluster::new()
        .with_namespace(NAMESPACE)
        .with_dynakube(NAMESPACE, dynakube_document(spec))
        .with_secret(NAMESPACE, credentials_secret())
        .with_secret(NAMESPACE, pull_secret())
}

pub fn context(cluster: MemoryCluster, factory: Arc<RecordingFactory>) -> RunContext {
    RunContext::new(
        &TroubleshootConfig::new(NAMESPACE, DYNAKUBE),
        Arc::new(cluster),
        factory,
    )
}
