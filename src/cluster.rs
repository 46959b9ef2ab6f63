//! # Cluster Read View
//!
//! Read-only access to the cluster objects the checks inspect. The engine
//! never creates, updates, patches or deletes anything; the trait simply has
//! no way to express a write.
//!
//! ## Absence vs. Missing Kind
//!
//! | Situation | `get` | `list` |
//! |-----------|-------|--------|
//! | Object missing | [`ReadError::NotFound`] | empty list |
//! | CRD not registered | [`ReadError::KindNotRegistered`] | [`ReadError::KindNotRegistered`] |
//! | API failure | [`ReadError::Other`] | [`ReadError::Other`] |
//!
//! The CRD check relies on the second row being distinguishable from the
//! first.
//!
//! Two implementations exist: [`crate::kube_reader::KubeReader`] for a live
//! cluster and [`MemoryCluster`] for fixtures.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::RwLock;

/// Object kinds the engine reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// Cluster-scoped namespace.
    Namespace,
    /// The DynaKube custom resource.
    DynaKube,
    /// Core secret.
    Secret,
    /// Core config map.
    ConfigMap,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Namespace => write!(f, "Namespace"),
            Self::DynaKube => write!(f, "DynaKube"),
            Self::Secret => write!(f, "Secret"),
            Self::ConfigMap => write!(f, "ConfigMap"),
        }
    }
}

/// Named byte blobs of a secret or config map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectData {
    /// Object name.
    pub name: String,
    /// Key/value pairs. Config map strings are stored as UTF-8 bytes.
    pub data: BTreeMap<String, Vec<u8>>,
}

impl ObjectData {
    /// Creates an empty data object.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: BTreeMap::new(),
        }
    }

    /// Adds a key, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Raw value of a key.
    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.data.get(key).map(Vec::as_slice)
    }

    /// Value of a key as UTF-8, if present and valid.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| std::str::from_utf8(v).ok())
    }
}

/// An object returned by the read view.
#[derive(Debug, Clone, PartialEq)]
pub enum ClusterObject {
    /// A namespace, identified by its name.
    Namespace(String),
    /// A custom resource as its full JSON document.
    Custom(serde_json::Value),
    /// A secret.
    Secret(ObjectData),
    /// A config map.
    ConfigMap(ObjectData),
}

impl ClusterObject {
    /// Kind of this object.
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Namespace(_) => ObjectKind::Namespace,
            Self::Custom(_) => ObjectKind::DynaKube,
            Self::Secret(_) => ObjectKind::Secret,
            Self::ConfigMap(_) => ObjectKind::ConfigMap,
        }
    }

    /// Consumes the object, returning secret or config map data.
    pub fn into_data(self) -> Option<ObjectData> {
        match self {
            Self::Secret(data) | Self::ConfigMap(data) => Some(data),
            _ => None,
        }
    }

    /// Consumes the object, returning the custom resource document.
    pub fn into_custom(self) -> Option<serde_json::Value> {
        match self {
            Self::Custom(value) => Some(value),
            _ => None,
        }
    }
}

/// Failure of a read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReadError {
    /// The object does not exist.
    #[error("not found")]
    NotFound,
    /// The kind itself is unknown to the API server.
    #[error("kind not registered")]
    KindNotRegistered,
    /// Any other failure.
    #[error("{0}")]
    Other(String),
}

/// Read-only accessor for cluster objects keyed by (kind, namespace, name).
///
/// Namespaces are cluster scoped; implementations ignore the `namespace`
/// argument for [`ObjectKind::Namespace`].
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`. Checks run sequentially, so no
/// concurrent calls happen in practice.
#[async_trait]
pub trait ClusterReader: Send + Sync {
    /// Reads a single object.
    async fn get(
        &self,
        kind: ObjectKind,
        namespace: &str,
        name: &str,
    ) -> Result<ClusterObject, ReadError>;

    /// Lists all objects of a kind in a namespace.
    async fn list(&self, kind: ObjectKind, namespace: &str)
    -> Result<Vec<ClusterObject>, ReadError>;
}

type ObjectKey = (ObjectKind, String, String);

/// In-memory read view.
///
/// Holds a fixed set of objects. Kinds can be marked unregistered, and
/// individual keys can be made to fail, to reproduce API server behavior.
#[derive(Debug, Default)]
pub struct MemoryCluster {
    objects: RwLock<HashMap<ObjectKey, ClusterObject>>,
    unregistered: RwLock<HashSet<ObjectKind>>,
    failures: RwLock<HashMap<ObjectKind, String>>,
}

impl MemoryCluster {
    /// Creates an empty cluster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a namespace.
    pub fn with_namespace(self, name: &str) -> Self {
        self.insert("", ClusterObject::Namespace(name.to_string()), name);
        self
    }

    /// Adds a DynaKube document. The name is taken from `metadata.name`.
    pub fn with_dynakube(self, namespace: &str, document: serde_json::Value) -> Self {
        let name = document
            .pointer("/metadata/name")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        self.insert(namespace, ClusterObject::Custom(document), &name);
        self
    }

    /// Adds a secret.
    pub fn with_secret(self, namespace: &str, secret: ObjectData) -> Self {
        let name = secret.name.clone();
        self.insert(namespace, ClusterObject::Secret(secret), &name);
        self
    }

    /// Adds a config map.
    pub fn with_config_map(self, namespace: &str, config_map: ObjectData) -> Self {
        let name = config_map.name.clone();
        self.insert(namespace, ClusterObject::ConfigMap(config_map), &name);
        self
    }

    /// Marks a kind as not registered with the API server.
    pub fn without_kind(self, kind: ObjectKind) -> Self {
        if let Ok(mut unregistered) = self.unregistered.write() {
            unregistered.insert(kind);
        }
        self
    }

    /// Makes every read of a kind fail with the given reason.
    pub fn failing(self, kind: ObjectKind, reason: &str) -> Self {
        if let Ok(mut failures) = self.failures.write() {
            failures.insert(kind, reason.to_string());
        }
        self
    }

    fn insert(&self, namespace: &str, object: ClusterObject, name: &str) {
        let kind = object.kind();
        let namespace = scope_namespace(kind, namespace);
        if let Ok(mut objects) = self.objects.write() {
            objects.insert((kind, namespace, name.to_string()), object);
        }
    }

    fn precheck(&self, kind: ObjectKind) -> Result<(), ReadError> {
        let failures = self
            .failures
            .read()
            .map_err(|e| ReadError::Other(e.to_string()))?;
        if let Some(reason) = failures.get(&kind) {
            return Err(ReadError::Other(reason.clone()));
        }
        let unregistered = self
            .unregistered
            .read()
            .map_err(|e| ReadError::Other(e.to_string()))?;
        if unregistered.contains(&kind) {
            return Err(ReadError::KindNotRegistered);
        }
        Ok(())
    }
}

fn scope_namespace(kind: ObjectKind, namespace: &str) -> String {
    match kind {
        ObjectKind::Namespace => String::new(),
        _ => namespace.to_string(),
    }
}

#[async_trait]
impl ClusterReader for MemoryCluster {
    async fn get(
        &self,
        kind: ObjectKind,
        namespace: &str,
        name: &str,
    ) -> Result<ClusterObject, ReadError> {
        self.precheck(kind)?;
        let objects = self
            .objects
            .read()
            .map_err(|e| ReadError::Other(e.to_string()))?;
        objects
            .get(&(kind, scope_namespace(kind, namespace), name.to_string()))
            .cloned()
            .ok_or(ReadError::NotFound)
    }

    async fn list(
        &self,
        kind: ObjectKind,
        namespace: &str,
    ) -> Result<Vec<ClusterObject>, ReadError> {
        self.precheck(kind)?;
        let objects = self
            .objects
            .read()
            .map_err(|e| ReadError::Other(e.to_string()))?;
        let namespace = scope_namespace(kind, namespace);
        let mut found: Vec<(&String, &ClusterObject)> = objects
            .iter()
            .filter(|((k, ns, _), _)| *k == kind && *ns == namespace)
            .map(|((_, _, name), object)| (name, object))
            .collect();
        found.sort_by(|a, b| a.0.cmp(b.0));
        Ok(found.into_iter().map(|(_, o)| o.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_object_is_not_found() {
        let cluster = MemoryCluster::new().with_namespace("dynatrace");
        let err = cluster
            .get(ObjectKind::Secret, "dynatrace", "nope")
            .await
            .unwrap_err();
        assert_eq!(err, ReadError::NotFound);
    }

    #[tokio::test]
    async fn unregistered_kind_is_distinguishable() {
        let cluster = MemoryCluster::new().without_kind(ObjectKind::DynaKube);
        let list = cluster.list(ObjectKind::DynaKube, "dynatrace").await;
        let get = cluster.get(ObjectKind::DynaKube, "dynatrace", "dk").await;
        assert_eq!(list.unwrap_err(), ReadError::KindNotRegistered);
        assert_eq!(get.unwrap_err(), ReadError::KindNotRegistered);
    }

    #[tokio::test]
    async fn namespaces_ignore_namespace_argument() {
        let cluster = MemoryCluster::new().with_namespace("dynatrace");
        let found = cluster
            .get(ObjectKind::Namespace, "whatever", "dynatrace")
            .await
            .unwrap();
        assert_eq!(found, ClusterObject::Namespace("dynatrace".to_string()));
    }

    #[tokio::test]
    async fn list_is_scoped_to_namespace() {
        let cluster = MemoryCluster::new()
            .with_secret("a", ObjectData::new("s1"))
            .with_secret("b", ObjectData::new("s2"));
        let listed = cluster.list(ObjectKind::Secret, "a").await.unwrap();
        assert_eq!(listed.len(), 1);
    }
}
