//! Live-cluster implementation of [`ClusterReader`].
//!
//! Uses typed `kube` APIs for core objects and a `DynamicObject` API for the
//! DynaKube so the engine does not depend on a generated CRD type. Only
//! `get` and `list` are ever issued.

use crate::cluster::{ClusterObject, ClusterReader, ObjectData, ObjectKind, ReadError};
use crate::constants::{DYNAKUBE_GROUP, DYNAKUBE_KIND, DYNAKUBE_PLURAL, DYNAKUBE_VERSION};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ConfigMap, Namespace, Secret};
use kube::api::{Api, ApiResource, DynamicObject, ListParams};
use kube::Client;
use std::collections::BTreeMap;
use tracing::debug;

/// Reads objects from the API server the client is configured for.
#[derive(Clone)]
pub struct KubeReader {
    client: Client,
    dynakube: ApiResource,
}

impl KubeReader {
    /// Wraps an existing client.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            dynakube: dynakube_resource(),
        }
    }

    /// Connects using the local kubeconfig or the in-cluster service account.
    pub async fn try_default() -> Result<Self, ReadError> {
        let client = Client::try_default()
            .await
            .map_err(|e| ReadError::Other(format!("failed to create kubernetes client: {}", e)))?;
        Ok(Self::new(client))
    }

    fn dynakubes(&self, namespace: &str) -> Api<DynamicObject> {
        Api::namespaced_with(self.client.clone(), namespace, &self.dynakube)
    }
}

fn dynakube_resource() -> ApiResource {
    ApiResource {
        group: DYNAKUBE_GROUP.to_string(),
        version: DYNAKUBE_VERSION.to_string(),
        api_version: format!("{}/{}", DYNAKUBE_GROUP, DYNAKUBE_VERSION),
        kind: DYNAKUBE_KIND.to_string(),
        plural: DYNAKUBE_PLURAL.to_string(),
    }
}

/// Maps a `get` failure. A 404 on a single object means the object is absent.
fn map_get_error(err: kube::Error) -> ReadError {
    match err {
        kube::Error::Api(response) if response.code == 404 => ReadError::NotFound,
        other => ReadError::Other(other.to_string()),
    }
}

/// Maps a `list` failure. A 404 on a collection means the resource type
/// itself is not served, i.e. the CRD is not registered.
fn map_list_error(err: kube::Error) -> ReadError {
    match err {
        kube::Error::Api(response) if response.code == 404 => ReadError::KindNotRegistered,
        other => ReadError::Other(other.to_string()),
    }
}

fn secret_data(secret: Secret) -> ObjectData {
    let name = secret.metadata.name.unwrap_or_default();
    let mut data: BTreeMap<String, Vec<u8>> = secret
        .data
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| (k, v.0))
        .collect();
    // stringData is write-only on the server, but fixtures may carry it
    for (k, v) in secret.string_data.unwrap_or_default() {
        data.entry(k).or_insert_with(|| v.into_bytes());
    }
    ObjectData { name, data }
}

fn config_map_data(config_map: ConfigMap) -> ObjectData {
    let name = config_map.metadata.name.unwrap_or_default();
    let mut data: BTreeMap<String, Vec<u8>> = config_map
        .data
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| (k, v.into_bytes()))
        .collect();
    for (k, v) in config_map.binary_data.unwrap_or_default() {
        data.entry(k).or_insert(v.0);
    }
    ObjectData { name, data }
}

fn custom_document(object: DynamicObject) -> Result<ClusterObject, ReadError> {
    serde_json::to_value(object)
        .map(ClusterObject::Custom)
        .map_err(|e| ReadError::Other(format!("failed to encode custom resource: {}", e)))
}

#[async_trait]
impl ClusterReader for KubeReader {
    async fn get(
        &self,
        kind: ObjectKind,
        namespace: &str,
        name: &str,
    ) -> Result<ClusterObject, ReadError> {
        debug!("get {} {}/{}", kind, namespace, name);
        match kind {
            ObjectKind::Namespace => {
                let api: Api<Namespace> = Api::all(self.client.clone());
                let ns = api.get(name).await.map_err(map_get_error)?;
                Ok(ClusterObject::Namespace(ns.metadata.name.unwrap_or_default()))
            }
            ObjectKind::DynaKube => {
                // 404 here is ambiguous between kind and instance; crdRegistered lists first
                let object = self
                    .dynakubes(namespace)
                    .get(name)
                    .await
                    .map_err(map_get_error)?;
                custom_document(object)
            }
            ObjectKind::Secret => {
                let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
                let secret = api.get(name).await.map_err(map_get_error)?;
                Ok(ClusterObject::Secret(secret_data(secret)))
            }
            ObjectKind::ConfigMap => {
                let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);
                let config_map = api.get(name).await.map_err(map_get_error)?;
                Ok(ClusterObject::ConfigMap(config_map_data(config_map)))
            }
        }
    }

    async fn list(
        &self,
        kind: ObjectKind,
        namespace: &str,
    ) -> Result<Vec<ClusterObject>, ReadError> {
        debug!("list {} in {}", kind, namespace);
        let params = ListParams::default();
        match kind {
            ObjectKind::Namespace => {
                let api: Api<Namespace> = Api::all(self.client.clone());
                let list = api.list(&params).await.map_err(map_list_error)?;
                Ok(list
                    .items
                    .into_iter()
                    .map(|ns| ClusterObject::Namespace(ns.metadata.name.unwrap_or_default()))
                    .collect())
            }
            ObjectKind::DynaKube => {
                let list = self
                    .dynakubes(namespace)
                    .list(&params)
                    .await
                    .map_err(map_list_error)?;
                list.items.into_iter().map(custom_document).collect()
            }
            ObjectKind::Secret => {
                let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
                let list = api.list(&params).await.map_err(map_list_error)?;
                Ok(list
                    .items
                    .into_iter()
                    .map(|s| ClusterObject::Secret(secret_data(s)))
                    .collect())
            }
            ObjectKind::ConfigMap => {
                let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);
                let list = api.list(&params).await.map_err(map_list_error)?;
                Ok(list
                    .items
                    .into_iter()
                    .map(|c| ClusterObject::ConfigMap(config_map_data(c)))
                    .collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::ByteString;
    use kube::core::ErrorResponse;

    fn api_error(code: u16) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: "boom".to_string(),
            reason: "NotFound".to_string(),
            code,
        })
    }

    #[test]
    fn not_found_on_get_vs_list() {
        assert_eq!(map_get_error(api_error(404)), ReadError::NotFound);
        assert_eq!(map_list_error(api_error(404)), ReadError::KindNotRegistered);
        assert!(matches!(map_get_error(api_error(403)), ReadError::Other(_)));
    }

    #[test]
    fn secret_bytes_are_preserved() {
        let mut data = BTreeMap::new();
        data.insert("apiToken".to_string(), ByteString(b"abc".to_vec()));
        let secret = Secret {
            metadata: kube::api::ObjectMeta {
                name: Some("dynakube".to_string()),
                ..Default::default()
            },
            data: Some(data),
            ..Default::default()
        };
        let converted = secret_data(secret);
        assert_eq!(converted.name, "dynakube");
        assert_eq!(converted.get_str("apiToken"), Some("abc"));
    }

    #[test]
    fn dynakube_resource_is_namespaced_v1beta1() {
        let resource = dynakube_resource();
        assert_eq!(resource.api_version, "dynatrace.com/v1beta1");
        assert_eq!(resource.plural, "dynakubes");
    }
}
