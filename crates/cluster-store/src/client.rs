//! Kubernetes-backed [`ClusterStore`].

use crate::error::StoreError;
use crate::kind::ResourceKind;
use crate::store_trait::ClusterStore;
use kube::api::{Api, DeleteParams, DynamicObject, ListParams, Patch, PatchParams, PostParams};
use kube::Client;
use serde_json::json;
use tracing::debug;

/// Cluster store talking to the Kubernetes API server
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    /// Creates a store on top of an existing kube client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, kind: &ResourceKind, namespace: &str) -> Api<DynamicObject> {
        Api::namespaced_with(self.client.clone(), namespace, &kind.api_resource())
    }
}

fn object_name(kind: &ResourceKind, object: &DynamicObject) -> Result<String, StoreError> {
    object
        .metadata
        .name
        .clone()
        .ok_or_else(|| StoreError::InvalidObject(format!("{} object has no metadata.name", kind.kind)))
}

// Objects are removed immediately, matching what the controller expects
// when it tears an app down.
fn immediate_delete() -> DeleteParams {
    DeleteParams::default().grace_period(0)
}

#[async_trait::async_trait]
impl ClusterStore for KubeStore {
    async fn create(&self, kind: &ResourceKind, namespace: &str, object: &DynamicObject) -> Result<DynamicObject, StoreError> {
        let name = object_name(kind, object)?;
        debug!("Creating {} {}/{}", kind.kind, namespace, name);
        self.api(kind, namespace)
            .create(&PostParams::default(), object)
            .await
            .map_err(|e| StoreError::from_kube(e, format!("{} '{}'", kind.kind, name)))
    }

    async fn get(&self, kind: &ResourceKind, namespace: &str, name: &str) -> Result<DynamicObject, StoreError> {
        self.api(kind, namespace)
            .get(name)
            .await
            .map_err(|e| StoreError::from_kube(e, format!("{} '{}'", kind.kind, name)))
    }

    async fn list(&self, kind: &ResourceKind, namespace: &str, label_selector: &str) -> Result<Vec<DynamicObject>, StoreError> {
        let lp = ListParams::default().labels(label_selector);
        let list = self
            .api(kind, namespace)
            .list(&lp)
            .await
            .map_err(|e| StoreError::from_kube(e, format!("{} matching '{}'", kind.plural, label_selector)))?;
        Ok(list.items)
    }

    async fn update(&self, kind: &ResourceKind, namespace: &str, object: &DynamicObject) -> Result<DynamicObject, StoreError> {
        let name = object_name(kind, object)?;
        debug!("Updating {} {}/{}", kind.kind, namespace, name);
        self.api(kind, namespace)
            .replace(&name, &PostParams::default(), object)
            .await
            .map_err(|e| StoreError::from_kube(e, format!("{} '{}'", kind.kind, name)))
    }

    async fn delete(&self, kind: &ResourceKind, namespace: &str, name: &str) -> Result<(), StoreError> {
        debug!("Deleting {} {}/{}", kind.kind, namespace, name);
        self.api(kind, namespace)
            .delete(name, &immediate_delete())
            .await
            .map_err(|e| StoreError::from_kube(e, format!("{} '{}'", kind.kind, name)))?;
        Ok(())
    }

    async fn delete_collection(&self, kind: &ResourceKind, namespace: &str, label_selector: &str) -> Result<(), StoreError> {
        debug!("Deleting {} in {} matching {}", kind.plural, namespace, label_selector);
        let lp = ListParams::default().labels(label_selector);
        self.api(kind, namespace)
            .delete_collection(&immediate_delete(), &lp)
            .await
            .map_err(|e| StoreError::from_kube(e, format!("{} matching '{}'", kind.plural, label_selector)))?;
        Ok(())
    }

    async fn patch_status(&self, kind: &ResourceKind, namespace: &str, name: &str, status: &serde_json::Value) -> Result<(), StoreError> {
        let patch = json!({ "status": status });
        self.api(kind, namespace)
            .patch_status(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(|e| StoreError::from_kube(e, format!("{} '{}'", kind.kind, name)))?;
        Ok(())
    }
}
