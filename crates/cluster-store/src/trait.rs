//! ClusterStore trait for mocking
//!
//! This trait abstracts the Kubernetes API behind a kind-scoped CRUD surface.
//! [`KubeStore`](crate::KubeStore) implements it against a live cluster and
//! tests use [`MockClusterStore`](crate::mock::MockClusterStore).

use crate::error::StoreError;
use crate::kind::ResourceKind;
use kube::api::DynamicObject;

/// Kind-scoped CRUD operations on namespaced cluster objects
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait ClusterStore: Send + Sync {
    /// Creates an object. Fails with [`StoreError::AlreadyExists`] when an
    /// object of that kind and name is already present.
    async fn create(&self, kind: &ResourceKind, namespace: &str, object: &DynamicObject) -> Result<DynamicObject, StoreError>;

    /// Fetches an object by name. Fails with [`StoreError::NotFound`] when absent.
    async fn get(&self, kind: &ResourceKind, namespace: &str, name: &str) -> Result<DynamicObject, StoreError>;

    /// Lists objects matching a label selector (`key=value[,key=value]`).
    async fn list(&self, kind: &ResourceKind, namespace: &str, label_selector: &str) -> Result<Vec<DynamicObject>, StoreError>;

    /// Replaces an existing object, identified by `object.metadata.name`.
    async fn update(&self, kind: &ResourceKind, namespace: &str, object: &DynamicObject) -> Result<DynamicObject, StoreError>;

    /// Deletes an object by name.
    async fn delete(&self, kind: &ResourceKind, namespace: &str, name: &str) -> Result<(), StoreError>;

    /// Deletes every object matching a label selector.
    async fn delete_collection(&self, kind: &ResourceKind, namespace: &str, label_selector: &str) -> Result<(), StoreError>;

    /// Merge-patches the status subresource with `status`.
    async fn patch_status(&self, kind: &ResourceKind, namespace: &str, name: &str, status: &serde_json::Value) -> Result<(), StoreError>;
}
