//! Workload-level operations built on [`ClusterStore`].
//!
//! These are the calls the WebApp controller makes against the cluster:
//! fetching and writing back the app's DeploymentConfig, finding its pod and
//! tearing down everything labelled with the app label.

use crate::error::StoreError;
use crate::kind::ResourceKind;
use crate::store_trait::ClusterStore;
use k8s_openapi::api::core::v1::Pod;
use kube::api::DynamicObject;
use tracing::{debug, info};

/// Label selector matching every object owned by an app.
pub fn owner_selector(app_label: &str) -> String {
    format!("app={}", app_label)
}

/// Label selector matching the pods rolled out by an app's DeploymentConfig.
pub fn pod_selector(app_label: &str) -> String {
    format!("deploymentconfig={}", app_label)
}

/// Fetches the named DeploymentConfig.
pub async fn get_workload(store: &dyn ClusterStore, namespace: &str, name: &str) -> Result<DynamicObject, StoreError> {
    store.get(&ResourceKind::deployment_config(), namespace, name).await
}

/// Writes a DeploymentConfig back to the cluster.
pub async fn update_workload(store: &dyn ClusterStore, namespace: &str, workload: &DynamicObject) -> Result<(), StoreError> {
    store
        .update(&ResourceKind::deployment_config(), namespace, workload)
        .await?;
    Ok(())
}

/// Returns the first pod rolled out for `app_label`.
pub async fn get_pod(store: &dyn ClusterStore, namespace: &str, app_label: &str) -> Result<Pod, StoreError> {
    let selector = pod_selector(app_label);
    let pod = store
        .list(&ResourceKind::pod(), namespace, &selector)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| StoreError::NotFound(format!("pod matching '{}'", selector)))?;

    Ok(serde_json::from_value(serde_json::to_value(pod)?)?)
}

/// Deletes the app's DeploymentConfigs, its Service and its Routes.
///
/// Stops at the first failure. A Service that is already gone counts as
/// deleted, so teardown can run again after a partial failure.
pub async fn delete_all(store: &dyn ClusterStore, namespace: &str, app_label: &str) -> Result<(), StoreError> {
    let selector = owner_selector(app_label);

    store
        .delete_collection(&ResourceKind::deployment_config(), namespace, &selector)
        .await?;
    match store.delete(&ResourceKind::service(), namespace, app_label).await {
        Err(e) if e.is_not_found() => debug!("Service '{}' already gone from {}", app_label, namespace),
        other => other?,
    }
    store
        .delete_collection(&ResourceKind::route(), namespace, &selector)
        .await?;

    info!("Deleted resources labelled {} in {}", selector, namespace);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockClusterStore, Operation};
    use serde_json::json;

    fn pod(name: &str, label: &str, phase: &str) -> DynamicObject {
        serde_json::from_value(json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": {
                "name": name,
                "namespace": "test",
                "labels": {"deploymentconfig": label}
            },
            "status": {"phase": phase, "podIP": "172.1.0.3"}
        }))
        .unwrap()
    }

    fn labelled(kind: &str, api_version: &str, name: &str, app: &str) -> DynamicObject {
        serde_json::from_value(json!({
            "apiVersion": api_version,
            "kind": kind,
            "metadata": {"name": name, "namespace": "test", "labels": {"app": app}}
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_get_pod_finds_labelled_pod() {
        let store = MockClusterStore::new();
        store.insert(&ResourceKind::pod(), "test", pod("my-tutorial-pod", "tutorial-web-app", "Running"));

        let found = get_pod(&store, "test", "tutorial-web-app").await.unwrap();
        assert_eq!(found.metadata.name.as_deref(), Some("my-tutorial-pod"));
        assert_eq!(found.status.and_then(|s| s.phase).as_deref(), Some("Running"));
    }

    #[tokio::test]
    async fn test_get_pod_not_found_for_other_label() {
        let store = MockClusterStore::new();
        store.insert(&ResourceKind::pod(), "test", pod("my-tutorial-pod", "tutorial-web-app", "Running"));

        let err = get_pod(&store, "test", "tutorial-web-ap").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_get_workload_missing() {
        let store = MockClusterStore::new();
        let err = get_workload(&store, "test", "tutorial-web-app").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_all_removes_owned_objects() {
        let store = MockClusterStore::new();
        store.insert(
            &ResourceKind::deployment_config(),
            "test",
            labelled("DeploymentConfig", "apps.openshift.io/v1", "tutorial-web-app", "tutorial-web-app"),
        );
        store.insert(
            &ResourceKind::service(),
            "test",
            labelled("Service", "v1", "tutorial-web-app", "tutorial-web-app"),
        );
        store.insert(
            &ResourceKind::route(),
            "test",
            labelled("Route", "route.openshift.io/v1", "tutorial-web-app", "tutorial-web-app"),
        );
        store.insert(
            &ResourceKind::route(),
            "test",
            labelled("Route", "route.openshift.io/v1", "unrelated", "other-app"),
        );

        delete_all(&store, "test", "tutorial-web-app").await.unwrap();

        assert!(store.object(&ResourceKind::deployment_config(), "test", "tutorial-web-app").is_none());
        assert!(store.object(&ResourceKind::service(), "test", "tutorial-web-app").is_none());
        assert!(store.object(&ResourceKind::route(), "test", "tutorial-web-app").is_none());
        assert!(store.object(&ResourceKind::route(), "test", "unrelated").is_some());
    }

    #[tokio::test]
    async fn test_delete_all_tolerates_missing_service() {
        let store = MockClusterStore::new();
        store.insert(
            &ResourceKind::route(),
            "test",
            labelled("Route", "route.openshift.io/v1", "tutorial-web-app", "tutorial-web-app"),
        );

        delete_all(&store, "test", "tutorial-web-app").await.unwrap();

        assert!(store.names(&ResourceKind::route(), "test").is_empty());
    }

    #[tokio::test]
    async fn test_delete_all_resumes_after_partial_failure() {
        let store = MockClusterStore::new();
        store.insert(
            &ResourceKind::service(),
            "test",
            labelled("Service", "v1", "tutorial-web-app", "tutorial-web-app"),
        );
        store.insert(
            &ResourceKind::route(),
            "test",
            labelled("Route", "route.openshift.io/v1", "tutorial-web-app", "tutorial-web-app"),
        );
        store.fail_on(Operation::DeleteCollection, &ResourceKind::route(), || {
            StoreError::InvalidObject("routes unavailable".to_string())
        });

        delete_all(&store, "test", "tutorial-web-app").await.unwrap_err();
        assert!(store.object(&ResourceKind::service(), "test", "tutorial-web-app").is_none());

        store.clear_failures();
        delete_all(&store, "test", "tutorial-web-app").await.unwrap();
        assert!(store.names(&ResourceKind::route(), "test").is_empty());
    }

    #[tokio::test]
    async fn test_delete_all_propagates_other_service_errors() {
        let store = MockClusterStore::new();
        store.fail_on(Operation::Delete, &ResourceKind::service(), || {
            StoreError::InvalidObject("forbidden".to_string())
        });

        let err = delete_all(&store, "test", "tutorial-web-app").await.unwrap_err();
        assert_eq!(err.to_string(), "invalid object: forbidden");
        assert_eq!(store.calls_to(Operation::DeleteCollection).len(), 1);
    }
}
