//! Mock ClusterStore for unit testing
//!
//! Stores objects in memory, records every call made against it and can be
//! told to fail specific operations, so controller logic can be tested
//! without a cluster.

use crate::error::StoreError;
use crate::kind::ResourceKind;
use crate::store_trait::ClusterStore;
use kube::api::DynamicObject;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

/// Store operations, used to record calls and target injected failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Get,
    List,
    Update,
    Delete,
    DeleteCollection,
    PatchStatus,
}

/// A call made against the mock
#[derive(Debug, Clone, PartialEq)]
pub struct StoreCall {
    pub operation: Operation,
    pub kind: String,
    pub namespace: String,
    /// Object name, or the label selector for list/delete-collection calls
    pub target: String,
    /// Status body for `PatchStatus`, the written object for `Create`/`Update`
    pub body: Option<serde_json::Value>,
}

type ObjectKey = (ResourceKind, String, String);
type FailureFn = Arc<dyn Fn() -> StoreError + Send + Sync>;

/// In-memory ClusterStore
#[derive(Clone, Default)]
pub struct MockClusterStore {
    objects: Arc<Mutex<BTreeMap<String, (ObjectKey, DynamicObject)>>>,
    calls: Arc<Mutex<Vec<StoreCall>>>,
    failures: Arc<Mutex<HashMap<(Operation, String), FailureFn>>>,
}

fn storage_key(kind: &ResourceKind, namespace: &str, name: &str) -> String {
    format!("{}/{}/{}/{}", kind.api_version(), kind.kind, namespace, name)
}

fn matches_selector(object: &DynamicObject, selector: &str) -> bool {
    let labels = object.metadata.labels.clone().unwrap_or_default();
    selector
        .split(',')
        .filter(|term| !term.trim().is_empty())
        .all(|term| match term.split_once('=') {
            Some((key, value)) => labels.get(key.trim()).map(String::as_str) == Some(value.trim()),
            None => labels.contains_key(term.trim()),
        })
}

impl MockClusterStore {
    /// Create an empty mock store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object to the mock store (for test setup)
    pub fn insert(&self, kind: &ResourceKind, namespace: &str, mut object: DynamicObject) {
        let name = object.metadata.name.clone().unwrap_or_default();
        object.metadata.namespace = Some(namespace.to_string());
        let key = (kind.clone(), namespace.to_string(), name.clone());
        self.objects
            .lock()
            .unwrap()
            .insert(storage_key(kind, namespace, &name), (key, object));
    }

    /// Current copy of a stored object
    pub fn object(&self, kind: &ResourceKind, namespace: &str, name: &str) -> Option<DynamicObject> {
        self.objects
            .lock()
            .unwrap()
            .get(&storage_key(kind, namespace, name))
            .map(|(_, object)| object.clone())
    }

    /// Names of stored objects of a kind, in key order
    pub fn names(&self, kind: &ResourceKind, namespace: &str) -> Vec<String> {
        self.objects
            .lock()
            .unwrap()
            .values()
            .filter(|((k, ns, _), _)| k == kind && ns == namespace)
            .map(|((_, _, name), _)| name.clone())
            .collect()
    }

    /// Make every `operation` on `kind` fail with the error `error` builds
    pub fn fail_on<F>(&self, operation: Operation, kind: &ResourceKind, error: F)
    where
        F: Fn() -> StoreError + Send + Sync + 'static,
    {
        self.failures
            .lock()
            .unwrap()
            .insert((operation, kind.kind.clone()), Arc::new(error));
    }

    /// Drop every injected failure
    pub fn clear_failures(&self) {
        self.failures.lock().unwrap().clear();
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls of one operation, in order
    pub fn calls_to(&self, operation: Operation) -> Vec<StoreCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.operation == operation)
            .collect()
    }

    fn record(&self, operation: Operation, kind: &ResourceKind, namespace: &str, target: &str, body: Option<serde_json::Value>) -> Result<(), StoreError> {
        self.calls.lock().unwrap().push(StoreCall {
            operation,
            kind: kind.kind.clone(),
            namespace: namespace.to_string(),
            target: target.to_string(),
            body,
        });

        match self.failures.lock().unwrap().get(&(operation, kind.kind.clone())) {
            Some(failure) => Err(failure()),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl ClusterStore for MockClusterStore {
    async fn create(&self, kind: &ResourceKind, namespace: &str, object: &DynamicObject) -> Result<DynamicObject, StoreError> {
        let name = object.metadata.name.clone().unwrap_or_default();
        self.record(Operation::Create, kind, namespace, &name, Some(serde_json::to_value(object)?))?;

        if self.object(kind, namespace, &name).is_some() {
            return Err(StoreError::AlreadyExists(format!("{} '{}'", kind.kind, name)));
        }
        self.insert(kind, namespace, object.clone());
        self.object(kind, namespace, &name)
            .ok_or_else(|| StoreError::NotFound(format!("{} '{}'", kind.kind, name)))
    }

    async fn get(&self, kind: &ResourceKind, namespace: &str, name: &str) -> Result<DynamicObject, StoreError> {
        self.record(Operation::Get, kind, namespace, name, None)?;
        self.object(kind, namespace, name)
            .ok_or_else(|| StoreError::NotFound(format!("{} '{}'", kind.kind, name)))
    }

    async fn list(&self, kind: &ResourceKind, namespace: &str, label_selector: &str) -> Result<Vec<DynamicObject>, StoreError> {
        self.record(Operation::List, kind, namespace, label_selector, None)?;
        Ok(self
            .objects
            .lock()
            .unwrap()
            .values()
            .filter(|((k, ns, _), object)| k == kind && ns == namespace && matches_selector(object, label_selector))
            .map(|(_, object)| object.clone())
            .collect())
    }

    async fn update(&self, kind: &ResourceKind, namespace: &str, object: &DynamicObject) -> Result<DynamicObject, StoreError> {
        let name = object
            .metadata
            .name
            .clone()
            .ok_or_else(|| StoreError::InvalidObject(format!("{} object has no metadata.name", kind.kind)))?;
        self.record(Operation::Update, kind, namespace, &name, Some(serde_json::to_value(object)?))?;

        if self.object(kind, namespace, &name).is_none() {
            return Err(StoreError::NotFound(format!("{} '{}'", kind.kind, name)));
        }
        self.insert(kind, namespace, object.clone());
        Ok(object.clone())
    }

    async fn delete(&self, kind: &ResourceKind, namespace: &str, name: &str) -> Result<(), StoreError> {
        self.record(Operation::Delete, kind, namespace, name, None)?;
        self.objects
            .lock()
            .unwrap()
            .remove(&storage_key(kind, namespace, name))
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("{} '{}'", kind.kind, name)))
    }

    async fn delete_collection(&self, kind: &ResourceKind, namespace: &str, label_selector: &str) -> Result<(), StoreError> {
        self.record(Operation::DeleteCollection, kind, namespace, label_selector, None)?;
        self.objects
            .lock()
            .unwrap()
            .retain(|_, ((k, ns, _), object)| !(k == kind && ns == namespace && matches_selector(object, label_selector)));
        Ok(())
    }

    async fn patch_status(&self, kind: &ResourceKind, namespace: &str, name: &str, status: &serde_json::Value) -> Result<(), StoreError> {
        self.record(Operation::PatchStatus, kind, namespace, name, Some(status.clone()))?;
        if let Some((_, object)) = self
            .objects
            .lock()
            .unwrap()
            .get_mut(&storage_key(kind, namespace, name))
        {
            object.data["status"] = status.clone();
        }
        Ok(())
    }
}
