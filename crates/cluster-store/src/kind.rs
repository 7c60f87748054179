//! Resource kinds and the kind registry.
//!
//! A [`ResourceKind`] carries everything needed to address a collection on the
//! API server (group, version, kind and plural). The [`KindRegistry`] maps the
//! `apiVersion`/`kind` pairs found in rendered manifests onto those kinds. It
//! is built explicitly by the caller before the control loop starts.

use crate::error::StoreError;
use kube::api::{ApiResource, GroupVersionKind};
use std::collections::HashMap;
use std::fmt;

/// A namespaced resource collection the store can address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceKind {
    pub group: String,
    pub version: String,
    pub kind: String,
    pub plural: String,
}

impl ResourceKind {
    pub fn new(group: &str, version: &str, kind: &str, plural: &str) -> Self {
        Self {
            group: group.to_string(),
            version: version.to_string(),
            kind: kind.to_string(),
            plural: plural.to_string(),
        }
    }

    /// `apps.openshift.io/v1` DeploymentConfig, the managed workload
    pub fn deployment_config() -> Self {
        Self::new("apps.openshift.io", "v1", "DeploymentConfig", "deploymentconfigs")
    }

    pub fn pod() -> Self {
        Self::new("", "v1", "Pod", "pods")
    }

    pub fn service() -> Self {
        Self::new("", "v1", "Service", "services")
    }

    pub fn route() -> Self {
        Self::new("route.openshift.io", "v1", "Route", "routes")
    }

    pub fn web_app() -> Self {
        Self::new("integreatly.org", "v1alpha1", "WebApp", "webapps")
    }

    /// `group/version`, or just `version` for the core group.
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    pub fn api_resource(&self) -> ApiResource {
        let gvk = GroupVersionKind::gvk(&self.group, &self.version, &self.kind);
        ApiResource::from_gvk_with_plural(&gvk, &self.plural)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, Kind={}", self.api_version(), self.kind)
    }
}

/// Lookup table from manifest `apiVersion`/`kind` to [`ResourceKind`].
#[derive(Debug, Clone, Default)]
pub struct KindRegistry {
    kinds: HashMap<(String, String), ResourceKind>,
}

impl KindRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry covering the core kinds and the OpenShift API groups that
    /// appear in the web app template.
    ///
    /// OpenShift kinds are also registered under the legacy ungrouped `v1`
    /// apiVersion used by older templates; those resolve to the grouped kind.
    pub fn openshift_defaults() -> Self {
        let mut registry = Self::new();

        for kind in [
            ResourceKind::pod(),
            ResourceKind::service(),
            ResourceKind::new("", "v1", "ConfigMap", "configmaps"),
            ResourceKind::new("", "v1", "Secret", "secrets"),
            ResourceKind::new("", "v1", "ServiceAccount", "serviceaccounts"),
            ResourceKind::new("", "v1", "PersistentVolumeClaim", "persistentvolumeclaims"),
            ResourceKind::new("apps", "v1", "Deployment", "deployments"),
            ResourceKind::new("rbac.authorization.k8s.io", "v1", "Role", "roles"),
            ResourceKind::new("rbac.authorization.k8s.io", "v1", "RoleBinding", "rolebindings"),
        ] {
            registry.register(kind);
        }

        for kind in [
            ResourceKind::deployment_config(),
            ResourceKind::route(),
            ResourceKind::new("template.openshift.io", "v1", "Template", "templates"),
            ResourceKind::new("image.openshift.io", "v1", "ImageStream", "imagestreams"),
            ResourceKind::new("build.openshift.io", "v1", "BuildConfig", "buildconfigs"),
            ResourceKind::new("authorization.openshift.io", "v1", "RoleBinding", "rolebindings"),
        ] {
            let legacy_kind = kind.kind.clone();
            registry.register(kind.clone());
            registry.register_alias("v1", &legacy_kind, kind);
        }

        registry
    }

    /// Registers a kind under its own apiVersion.
    pub fn register(&mut self, kind: ResourceKind) {
        self.kinds.insert((kind.api_version(), kind.kind.clone()), kind);
    }

    /// Registers `target` under a different apiVersion/kind pair.
    ///
    /// Existing non-alias registrations are kept: a legacy alias never
    /// shadows a kind that really lives under that apiVersion.
    pub fn register_alias(&mut self, api_version: &str, kind: &str, target: ResourceKind) {
        self.kinds
            .entry((api_version.to_string(), kind.to_string()))
            .or_insert(target);
    }

    pub fn resolve(&self, api_version: &str, kind: &str) -> Option<&ResourceKind> {
        self.kinds.get(&(api_version.to_string(), kind.to_string()))
    }

    /// Like [`resolve`](Self::resolve), failing with [`StoreError::UnknownKind`].
    pub fn require(&self, api_version: &str, kind: &str) -> Result<&ResourceKind, StoreError> {
        self.resolve(api_version, kind)
            .ok_or_else(|| StoreError::UnknownKind(format!("{}, Kind={}", api_version, kind)))
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}
