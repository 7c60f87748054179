//! WebApp CRD
//!
//! Declares the desired state of the tutorial web app deployment.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Status message recorded once the app has been provisioned and observed ready.
pub const STATUS_OK: &str = "OK";

#[derive(CustomResource, Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "integreatly.org",
    version = "v1alpha1",
    kind = "WebApp",
    namespaced,
    status = "WebAppStatus",
    printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.message"}"#,
    printcolumn = r#"{"name":"Version","type":"string","jsonPath":".status.version"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct WebAppSpec {
    /// Label value tagging every object owned by this WebApp (`app=<appLabel>`)
    pub app_label: String,

    /// Template used to provision the app
    pub template: WebAppTemplate,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebAppTemplate {
    /// Path of the OpenShift template manifest on the controller's filesystem
    pub path: String,

    /// Template parameters, also reconciled into the app's environment
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WebAppStatus {
    /// `OK`, empty while provisioning is pending, or the last error
    #[serde(default)]
    pub message: String,

    /// Tag of the app image last applied
    #[serde(default)]
    pub version: String,
}

impl WebApp {
    /// The deletion marker has been set on this resource.
    pub fn is_being_deleted(&self) -> bool {
        self.metadata.deletion_timestamp.is_some()
    }

    /// Current status message, empty when no status has been written yet.
    pub fn status_message(&self) -> &str {
        self.status.as_ref().map_or("", |s| s.message.as_str())
    }

    /// Looks up a template parameter by name.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.spec.template.parameters.get(name).map(String::as_str)
    }
}
