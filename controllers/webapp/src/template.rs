//! OpenShift template handling.
//!
//! Loads template manifests from disk, fills in parameter values and hands
//! the result to a [`TemplateProcessor`] for expansion into raw objects.

use crate::error::ControllerError;
use async_trait::async_trait;
use kube::api::{Api, ApiResource, DynamicObject, GroupVersionKind, PostParams};
use kube::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

const TEMPLATE_GROUP: &str = "template.openshift.io";
const TEMPLATE_VERSION: &str = "v1";
const TEMPLATE_KIND: &str = "Template";

/// Template manifest.
///
/// Only the fields the controller touches are typed. Everything else is kept
/// in `extra` so the manifest reaches the processor unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    #[serde(default)]
    pub api_version: String,

    pub kind: String,

    #[serde(default)]
    pub metadata: Map<String, Value>,

    #[serde(default)]
    pub objects: Vec<Value>,

    #[serde(default)]
    pub parameters: Vec<TemplateParameter>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A parameter declared by a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateParameter {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Template {
    /// Sets the value of every declared parameter present in `params`.
    ///
    /// Declared parameters missing from `params` keep their manifest value.
    /// Keys the template does not declare are ignored.
    pub fn fill_params(&mut self, params: &BTreeMap<String, String>) {
        for parameter in &mut self.parameters {
            if let Some(value) = params.get(&parameter.name) {
                parameter.value = Some(value.clone());
            }
        }
    }
}

/// Reads a template manifest.
///
/// `.yaml` and `.yml` files are parsed as YAML, anything else as JSON. The
/// manifest must describe a `Template`.
pub fn load_manifest(path: &Path) -> Result<Template, ControllerError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ControllerError::TemplateLoad(format!("{}: {}", path.display(), e)))?;

    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    let template: Template = if is_yaml {
        serde_yaml::from_str(&raw).map_err(|e| ControllerError::TemplateLoad(format!("{}: {}", path.display(), e)))?
    } else {
        serde_json::from_str(&raw).map_err(|e| ControllerError::TemplateLoad(format!("{}: {}", path.display(), e)))?
    };

    if template.kind != TEMPLATE_KIND {
        return Err(ControllerError::TemplateLoad(format!(
            "{}: expected kind {}, found {}",
            path.display(),
            TEMPLATE_KIND,
            template.kind
        )));
    }
    Ok(template)
}

/// Pulls the `objects` list out of a processed template.
pub fn processed_objects(processed: &Value) -> Result<Vec<Value>, ControllerError> {
    processed
        .get("objects")
        .and_then(Value::as_array)
        .cloned()
        .ok_or_else(|| ControllerError::TemplateExpansion("response has no objects list".to_string()))
}

/// Expands a filled-in template into raw objects.
#[async_trait]
pub trait TemplateProcessor: Send + Sync {
    async fn process(&self, namespace: &str, template: &Template) -> Result<Vec<Value>, ControllerError>;
}

/// Processor backed by the cluster's `processedtemplates` endpoint.
#[derive(Clone)]
pub struct KubeTemplateProcessor {
    client: Client,
}

impl KubeTemplateProcessor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: &str) -> Api<DynamicObject> {
        let gvk = GroupVersionKind::gvk(TEMPLATE_GROUP, TEMPLATE_VERSION, TEMPLATE_KIND);
        let resource = ApiResource::from_gvk_with_plural(&gvk, "processedtemplates");
        Api::namespaced_with(self.client.clone(), namespace, &resource)
    }
}

#[async_trait]
impl TemplateProcessor for KubeTemplateProcessor {
    async fn process(&self, namespace: &str, template: &Template) -> Result<Vec<Value>, ControllerError> {
        let mut body = serde_json::to_value(template)
            .map_err(|e| ControllerError::TemplateExpansion(e.to_string()))?;
        // Manifests may still carry the legacy ungrouped apiVersion.
        body["apiVersion"] = Value::String(format!("{}/{}", TEMPLATE_GROUP, TEMPLATE_VERSION));

        let request: DynamicObject =
            serde_json::from_value(body).map_err(|e| ControllerError::TemplateExpansion(e.to_string()))?;

        debug!("Processing template in {}", namespace);
        let processed = self
            .api(namespace)
            .create(&PostParams::default(), &request)
            .await
            .map_err(|e| ControllerError::TemplateExpansion(e.to_string()))?;

        processed_objects(&processed.data)
    }
}
