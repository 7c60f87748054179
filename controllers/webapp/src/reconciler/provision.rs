//! Template provisioning.
//!
//! Renders the WebApp's template, decodes the rendered objects against the
//! kind registry and creates them one by one. Objects that already exist are
//! left alone, so provisioning can run again after a partial failure.

use crate::error::ControllerError;
use crate::template::{load_manifest, TemplateProcessor};
use cluster_store::{ClusterStore, KindRegistry, ResourceKind};
use crds::{WebApp, WebAppTemplate};
use kube::api::DynamicObject;
use kube::core::TypeMeta;
use kube::ResourceExt;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info};

/// A rendered object paired with the kind it is created as.
#[derive(Debug, Clone)]
pub struct ClusterObject {
    pub kind: ResourceKind,
    pub object: DynamicObject,
}

impl ClusterObject {
    pub fn name(&self) -> &str {
        self.object.metadata.name.as_deref().unwrap_or_default()
    }
}

/// Loads the template, fills in the requested parameters and expands it.
pub async fn render_template(
    processor: &dyn TemplateProcessor,
    namespace: &str,
    template_ref: &WebAppTemplate,
) -> Result<Vec<Value>, ControllerError> {
    let mut template = load_manifest(Path::new(&template_ref.path))?;
    template.fill_params(&template_ref.parameters);

    let objects = processor.process(namespace, &template).await?;
    debug!("Template {} rendered {} objects", template_ref.path, objects.len());
    Ok(objects)
}

fn decode_object(index: usize, raw: Value, registry: &KindRegistry) -> Result<ClusterObject, ControllerError> {
    let field = |name: &str| {
        raw.get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ControllerError::ObjectDecode(format!("object {} has no {}", index, name)))
    };
    let api_version = field("apiVersion")?;
    let kind_name = field("kind")?;

    let kind = registry
        .require(&api_version, &kind_name)
        .cloned()
        .map_err(|e| ControllerError::ObjectDecode(format!("object {}: {}", index, e)))?;

    let mut object: DynamicObject = serde_json::from_value(raw)
        .map_err(|e| ControllerError::ObjectDecode(format!("object {} ({}): {}", index, kind_name, e)))?;
    if object.metadata.name.as_deref().unwrap_or_default().is_empty() {
        return Err(ControllerError::ObjectDecode(format!(
            "object {} ({}) has no metadata.name",
            index, kind_name
        )));
    }

    object.types = Some(TypeMeta {
        api_version: kind.api_version(),
        kind: kind.kind.clone(),
    });
    Ok(ClusterObject { kind, object })
}

/// Decodes raw rendered objects. The first object that cannot be decoded
/// aborts the whole set.
pub fn decode_objects(raw: Vec<Value>, registry: &KindRegistry) -> Result<Vec<ClusterObject>, ControllerError> {
    raw.into_iter()
        .enumerate()
        .map(|(index, value)| decode_object(index, value, registry))
        .collect()
}

/// Creates each object in the owner's namespace, in order.
pub async fn provision(store: &dyn ClusterStore, objects: &[ClusterObject], owner: &WebApp) -> Result<(), ControllerError> {
    let namespace = owner.namespace().unwrap_or_default();

    for object in objects {
        match store.create(&object.kind, &namespace, &object.object).await {
            Ok(_) => info!("Created {} '{}' in {}", object.kind.kind, object.name(), namespace),
            Err(e) if e.is_already_exists() => {
                debug!("{} '{}' already exists in {}", object.kind.kind, object.name(), namespace);
            }
            Err(e) => {
                return Err(ControllerError::Provision {
                    kind: object.kind.to_string(),
                    name: object.name().to_string(),
                    source: e,
                });
            }
        }
    }
    Ok(())
}
