//! Access to the app container inside a DeploymentConfig.
//!
//! The workload is handled as a generic object. Only the primary container's
//! `image` and `env` are read and written, the rest of the object is left
//! exactly as the cluster returned it.

use crate::error::ControllerError;
use cluster_store::StoreError;
use k8s_openapi::api::core::v1::Container;
use kube::api::DynamicObject;
use serde_json::Value;

const PRIMARY_CONTAINER: &str = "/spec/template/spec/containers/0";

fn workload_name(workload: &DynamicObject) -> &str {
    workload.metadata.name.as_deref().unwrap_or("<unnamed>")
}

fn missing_container(workload: &DynamicObject) -> ControllerError {
    ControllerError::StoreRead(StoreError::InvalidObject(format!(
        "DeploymentConfig '{}' has no containers",
        workload_name(workload)
    )))
}

/// Decodes the first container of the workload's pod template.
pub fn primary_container(workload: &DynamicObject) -> Result<Container, ControllerError> {
    let raw = workload
        .data
        .pointer(PRIMARY_CONTAINER)
        .ok_or_else(|| missing_container(workload))?;

    serde_json::from_value(raw.clone()).map_err(|e| {
        ControllerError::StoreRead(StoreError::InvalidObject(format!(
            "DeploymentConfig '{}' container: {}",
            workload_name(workload),
            e
        )))
    })
}

/// Writes the container's image and environment back into the workload.
pub fn apply_container(workload: &mut DynamicObject, container: &Container) -> Result<(), ControllerError> {
    let env = serde_json::to_value(container.env.as_deref().unwrap_or_default())
        .map_err(|e| ControllerError::StoreWrite(StoreError::Serialization(e)))?;
    let image = container.image.clone().map_or(Value::Null, Value::String);

    let missing = missing_container(workload);
    let slot = workload
        .data
        .pointer_mut(PRIMARY_CONTAINER)
        .and_then(Value::as_object_mut)
        .ok_or(missing)?;

    slot.insert("image".to_string(), image);
    if container.env.is_some() {
        slot.insert("env".to_string(), env);
    } else {
        slot.remove("env");
    }
    Ok(())
}
