//! OpenShift Route
//!
//! Typed view of `route.openshift.io/v1` Routes. The controller only creates
//! routes, so just the fields it sets are modelled.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[kube(group = "route.openshift.io", version = "v1", kind = "Route", namespaced)]
#[serde(rename_all = "camelCase")]
pub struct RouteSpec {
    /// Externally reachable host name. Left unset so the router assigns one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Backend the route sends traffic to
    pub to: RouteTargetReference,

    /// TLS settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<TlsConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RouteTargetReference {
    /// Target kind, always `Service` for this controller
    pub kind: String,

    /// Target name
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TlsConfig {
    /// Where TLS is terminated
    pub termination: TlsTermination,
}

/// TLS termination policy
///
/// Serializes lowercase, matching the values the route API accepts.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TlsTermination {
    /// Terminated at the router
    #[default]
    Edge,

    /// Passed through to the backend
    Passthrough,

    /// Terminated at the router and re-encrypted to the backend
    Reencrypt,
}
