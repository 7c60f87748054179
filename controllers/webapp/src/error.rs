//! Controller-specific error types.
//!
//! Every reconciliation failure is one of these. The state machine turns the
//! error's text into the WebApp's status message before handing it back to
//! the watcher.

use cluster_store::StoreError;
use kube::Error as KubeError;
use thiserror::Error;

/// Errors that can occur in the WebApp Controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Template manifest could not be located or parsed
    #[error("failed to load template: {0}")]
    TemplateLoad(String),

    /// Template expansion request failed or returned an unexpected shape
    #[error("failed to process template: {0}")]
    TemplateExpansion(String),

    /// A rendered object could not be decoded
    #[error("failed to decode rendered object: {0}")]
    ObjectDecode(String),

    /// Reading from the cluster failed (including a missing object)
    #[error("{0}")]
    StoreRead(#[source] StoreError),

    /// Writing to the cluster failed
    #[error("{0}")]
    StoreWrite(#[source] StoreError),

    /// Creating a rendered object failed for a reason other than it already existing
    #[error("failed to provision {kind} '{name}': {source}")]
    Provision {
        kind: String,
        name: String,
        #[source]
        source: StoreError,
    },

    /// Kubernetes API error outside the store (watch, finalizer patches)
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Metrics registration or serving failed
    #[error("Metrics error: {0}")]
    Metrics(String),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),
}
