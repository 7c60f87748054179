//! Cluster store errors

use thiserror::Error;

/// Errors that can occur when reading or writing cluster objects
#[derive(Debug, Error)]
pub enum StoreError {
    /// Kubernetes API error not covered by a more specific variant
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// Object does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Object already exists (create conflict)
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The apiVersion/kind pair is not registered
    #[error("unknown resource kind: {0}")]
    UnknownKind(String),

    /// Object is missing a field the store needs, or has an unexpected shape
    #[error("invalid object: {0}")]
    InvalidObject(String),

    /// JSON conversion error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Maps a kube error for `what`, turning 404 and 409 responses into
    /// [`StoreError::NotFound`] and [`StoreError::AlreadyExists`].
    pub fn from_kube(err: kube::Error, what: impl std::fmt::Display) -> Self {
        match err {
            kube::Error::Api(ref response) if response.code == 404 => Self::NotFound(what.to_string()),
            kube::Error::Api(ref response) if response.code == 409 => Self::AlreadyExists(what.to_string()),
            other => Self::Kube(other),
        }
    }

    /// True for [`StoreError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// True for [`StoreError::AlreadyExists`].
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }
}
