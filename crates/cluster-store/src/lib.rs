//! Cluster Object Store
//!
//! A small, kind-scoped view of the Kubernetes API used by the WebApp
//! controller. Objects are handled as [`DynamicObject`]s and every call names
//! the [`ResourceKind`] it operates on, so one store serves workloads, pods,
//! services, routes and the WebApp resource itself.
//!
//! # Example
//!
//! ```no_run
//! use cluster_store::{KubeStore, ResourceKind, ClusterStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = kube::Client::try_default().await?;
//! let store = KubeStore::new(client);
//!
//! let pods = store.list(&ResourceKind::pod(), "webapp", "deploymentconfig=tutorial-web-app").await?;
//! println!("{} pods", pods.len());
//! # Ok(())
//! # }
//! ```
//!
//! [`DynamicObject`]: kube::api::DynamicObject

pub mod client;
pub mod error;
pub mod kind;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;
pub mod ops;
#[path = "trait.rs"]
pub mod store_trait;

pub use client::KubeStore;
pub use error::StoreError;
pub use kind::{KindRegistry, ResourceKind};
#[cfg(any(test, feature = "test-util"))]
pub use mock::MockClusterStore;
pub use store_trait::ClusterStore;
