//! Readiness probe for the app's pod.

use cluster_store::{ops, ClusterStore};
use tracing::debug;

const RUNNING: &str = "Running";

/// True when the first pod rolled out for `app_label` is running.
///
/// A failed lookup or a missing pod counts as not ready.
pub async fn is_ready(store: &dyn ClusterStore, namespace: &str, app_label: &str) -> bool {
    match ops::get_pod(store, namespace, app_label).await {
        Ok(pod) => {
            let phase = pod.status.and_then(|s| s.phase).unwrap_or_default();
            debug!("Pod for {} is {}", app_label, phase);
            phase == RUNNING
        }
        Err(e) => {
            debug!("No ready pod for {}: {}", app_label, e);
            false
        }
    }
}
