//! Main controller implementation.
//!
//! Wires the cluster store, template processor and reconciler together and
//! runs the WebApp watcher next to the metrics server.

use crate::config::ControllerConfig;
use crate::error::ControllerError;
use crate::metrics::{self, Metrics};
use crate::reconciler::Reconciler;
use crate::template::KubeTemplateProcessor;
use crate::watcher::{self, Context};
use cluster_store::{KindRegistry, KubeStore};
use crds::WebApp;
use kube::{Api, Client};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Main controller for WebApp resources.
pub struct Controller {
    watcher: JoinHandle<Result<(), ControllerError>>,
    metrics_server: JoinHandle<Result<(), ControllerError>>,
}

impl Controller {
    /// Creates a new controller instance and starts its background tasks.
    pub async fn new(config: ControllerConfig) -> Result<Self, ControllerError> {
        info!("Initializing WebApp Controller");

        let catalog = config.catalog()?;
        info!("Parameter catalog: image {}, {} parameters", catalog.image, catalog.parameters.len());

        let registry = KindRegistry::openshift_defaults();
        info!("Registered {} resource kinds", registry.len());

        let kube_client = Client::try_default().await?;

        let reconciler = Reconciler::new(
            Arc::new(KubeStore::new(kube_client.clone())),
            Arc::new(KubeTemplateProcessor::new(kube_client.clone())),
            registry,
            catalog,
        );

        let metrics = Metrics::new()?;
        let metrics_server = {
            let addr = config.metrics_addr;
            let registry = metrics.registry();
            tokio::spawn(async move { metrics::serve(addr, registry).await })
        };

        let api: Api<WebApp> = Api::namespaced(kube_client, &config.namespace);
        let context = Arc::new(Context::new(reconciler, api, metrics, config.resync_period));
        let watcher = tokio::spawn(async move { watcher::watch_web_apps(context).await });

        Ok(Self {
            watcher,
            metrics_server,
        })
    }

    /// Runs the controller until the watcher or the metrics server exits.
    pub async fn run(mut self) -> Result<(), ControllerError> {
        info!("WebApp Controller running");

        tokio::select! {
            result = &mut self.watcher => {
                result.map_err(|e| ControllerError::Watch(format!("WebApp watcher panicked: {}", e)))??;
            }
            result = &mut self.metrics_server => {
                result.map_err(|e| ControllerError::Metrics(format!("metrics server panicked: {}", e)))??;
            }
        }

        Ok(())
    }
}
