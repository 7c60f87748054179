//! Reconciliation logic for WebApp resources.
//!
//! Every event is routed by [`Phase`]: resources being deleted have their
//! objects torn down, resources already marked `OK` get their environment
//! reconciled, and anything else is (re)provisioned from its template. The
//! outcome is written to the WebApp's status.

pub mod exposure;
pub mod params;
pub mod provision;
pub mod readiness;
pub mod workload;


use crate::catalog::ParameterCatalog;
use crate::error::ControllerError;
use crate::template::TemplateProcessor;
use cluster_store::{ops, ClusterStore, KindRegistry, ResourceKind};
use crds::{WebApp, WebAppStatus, STATUS_OK};
use kube::ResourceExt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Name of the DeploymentConfig the template creates for the app.
pub const WORKLOAD_NAME: &str = "tutorial-web-app";

/// A change observed on a WebApp.
#[derive(Debug, Clone)]
pub enum WebAppEvent {
    Apply(Arc<WebApp>),
    Delete(Arc<WebApp>),
}

impl WebAppEvent {
    pub fn web_app(&self) -> &WebApp {
        match self {
            Self::Apply(app) | Self::Delete(app) => app,
        }
    }
}

/// What an event asks the reconciler to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Deleting,
    Reconciling,
    Provisioning,
}

impl Phase {
    pub fn of(event: &WebAppEvent) -> Self {
        let app = event.web_app();
        if matches!(event, WebAppEvent::Delete(_)) || app.is_being_deleted() {
            Self::Deleting
        } else if app.status_message() == STATUS_OK {
            Self::Reconciling
        } else {
            Self::Provisioning
        }
    }
}

/// Drives a WebApp towards its desired state.
pub struct Reconciler {
    store: Arc<dyn ClusterStore>,
    processor: Arc<dyn TemplateProcessor>,
    registry: KindRegistry,
    catalog: ParameterCatalog,
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn ClusterStore>,
        processor: Arc<dyn TemplateProcessor>,
        registry: KindRegistry,
        catalog: ParameterCatalog,
    ) -> Self {
        Self {
            store,
            processor,
            registry,
            catalog,
        }
    }

    /// Handles one event. Failures are recorded in the WebApp's status and
    /// returned.
    pub async fn handle(&self, event: &WebAppEvent) -> Result<(), ControllerError> {
        let app = event.web_app();
        let phase = Phase::of(event);
        debug!("Handling WebApp {} in phase {:?}", app.name_any(), phase);

        match phase {
            Phase::Deleting => self.delete(app).await,
            Phase::Reconciling => self.reconcile(app).await,
            Phase::Provisioning => self.provision(app).await,
        }
    }

    async fn delete(&self, app: &WebApp) -> Result<(), ControllerError> {
        let namespace = app.namespace().unwrap_or_default();
        info!("Deleting objects of WebApp {} in {}", app.name_any(), namespace);

        if let Err(e) = ops::delete_all(self.store.as_ref(), &namespace, &app.spec.app_label).await {
            let err = ControllerError::StoreWrite(e);
            self.set_status(app, &err.to_string()).await;
            return Err(err);
        }
        Ok(())
    }

    async fn reconcile(&self, app: &WebApp) -> Result<(), ControllerError> {
        match self.reconcile_workload(app).await {
            Ok(()) => {
                self.set_status(app, STATUS_OK).await;
                Ok(())
            }
            Err(e) => {
                self.set_status(app, &format!("Error: {}", e)).await;
                Err(e)
            }
        }
    }

    async fn reconcile_workload(&self, app: &WebApp) -> Result<(), ControllerError> {
        let namespace = app.namespace().unwrap_or_default();
        let mut workload = ops::get_workload(self.store.as_ref(), &namespace, WORKLOAD_NAME)
            .await
            .map_err(ControllerError::StoreRead)?;

        let mut container = workload::primary_container(&workload)?;
        if !params::reconcile_container(&mut container, &self.catalog, &app.spec.template.parameters) {
            debug!("DeploymentConfig {} is up to date", WORKLOAD_NAME);
            return Ok(());
        }

        workload::apply_container(&mut workload, &container)?;
        info!("Updating DeploymentConfig {} in {}", WORKLOAD_NAME, namespace);
        ops::update_workload(self.store.as_ref(), &namespace, &workload)
            .await
            .map_err(ControllerError::StoreWrite)
    }

    async fn provision(&self, app: &WebApp) -> Result<(), ControllerError> {
        match self.provision_objects(app).await {
            Ok(()) => {
                let namespace = app.namespace().unwrap_or_default();
                let ready = readiness::is_ready(self.store.as_ref(), &namespace, &app.spec.app_label).await;
                self.set_status(app, if ready { STATUS_OK } else { "" }).await;
                Ok(())
            }
            Err(e) => {
                self.set_status(app, &e.to_string()).await;
                Err(e)
            }
        }
    }

    async fn provision_objects(&self, app: &WebApp) -> Result<(), ControllerError> {
        let namespace = app.namespace().unwrap_or_default();
        info!("Provisioning WebApp {} in {}", app.name_any(), namespace);

        let raw = provision::render_template(self.processor.as_ref(), &namespace, &app.spec.template).await?;
        let mut objects = provision::decode_objects(raw, &self.registry)?;
        objects.push(exposure::exposure_object(&exposure::build_exposure(app))?);

        provision::provision(self.store.as_ref(), &objects, app).await
    }

    /// Records `message` and the catalog image's version on the WebApp.
    ///
    /// A failed write is logged and otherwise ignored.
    async fn set_status(&self, app: &WebApp, message: &str) {
        let status = WebAppStatus {
            message: message.to_string(),
            version: self.catalog.version().to_string(),
        };
        // Skipped so a resync does not patch and re-trigger the watch.
        if app.status.as_ref() == Some(&status) {
            debug!("Status of WebApp {} unchanged", app.name_any());
            return;
        }

        let body = match serde_json::to_value(&status) {
            Ok(body) => body,
            Err(e) => {
                warn!("Failed to encode status for WebApp {}: {}", app.name_any(), e);
                return;
            }
        };

        let namespace = app.namespace().unwrap_or_default();
        match self
            .store
            .patch_status(&ResourceKind::web_app(), &namespace, &app.name_any(), &body)
            .await
        {
            Ok(()) => debug!("Status of WebApp {} set to '{}'", app.name_any(), message),
            Err(e) => warn!("Failed to update status of WebApp {}: {}", app.name_any(), e),
        }
    }
}
