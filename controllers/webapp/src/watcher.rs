//! WebApp watcher.
//!
//! Runs a `kube_runtime::Controller` over the watched namespace and feeds
//! every change through the finalizer helper, so deletions are always seen
//! while the WebApp still exists.

use crate::backoff::BackoffTracker;
use crate::error::ControllerError;
use crate::metrics::Metrics;
use crate::reconciler::{Reconciler, WebAppEvent};
use crds::WebApp;
use futures::StreamExt;
use kube::{Api, ResourceExt};
use kube_runtime::controller::Action;
use kube_runtime::finalizer::{finalizer, Error as FinalizerError, Event as FinalizerEvent};
use kube_runtime::{watcher, Controller};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

pub const WEBAPP_FINALIZER: &str = "webapp.integreatly.org/finalizer";

const BACKOFF_MIN_SECS: u64 = 2;
const BACKOFF_MAX_SECS: u64 = 120;

/// Shared state for the reconcile and error-policy callbacks.
pub struct Context {
    reconciler: Reconciler,
    api: Api<WebApp>,
    metrics: Metrics,
    backoff: BackoffTracker,
    resync_period: Duration,
}

impl Context {
    pub fn new(reconciler: Reconciler, api: Api<WebApp>, metrics: Metrics, resync_period: Duration) -> Self {
        Self {
            reconciler,
            api,
            metrics,
            backoff: BackoffTracker::new(BACKOFF_MIN_SECS, BACKOFF_MAX_SECS),
            resync_period,
        }
    }
}

fn object_key(app: &WebApp) -> String {
    format!("{}/{}", app.namespace().unwrap_or_default(), app.name_any())
}

async fn reconcile(app: Arc<WebApp>, ctx: Arc<Context>) -> Result<Action, ControllerError> {
    let key = object_key(&app);
    debug!("Reconciling WebApp {}", key);

    let action = finalizer(&ctx.api, WEBAPP_FINALIZER, app, |event| async {
        match event {
            FinalizerEvent::Apply(app) => ctx
                .reconciler
                .handle(&WebAppEvent::Apply(app))
                .await
                .map(|()| Action::requeue(ctx.resync_period)),
            FinalizerEvent::Cleanup(app) => ctx
                .reconciler
                .handle(&WebAppEvent::Delete(app))
                .await
                .map(|()| Action::await_change()),
        }
    })
    .await
    .map_err(|e| match e {
        FinalizerError::ApplyFailed(err) | FinalizerError::CleanupFailed(err) => err,
        FinalizerError::AddFinalizer(err) | FinalizerError::RemoveFinalizer(err) => ControllerError::Kube(err),
        other => ControllerError::Watch(other.to_string()),
    })?;

    ctx.backoff.reset(&key);
    Ok(action)
}

fn error_policy(app: Arc<WebApp>, err: &ControllerError, ctx: Arc<Context>) -> Action {
    let key = object_key(&app);
    ctx.metrics.reconcile_errors.inc();

    let delay = ctx.backoff.next_backoff(&key);
    error!("Reconciliation of WebApp {} failed, retrying in {:?}: {}", key, delay, err);
    Action::requeue(delay)
}

/// Watches WebApps until the watch stream ends.
pub async fn watch_web_apps(ctx: Arc<Context>) -> Result<(), ControllerError> {
    info!("Starting WebApp watcher");

    Controller::new(ctx.api.clone(), watcher::Config::default())
        .run(reconcile, error_policy, ctx)
        .for_each(|res| async move {
            match res {
                Ok((object, _)) => debug!("Reconciled WebApp {}", object.name),
                Err(e) => error!("Controller error for WebApp: {}", e),
            }
        })
        .await;

    Err(ControllerError::Watch("WebApp watch stream ended".to_string()))
}
