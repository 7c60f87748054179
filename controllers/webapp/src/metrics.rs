//! Prometheus metrics for the controller, served on `/metrics`.

use crate::error::ControllerError;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use prometheus::{Encoder, IntCounter, Registry, TextEncoder};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

pub const RECONCILE_ERRORS: &str = "integreatly_tutorial_webapp_operator_reconcile_errors_total";

/// Registry plus the collectors the controller updates.
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    pub reconcile_errors: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self, ControllerError> {
        let registry = Registry::new();
        let reconcile_errors = IntCounter::new(RECONCILE_ERRORS, "Number of failed WebApp reconciliations")
            .map_err(|e| ControllerError::Metrics(e.to_string()))?;
        registry
            .register(Box::new(reconcile_errors.clone()))
            .map_err(|e| ControllerError::Metrics(e.to_string()))?;

        Ok(Self {
            registry: Arc::new(registry),
            reconcile_errors,
        })
    }

    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }
}

/// Export metrics in Prometheus text format
pub fn export_metrics(registry: &Registry) -> Result<String, ControllerError> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&registry.gather(), &mut buffer)
        .map_err(|e| ControllerError::Metrics(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| ControllerError::Metrics(e.to_string()))
}

async fn metrics_handler(State(registry): State<Arc<Registry>>) -> Response {
    match export_metrics(&registry) {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to export metrics: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub fn metrics_router(registry: Arc<Registry>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(registry)
}

/// Serves `/metrics` on `addr` until the listener fails.
pub async fn serve(addr: SocketAddr, registry: Arc<Registry>) -> Result<(), ControllerError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ControllerError::Metrics(format!("cannot listen on {}: {}", addr, e)))?;
    info!("Serving metrics on {}", addr);

    axum::serve(listener, metrics_router(registry))
        .await
        .map_err(|e| ControllerError::Metrics(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconcile_errors_exported() {
        let metrics = Metrics::new().unwrap();
        metrics.reconcile_errors.inc();
        metrics.reconcile_errors.inc();

        let output = export_metrics(&metrics.registry()).unwrap();
        assert!(output.contains(&format!("{} 2", RECONCILE_ERRORS)));
    }

    #[tokio::test]
    async fn test_metrics_handler() {
        let metrics = Metrics::new().unwrap();
        let response = metrics_handler(State(metrics.registry())).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
