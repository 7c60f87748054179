//! Route exposing the app's Service.

use crate::error::ControllerError;
use crate::reconciler::provision::ClusterObject;
use cluster_store::{ResourceKind, StoreError};
use crds::{Route, RouteSpec, RouteTargetReference, TlsConfig, TlsTermination, WebApp};
use kube::ResourceExt;

pub const ROUTE_NAME: &str = "tutorial-web-app";
pub const SERVICE_NAME: &str = "tutorial-web-app";

/// Name and host prefix used when a routing subdomain is configured.
pub const SUBDOMAIN_ROUTE_NAME: &str = "solution-explorer";
pub const ROUTING_SUBDOMAIN: &str = "ROUTING_SUBDOMAIN";

const APP_LABEL_KEY: &str = "app";

/// Builds the Route for `owner`.
///
/// The host is only set when `ROUTING_SUBDOMAIN` is given. Without it the
/// router keeps whatever host it already assigned. The Route carries the
/// owner's labels plus `app=<appLabel>`, so teardown always finds it.
pub fn build_exposure(owner: &WebApp) -> Route {
    let subdomain = owner.parameter(ROUTING_SUBDOMAIN).unwrap_or_default();
    let (name, host) = if subdomain.is_empty() {
        (ROUTE_NAME, None)
    } else {
        (
            SUBDOMAIN_ROUTE_NAME,
            Some(format!("{}.{}", SUBDOMAIN_ROUTE_NAME, subdomain)),
        )
    };

    let mut route = Route::new(
        name,
        RouteSpec {
            host,
            to: RouteTargetReference {
                kind: "Service".to_string(),
                name: SERVICE_NAME.to_string(),
            },
            tls: Some(TlsConfig {
                termination: TlsTermination::Edge,
            }),
        },
    );
    route.metadata.namespace = owner.namespace();
    let mut labels = owner.metadata.labels.clone().unwrap_or_default();
    labels.insert(APP_LABEL_KEY.to_string(), owner.spec.app_label.clone());
    route.metadata.labels = Some(labels);
    route
}

/// Converts a Route into an object the store can create.
pub fn exposure_object(route: &Route) -> Result<ClusterObject, ControllerError> {
    let object = serde_json::to_value(route)
        .and_then(serde_json::from_value)
        .map_err(|e| ControllerError::ObjectDecode(StoreError::Serialization(e).to_string()))?;

    Ok(ClusterObject {
        kind: ResourceKind::route(),
        object,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crds::{WebAppSpec, WebAppTemplate};
    use std::collections::BTreeMap;

    fn owner(parameters: &[(&str, &str)]) -> WebApp {
        let mut app = WebApp::new(
            "tutorial-web-app",
            WebAppSpec {
                app_label: "tutorial-web-app".to_string(),
                template: WebAppTemplate {
                    path: "deploy/template/tutorial-web-app.yml".to_string(),
                    parameters: parameters
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                },
            },
        );
        app.metadata.namespace = Some("webapp".to_string());
        app.metadata.labels = Some(BTreeMap::from([("app".to_string(), "tutorial-web-app".to_string())]));
        app
    }

    #[test]
    fn test_default_route() {
        let route = build_exposure(&owner(&[]));

        assert_eq!(route.metadata.name.as_deref(), Some("tutorial-web-app"));
        assert_eq!(route.metadata.namespace.as_deref(), Some("webapp"));
        assert_eq!(route.metadata.labels, owner(&[]).metadata.labels);
        assert_eq!(route.spec.host, None);
        assert_eq!(route.spec.to.kind, "Service");
        assert_eq!(route.spec.to.name, "tutorial-web-app");
        assert_eq!(route.spec.tls.unwrap().termination, TlsTermination::Edge);
    }

    #[test]
    fn test_app_label_added_to_owner_labels() {
        let mut app = owner(&[]);
        app.metadata.labels = Some(BTreeMap::from([
            ("app".to_string(), "something-else".to_string()),
            ("team".to_string(), "integreatly".to_string()),
        ]));

        let labels = build_exposure(&app).metadata.labels.unwrap();
        assert_eq!(labels["app"], "tutorial-web-app");
        assert_eq!(labels["team"], "integreatly");
    }

    #[test]
    fn test_unlabelled_owner_still_gets_app_label() {
        let mut app = owner(&[]);
        app.metadata.labels = None;

        let labels = build_exposure(&app).metadata.labels.unwrap();
        assert_eq!(labels, BTreeMap::from([("app".to_string(), "tutorial-web-app".to_string())]));
    }

    #[test]
    fn test_routing_subdomain() {
        let route = build_exposure(&owner(&[("ROUTING_SUBDOMAIN", "apps.example.com")]));

        assert_eq!(route.metadata.name.as_deref(), Some("solution-explorer"));
        assert_eq!(route.spec.host.as_deref(), Some("solution-explorer.apps.example.com"));
    }

    #[test]
    fn test_empty_subdomain_is_ignored() {
        let route = build_exposure(&owner(&[("ROUTING_SUBDOMAIN", "")]));
        assert_eq!(route.metadata.name.as_deref(), Some("tutorial-web-app"));
        assert_eq!(route.spec.host, None);
    }

    #[test]
    fn test_exposure_object() {
        let object = exposure_object(&build_exposure(&owner(&[]))).unwrap();

        assert_eq!(object.kind, ResourceKind::route());
        assert_eq!(object.name(), "tutorial-web-app");
        let types = object.object.types.unwrap();
        assert_eq!(types.api_version, "route.openshift.io/v1");
        assert_eq!(object.object.data["spec"]["tls"]["termination"], "edge");
    }
}
