//! WebApp CRD Definitions
//!
//! The `WebApp` custom resource reconciled by the WebApp controller, plus
//! typed definitions of the OpenShift objects the controller synthesizes.

pub mod route;
pub mod web_app;

pub use route::*;
pub use web_app::*;
