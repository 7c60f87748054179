//! Parameter catalog.
//!
//! The catalog names the template parameters the controller keeps in sync
//! with the app container's environment, each with an optional fallback, and
//! the image the container is expected to run. It is loaded from a YAML file
//! when one is configured, so it can change without a rebuild.

use crate::error::ControllerError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Image the built-in catalog migrates the app to.
pub const DEFAULT_IMAGE: &str = "quay.io/integreatly/tutorial-web-app:2.28.1";

/// One recognised parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,

    /// Value used when the WebApp does not set the parameter. Without one,
    /// the variable is removed from the container.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl CatalogEntry {
    fn new(name: &str, default: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            default: default.map(str::to_string),
        }
    }
}

/// Ordered set of managed parameters plus the expected image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterCatalog {
    pub image: String,
    pub parameters: Vec<CatalogEntry>,
}

impl Default for ParameterCatalog {
    fn default() -> Self {
        Self {
            image: DEFAULT_IMAGE.to_string(),
            parameters: vec![
                CatalogEntry::new("OPENSHIFT_OAUTHCLIENT_ID", None),
                CatalogEntry::new("OPENSHIFT_HOST", None),
                CatalogEntry::new("OPENSHIFT_OAUTH_HOST", None),
                CatalogEntry::new("SSO_ROUTE", None),
                CatalogEntry::new("OPENSHIFT_API", Some("openshift.default.svc")),
                CatalogEntry::new("OPENSHIFT_VERSION", Some("3")),
                CatalogEntry::new("INTEGREATLY_VERSION", Some("not set")),
                CatalogEntry::new(
                    "WALKTHROUGH_LOCATIONS",
                    Some("https://github.com/integr8ly/tutorial-web-app-walkthroughs#v1.12.3"),
                ),
                CatalogEntry::new("CLUSTER_TYPE", Some("not set")),
                CatalogEntry::new("INSTALLED_SERVICES", None),
                CatalogEntry::new("INSTALLATION_TYPE", None),
                CatalogEntry::new("UPGRADE_DATA", None),
            ],
        }
    }
}

impl ParameterCatalog {
    /// Reads a catalog from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self, ControllerError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ControllerError::InvalidConfig(format!("cannot read catalog {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&raw)
            .map_err(|e| ControllerError::InvalidConfig(format!("catalog {}: {}", path.display(), e)))
    }

    fn from_yaml(raw: &str) -> Result<Self, String> {
        let catalog: Self = serde_yaml::from_str(raw).map_err(|e| e.to_string())?;
        if catalog.image.trim().is_empty() {
            return Err("image must not be empty".to_string());
        }
        let mut seen = std::collections::HashSet::new();
        for entry in &catalog.parameters {
            if !seen.insert(entry.name.as_str()) {
                return Err(format!("parameter {} listed twice", entry.name));
            }
        }
        Ok(catalog)
    }

    /// Tag part of the image reference, recorded as the WebApp's version.
    pub fn version(&self) -> &str {
        self.image.rsplit(':').next().unwrap_or(&self.image)
    }
}
