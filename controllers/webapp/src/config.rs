//! Controller configuration, read from environment variables at startup.

use crate::catalog::ParameterCatalog;
use crate::error::ControllerError;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_RESYNC_SECS: u64 = 5;
pub const DEFAULT_METRICS_ADDR: &str = "0.0.0.0:60000";

#[derive(Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    /// Namespace whose WebApps are reconciled
    pub namespace: String,
    pub catalog_path: Option<PathBuf>,
    pub resync_period: Duration,
    pub metrics_addr: SocketAddr,
}

impl ControllerConfig {
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ControllerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let namespace = lookup("WATCH_NAMESPACE")
            .filter(|ns| !ns.trim().is_empty())
            .ok_or_else(|| {
                ControllerError::InvalidConfig("WATCH_NAMESPACE environment variable is required".to_string())
            })?;

        let catalog_path = lookup("WEBAPP_CATALOG_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        let resync_secs = match lookup("RESYNC_PERIOD_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
                ControllerError::InvalidConfig(format!("RESYNC_PERIOD_SECS '{}': {}", raw, e))
            })?,
            None => DEFAULT_RESYNC_SECS,
        };

        let raw_addr = lookup("METRICS_ADDR").unwrap_or_else(|| DEFAULT_METRICS_ADDR.to_string());
        let metrics_addr = raw_addr
            .trim()
            .parse::<SocketAddr>()
            .map_err(|e| ControllerError::InvalidConfig(format!("METRICS_ADDR '{}': {}", raw_addr, e)))?;

        Ok(Self {
            namespace,
            catalog_path,
            resync_period: Duration::from_secs(resync_secs),
            metrics_addr,
        })
    }

    /// The configured catalog, or the built-in one.
    pub fn catalog(&self) -> Result<ParameterCatalog, ControllerError> {
        match &self.catalog_path {
            Some(path) => ParameterCatalog::from_file(path),
            None => Ok(ParameterCatalog::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<ControllerConfig, ControllerError> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ControllerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[("WATCH_NAMESPACE", "webapp")]).unwrap();

        assert_eq!(config.namespace, "webapp");
        assert_eq!(config.catalog_path, None);
        assert_eq!(config.resync_period, Duration::from_secs(5));
        assert_eq!(config.metrics_addr, "0.0.0.0:60000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.catalog().unwrap(), ParameterCatalog::default());
    }

    #[test]
    fn test_namespace_required() {
        assert!(matches!(config(&[]), Err(ControllerError::InvalidConfig(_))));
        assert!(matches!(config(&[("WATCH_NAMESPACE", " ")]), Err(ControllerError::InvalidConfig(_))));
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("WATCH_NAMESPACE", "webapp"),
            ("WEBAPP_CATALOG_PATH", "/etc/webapp/catalog.yaml"),
            ("RESYNC_PERIOD_SECS", "30"),
            ("METRICS_ADDR", "127.0.0.1:9090"),
        ])
        .unwrap();

        assert_eq!(config.catalog_path, Some(PathBuf::from("/etc/webapp/catalog.yaml")));
        assert_eq!(config.resync_period, Duration::from_secs(30));
        assert_eq!(config.metrics_addr.port(), 9090);
    }

    #[test]
    fn test_invalid_numbers() {
        let err = config(&[("WATCH_NAMESPACE", "webapp"), ("RESYNC_PERIOD_SECS", "soon")]).unwrap_err();
        assert!(err.to_string().contains("RESYNC_PERIOD_SECS"));

        let err = config(&[("WATCH_NAMESPACE", "webapp"), ("METRICS_ADDR", "localhost")]).unwrap_err();
        assert!(err.to_string().contains("METRICS_ADDR"));
    }
}
