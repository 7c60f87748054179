//! Parameter reconciliation.
//!
//! Brings the app container's environment and image into line with the
//! WebApp's parameters and the catalog. Variables the catalog does not name
//! are never touched.

use crate::catalog::ParameterCatalog;
use k8s_openapi::api::core::v1::{Container, EnvVar};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Ordered environment variable list with name lookup.
///
/// Edits keep the relative order of untouched variables: inserts go to the
/// end, overwrites stay in place and removals close the gap.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvVars {
    vars: Vec<EnvVar>,
}

impl EnvVars {
    pub fn new(vars: Vec<EnvVar>) -> Self {
        Self { vars }
    }

    fn positions(&self, name: &str) -> Vec<usize> {
        self.vars
            .iter()
            .enumerate()
            .filter(|(_, var)| var.name == name)
            .map(|(index, _)| index)
            .collect()
    }

    fn remove_at(&mut self, mut indexes: Vec<usize>) {
        indexes.sort_unstable();
        for index in indexes.into_iter().rev() {
            self.vars.remove(index);
        }
    }

    /// Sets `name` to `value`. Returns whether anything changed.
    ///
    /// Any duplicate entries for `name` after the first are dropped.
    pub fn upsert(&mut self, name: &str, value: &str) -> bool {
        let mut positions = self.positions(name);
        if positions.is_empty() {
            self.vars.push(EnvVar {
                name: name.to_string(),
                value: Some(value.to_string()),
                value_from: None,
            });
            return true;
        }

        let first = positions.remove(0);
        let var = &mut self.vars[first];
        let mut changed = false;
        if var.value.as_deref().unwrap_or_default() != value || var.value_from.is_some() {
            var.value = Some(value.to_string());
            var.value_from = None;
            changed = true;
        }

        if !positions.is_empty() {
            self.remove_at(positions);
            changed = true;
        }
        changed
    }

    /// Removes every entry called `name`. Returns whether one was present.
    pub fn remove(&mut self, name: &str) -> bool {
        let positions = self.positions(name);
        if positions.is_empty() {
            return false;
        }
        self.remove_at(positions);
        true
    }

    pub fn get(&self, name: &str) -> Option<&EnvVar> {
        self.vars.iter().find(|var| var.name == name)
    }

    pub fn into_vars(self) -> Vec<EnvVar> {
        self.vars
    }
}

/// Points the container at `image`. Returns whether it had to change.
pub fn migrate_image(container: &mut Container, image: &str) -> bool {
    if container.image.as_deref() == Some(image) {
        return false;
    }

    info!(
        "Migrating image from {} to {}",
        container.image.as_deref().unwrap_or("<none>"),
        image
    );
    container.image = Some(image.to_string());
    true
}

/// Reconciles the container against the catalog and the requested parameters.
///
/// For each catalog entry, in catalog order: a requested value is upserted;
/// otherwise the entry's default is upserted; otherwise the variable is
/// removed. The image is migrated first. Returns whether the container
/// changed, so an unchanged container never needs writing back.
pub fn reconcile_container(
    container: &mut Container,
    catalog: &ParameterCatalog,
    requested: &BTreeMap<String, String>,
) -> bool {
    let mut changed = migrate_image(container, &catalog.image);

    let had_env = container.env.is_some();
    let mut env = EnvVars::new(container.env.take().unwrap_or_default());

    for entry in &catalog.parameters {
        let updated = match requested.get(&entry.name).or(entry.default.as_ref()) {
            Some(value) => env.upsert(&entry.name, value),
            None => env.remove(&entry.name),
        };
        if updated {
            debug!("Environment variable {} changed", entry.name);
        }
        changed |= updated;
    }

    let vars = env.into_vars();
    container.env = if vars.is_empty() && !had_env { None } else { Some(vars) };
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;

    fn var(name: &str, value: &str) -> EnvVar {
        EnvVar {
            name: name.to_string(),
            value: Some(value.to_string()),
            value_from: None,
        }
    }

    fn container(image: &str, env: Vec<EnvVar>) -> Container {
        Container {
            name: "tutorial-web-app".to_string(),
            image: Some(image.to_string()),
            env: Some(env),
            ..Default::default()
        }
    }

    fn catalog(entries: &[(&str, Option<&str>)]) -> ParameterCatalog {
        ParameterCatalog {
            image: "quay.io/integreatly/tutorial-web-app:2.28.1".to_string(),
            parameters: entries
                .iter()
                .map(|(name, default)| CatalogEntry {
                    name: name.to_string(),
                    default: default.map(str::to_string),
                })
                .collect(),
        }
    }

    fn requested(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn names(container: &Container) -> Vec<&str> {
        container
            .env
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|v| v.name.as_str())
            .collect()
    }

    #[test]
    fn test_empty_env_gets_requested_value() {
        let catalog = ParameterCatalog::default();
        let mut c = container(&catalog.image, vec![]);
        c.env = Some(vec![]);

        // Undefaulted entries that were not requested stay absent.
        let changed = reconcile_container(
            &mut c,
            &catalog,
            &requested(&[("OPENSHIFT_OAUTHCLIENT_ID", "x")]),
        );

        assert!(changed);
        let env = EnvVars::new(c.env.clone().unwrap());
        assert_eq!(env.get("OPENSHIFT_OAUTHCLIENT_ID"), Some(&var("OPENSHIFT_OAUTHCLIENT_ID", "x")));
        assert!(env.get("OPENSHIFT_HOST").is_none());
    }

    #[test]
    fn test_single_requested_entry_without_defaults() {
        let catalog = catalog(&[("OPENSHIFT_OAUTHCLIENT_ID", None), ("SSO_ROUTE", None)]);
        let mut c = container(&catalog.image, vec![]);

        let changed = reconcile_container(&mut c, &catalog, &requested(&[("OPENSHIFT_OAUTHCLIENT_ID", "x")]));

        assert!(changed);
        assert_eq!(c.env, Some(vec![var("OPENSHIFT_OAUTHCLIENT_ID", "x")]));
    }

    #[test]
    fn test_requested_value_overwrites_in_place() {
        let catalog = catalog(&[("OPENSHIFT_HOST", None)]);
        let mut c = container(
            &catalog.image,
            vec![var("A", "1"), var("OPENSHIFT_HOST", "old"), var("B", "2")],
        );

        assert!(reconcile_container(&mut c, &catalog, &requested(&[("OPENSHIFT_HOST", "new")])));
        assert_eq!(
            c.env,
            Some(vec![var("A", "1"), var("OPENSHIFT_HOST", "new"), var("B", "2")])
        );
    }

    #[test]
    fn test_default_used_when_not_requested() {
        let catalog = catalog(&[("OPENSHIFT_VERSION", Some("3"))]);
        let mut c = container(&catalog.image, vec![]);

        assert!(reconcile_container(&mut c, &catalog, &BTreeMap::new()));
        assert_eq!(c.env, Some(vec![var("OPENSHIFT_VERSION", "3")]));
    }

    #[test]
    fn test_requested_value_beats_default() {
        let catalog = catalog(&[("OPENSHIFT_VERSION", Some("3"))]);
        let mut c = container(&catalog.image, vec![var("OPENSHIFT_VERSION", "3")]);

        assert!(reconcile_container(&mut c, &catalog, &requested(&[("OPENSHIFT_VERSION", "4")])));
        assert_eq!(c.env, Some(vec![var("OPENSHIFT_VERSION", "4")]));
    }

    #[test]
    fn test_undefaulted_absent_entry_is_removed_preserving_order() {
        let catalog = catalog(&[("SSO_ROUTE", None)]);
        let mut c = container(
            &catalog.image,
            vec![var("A", "1"), var("SSO_ROUTE", "sso"), var("B", "2"), var("C", "3")],
        );

        assert!(reconcile_container(&mut c, &catalog, &BTreeMap::new()));
        assert_eq!(names(&c), ["A", "B", "C"]);
    }

    #[test]
    fn test_unmanaged_variables_untouched() {
        let catalog = catalog(&[("OPENSHIFT_HOST", None)]);
        let mut c = container(&catalog.image, vec![var("NODE_ENV", "production")]);

        assert!(!reconcile_container(&mut c, &catalog, &BTreeMap::new()));
        assert_eq!(c.env, Some(vec![var("NODE_ENV", "production")]));
    }

    #[test]
    fn test_second_pass_is_a_no_op() {
        let catalog = ParameterCatalog::default();
        let req = requested(&[
            ("OPENSHIFT_OAUTHCLIENT_ID", "tutorial-web-app"),
            ("OPENSHIFT_HOST", "console.example.com"),
            ("ROUTING_SUBDOMAIN", "apps.example.com"),
        ]);
        let mut c = container("quay.io/integreatly/tutorial-web-app:2.10.0", vec![var("SSO_ROUTE", "sso")]);

        assert!(reconcile_container(&mut c, &catalog, &req));
        let after_first = c.clone();

        assert!(!reconcile_container(&mut c, &catalog, &req));
        assert_eq!(c, after_first);
    }

    #[test]
    fn test_image_mismatch_is_a_change() {
        let catalog = catalog(&[]);
        let mut c = container("quay.io/integreatly/tutorial-web-app:2.10.0", vec![]);

        assert!(reconcile_container(&mut c, &catalog, &BTreeMap::new()));
        assert_eq!(c.image.as_deref(), Some(catalog.image.as_str()));
    }

    #[test]
    fn test_missing_image_is_set() {
        let mut c = Container::default();
        assert!(migrate_image(&mut c, "quay.io/integreatly/tutorial-web-app:2.28.1"));
        assert!(!migrate_image(&mut c, "quay.io/integreatly/tutorial-web-app:2.28.1"));
    }

    #[test]
    fn test_no_env_stays_unset_when_nothing_added() {
        let catalog = catalog(&[("SSO_ROUTE", None)]);
        let mut c = container(&catalog.image, vec![]);
        c.env = None;

        assert!(!reconcile_container(&mut c, &catalog, &BTreeMap::new()));
        assert!(c.env.is_none());
    }

    #[test]
    fn test_upsert_collapses_duplicates() {
        let mut env = EnvVars::new(vec![var("X", "1"), var("A", "a"), var("X", "2")]);

        assert!(env.upsert("X", "1"));
        assert_eq!(env.clone().into_vars(), vec![var("X", "1"), var("A", "a")]);
        assert!(!env.upsert("X", "1"));
    }

    #[test]
    fn test_remove_drops_every_duplicate() {
        let mut env = EnvVars::new(vec![var("X", "1"), var("A", "a"), var("X", "2"), var("B", "b")]);

        assert!(env.remove("X"));
        assert_eq!(env.clone().into_vars(), vec![var("A", "a"), var("B", "b")]);
        assert!(!env.remove("X"));
    }

    #[test]
    fn test_upsert_replaces_value_from() {
        let mut env = EnvVars::new(vec![EnvVar {
            name: "X".to_string(),
            value: None,
            value_from: Some(Default::default()),
        }]);

        assert!(env.upsert("X", ""));
        assert_eq!(env.into_vars(), vec![var("X", "")]);
    }
}
