//! Check registry: discovery, lookup and hot reload.
//!
//! The registry is an explicit object handed to the orchestrator. Discovery
//! walks a catalog of [`CheckModule`] entries below a root directory in sorted
//! path order, loads each check exactly once and keys it by its qualified
//! name. A module that fails to load is logged and left out; the rest of the
//! catalog is unaffected.

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::checks::{Check, CheckModule};
use crate::core::config::ChecksConfig;

/// Ordered mapping from qualified check name to loaded check.
#[derive(Default)]
pub struct CheckRegistry {
    root: String,
    checks: IndexMap<String, Box<dyn Check>>,
}

/// Modules below `root`, sorted by path.
fn select<'a>(root: &str, catalog: &'a [CheckModule]) -> Vec<&'a CheckModule> {
    let mut modules: Vec<&CheckModule> = catalog.iter().filter(|m| m.is_below(root)).collect();
    modules.sort_by(|a, b| a.path.cmp(b.path));
    modules
}

impl CheckRegistry {
    /// A registry with no checks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk `catalog` below `root` and load every check.
    pub fn discover(root: &str, catalog: &[CheckModule], config: &ChecksConfig) -> Self {
        let mut checks: IndexMap<String, Box<dyn Check>> = IndexMap::new();

        for module in select(root, catalog) {
            if checks.contains_key(module.path) {
                warn!(
                    "Duplicate check '{}' in catalog, keeping the first one",
                    module.path
                );
                continue;
            }
            match (module.load)(config) {
                Ok(check) => {
                    debug!("Discovered check '{}'", module.path);
                    checks.insert(module.path.to_string(), check);
                }
                Err(e) => warn!("Skipping check '{}': {}", module.path, e),
            }
        }

        debug!("Discovered {} checks below '{}'", checks.len(), root);
        Self {
            root: root.to_string(),
            checks,
        }
    }

    /// Rebuild the registry in place from a (possibly changed) catalog.
    ///
    /// A check whose loader now fails keeps its previous instance. Checks no
    /// longer in the catalog are dropped. Returns the number of checks that
    /// were loaded fresh.
    pub fn reload(&mut self, catalog: &[CheckModule], config: &ChecksConfig) -> usize {
        let mut previous = std::mem::take(&mut self.checks);
        let mut fresh = 0;

        for module in select(&self.root, catalog) {
            if self.checks.contains_key(module.path) {
                warn!(
                    "Duplicate check '{}' in catalog, keeping the first one",
                    module.path
                );
                continue;
            }
            match (module.load)(config) {
                Ok(check) => {
                    fresh += 1;
                    self.checks.insert(module.path.to_string(), check);
                }
                Err(e) => match previous.shift_remove(module.path) {
                    Some(old) => {
                        warn!(
                            "Reloading check '{}' failed, keeping previous version: {}",
                            module.path, e
                        );
                        self.checks.insert(module.path.to_string(), old);
                    }
                    None => warn!("Skipping check '{}': {}", module.path, e),
                },
            }
        }

        debug!(
            "Reloaded {} of {} checks below '{}'",
            fresh,
            self.checks.len(),
            self.root
        );
        fresh
    }

    /// Catalog directory this registry was discovered from.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Look up a check by qualified name.
    pub fn get(&self, name: &str) -> Option<&dyn Check> {
        self.checks.get(name).map(|check| &**check)
    }

    /// Whether a check with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.checks.contains_key(name)
    }

    /// Checks in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn Check)> {
        self.checks
            .iter()
            .map(|(name, check)| (name.as_str(), &**check))
    }

    /// Names in discovery order.
    pub fn names(&self) -> Vec<&str> {
        self.checks.keys().map(String::as_str).collect()
    }

    /// Number of registered checks.
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// Whether no checks are registered.
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

impl std::fmt::Debug for CheckRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckRegistry")
            .field("root", &self.root)
            .field("checks", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::{catalog, CheckContext, RoutineCheck};
    use crate::core::errors::{HatError, Result};
    use crate::core::report::CheckResult;

    fn pass(_: &CheckContext<'_>) -> Result<CheckResult> {
        Ok(CheckResult::success())
    }

    fn load_pass(_: &ChecksConfig) -> Result<Box<dyn Check>> {
        Ok(Box::new(RoutineCheck::new("first", pass)))
    }

    fn load_other(_: &ChecksConfig) -> Result<Box<dyn Check>> {
        Ok(Box::new(RoutineCheck::new("second", pass)))
    }

    fn load_broken(_: &ChecksConfig) -> Result<Box<dyn Check>> {
        Err(HatError::config("broken module"))
    }

    /// Fails only when the config disables everything, to simulate a check
    /// that becomes unloadable after a config change.
    fn load_fragile(config: &ChecksConfig) -> Result<Box<dyn Check>> {
        if config.is_disabled("*") {
            Err(HatError::config("fragile module"))
        } else {
            Ok(Box::new(RoutineCheck::new("fragile", pass)))
        }
    }

    #[test]
    fn test_discovery_sorts_and_qualifies_names() {
        let fake = [
            CheckModule::new("materials/b", load_pass),
            CheckModule::new("a", load_pass),
            CheckModule::new("geometry/c", load_pass),
        ];
        let registry = CheckRegistry::discover("", &fake, &ChecksConfig::default());
        assert_eq!(registry.names(), vec!["a", "geometry/c", "materials/b"]);
    }

    #[test]
    fn test_broken_module_is_skipped() {
        let fake = [
            CheckModule::new("a", load_pass),
            CheckModule::new("b", load_broken),
            CheckModule::new("c", load_pass),
        ];
        let registry = CheckRegistry::discover("", &fake, &ChecksConfig::default());
        assert_eq!(registry.names(), vec!["a", "c"]);
        assert!(registry.get("b").is_none());
    }

    #[test]
    fn test_duplicate_keeps_first() {
        let fake = [
            CheckModule::new("dup", load_pass),
            CheckModule::new("dup", load_other),
        ];
        let registry = CheckRegistry::discover("", &fake, &ChecksConfig::default());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("dup").map(|c| c.description()), Some("first"));
    }

    #[test]
    fn test_root_limits_discovery() {
        let registry = CheckRegistry::discover("materials", &catalog(), &ChecksConfig::default());
        assert!(!registry.is_empty());
        assert!(registry.names().iter().all(|n| n.starts_with("materials/")));
        assert_eq!(registry.root(), "materials");
    }

    #[test]
    fn test_same_short_name_in_two_directories() {
        let fake = [
            CheckModule::new("files/files_exist", load_pass),
            CheckModule::new("files_exist", load_other),
        ];
        let registry = CheckRegistry::discover("", &fake, &ChecksConfig::default());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_reload_keeps_previous_on_failure() {
        let fake = [
            CheckModule::new("fragile", load_fragile),
            CheckModule::new("stable", load_pass),
        ];
        let mut registry = CheckRegistry::discover("", &fake, &ChecksConfig::default());
        assert_eq!(registry.len(), 2);

        let hostile = ChecksConfig {
            disabled: vec!["*".into()],
            ..ChecksConfig::default()
        };
        let fresh = registry.reload(&fake, &hostile);
        assert_eq!(fresh, 1);
        assert_eq!(registry.names(), vec!["fragile", "stable"]);
        assert_eq!(
            registry.get("fragile").map(|c| c.description()),
            Some("fragile")
        );
    }

    #[test]
    fn test_reload_picks_up_catalog_changes() {
        let mut registry = CheckRegistry::discover(
            "",
            &[CheckModule::new("a", load_pass)],
            &ChecksConfig::default(),
        );
        let changed = [
            CheckModule::new("a", load_other),
            CheckModule::new("b", load_pass),
        ];
        registry.reload(&changed, &ChecksConfig::default());
        assert_eq!(registry.names(), vec!["a", "b"]);
        assert_eq!(registry.get("a").map(|c| c.description()), Some("second"));
    }

    #[test]
    fn test_full_catalog_discovers_everything() {
        let registry = CheckRegistry::discover("", &catalog(), &ChecksConfig::default());
        assert_eq!(registry.len(), catalog().len());
        assert!(registry.contains("unsaved"));
        assert!(registry.contains("materials/no_math_nodes"));
    }
}
