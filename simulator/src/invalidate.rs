//! Cache invalidation on resource deletion.
//!
//! Deleting any cacheable resource inside a module — rule sources,
//! enumerations, scenarios — must drop the package's cached build artifacts
//! so the next resolution rebuilds. Every resource type plugs into the same
//! capability: a hook that filters delete events by resource type and routes
//! matching ones to the package invalidation. Nothing here is specific to
//! scenario execution.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use engine::manifest::MANIFEST_FILE;
use engine::resolve::ModuleResolver;

use crate::cache::BuildInfo;

/// Filter deciding which resource paths a hook reacts to.
pub trait ResourceTypeDefinition: Send + Sync {
    /// Short name used in logs.
    fn short_name(&self) -> &'static str;
    fn matches(&self, path: &Path) -> bool;
}

/// Scenario files (`*.scenario.toml`).
#[derive(Debug, Default)]
pub struct ScenarioResource;

impl ResourceTypeDefinition for ScenarioResource {
    fn short_name(&self) -> &'static str {
        "scenario"
    }

    fn matches(&self, path: &Path) -> bool {
        file_name(path).is_some_and(|name| name.ends_with(".scenario.toml"))
    }
}

/// Rule-module manifests (`module.toml`).
#[derive(Debug, Default)]
pub struct RuleModuleResource;

impl ResourceTypeDefinition for RuleModuleResource {
    fn short_name(&self) -> &'static str {
        "rule-module"
    }

    fn matches(&self, path: &Path) -> bool {
        file_name(path) == Some(MANIFEST_FILE)
    }
}

fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|name| name.to_str())
}

/// Delete hook for one resource type.
///
/// On a matching delete event, resolves the enclosing module and drops its
/// package from the build cache. Resolution works off the surviving module
/// manifest; if the whole module is gone, the next `resolve` fails before
/// the cache is consulted, so nothing stale can be served either way.
pub struct PackageCacheInvalidator<T: ResourceTypeDefinition> {
    resource_type: T,
    resolver: Arc<dyn ModuleResolver>,
    build_info: Arc<dyn BuildInfo>,
}

impl<T: ResourceTypeDefinition> PackageCacheInvalidator<T> {
    pub fn new(
        resource_type: T,
        resolver: Arc<dyn ModuleResolver>,
        build_info: Arc<dyn BuildInfo>,
    ) -> Self {
        Self {
            resource_type,
            resolver,
            build_info,
        }
    }

    /// Handle a delete event. Non-matching paths are ignored.
    pub fn on_deleted(&self, path: &Path) {
        if !self.resource_type.matches(path) {
            return;
        }
        match self.resolver.resolve(path) {
            Ok(module) => {
                debug!(
                    resource = self.resource_type.short_name(),
                    package = %module.package,
                    path = %path.display(),
                    "invalidating package cache on delete"
                );
                self.build_info.invalidate_package(&module.package);
            }
            Err(err) => {
                warn!(
                    resource = self.resource_type.short_name(),
                    path = %path.display(),
                    error = %err,
                    "delete event did not resolve to a module"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_resource_matches_suffix() {
        let resource = ScenarioResource;
        assert!(resource.matches(Path::new("/m/scenarios/smoke.scenario.toml")));
        assert!(!resource.matches(Path::new("/m/module.toml")));
        assert!(!resource.matches(Path::new("/m/notes.toml")));
    }

    #[test]
    fn rule_module_resource_matches_manifest() {
        let resource = RuleModuleResource;
        assert!(resource.matches(Path::new("/m/module.toml")));
        assert!(!resource.matches(Path::new("/m/sub.scenario.toml")));
    }
}
