//! Build-artifact cache for compiled rule modules.
//!
//! Maps a module identity to its compiled artifacts: the fact registry and,
//! when rule compilation succeeds, the executable container. An entry is
//! built exactly once per key — concurrent resolvers of the same key wait
//! for the in-flight build and adopt its result — and lives until an
//! external invalidation removes it.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};

use tracing::{debug, warn};

use engine::compile::compile_rules;
use engine::container::RuleContainer;
use engine::registry::FactRegistry;
use engine::resolve::ModuleRef;

/// Compiled artifacts for one module.
///
/// `container` is `None` when the module's rules failed to compile; the
/// registry stays available and `diagnostics` carry the compile errors.
/// Callers must treat the absent container as fatal for execution, not as
/// something to retry.
#[derive(Debug)]
pub struct BuildArtifacts {
    pub registry: Arc<FactRegistry>,
    pub container: Option<Arc<RuleContainer>>,
    pub diagnostics: Vec<String>,
    pub fingerprint: String,
}

/// Backing primitive for artifact resolution. `BuildCache` is the in-process
/// default; an external provider can be substituted at composition time.
pub trait BuildInfo: Send + Sync {
    /// Return the cached artifacts for the module, building them first if
    /// this is the first resolution of the key. No staleness check: an
    /// existing entry is returned unchanged.
    fn get_or_create(&self, module: &ModuleRef) -> Arc<BuildArtifacts>;

    /// Drop every cached entry for the package so the next resolution
    /// performs a fresh build.
    fn invalidate_package(&self, package: &str);
}

/// Build step signature; substitutable so tests can count or stub builds.
pub type ArtifactBuilder = dyn Fn(&ModuleRef) -> BuildArtifacts + Send + Sync;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ModuleKey {
    root: PathBuf,
    package: String,
}

type Cell = Arc<OnceLock<Arc<BuildArtifacts>>>;

/// In-process implementation of [`BuildInfo`].
pub struct BuildCache {
    builder: Box<ArtifactBuilder>,
    entries: Mutex<HashMap<ModuleKey, Cell>>,
}

impl Default for BuildCache {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildCache {
    pub fn new() -> Self {
        Self::with_builder(Box::new(build_artifacts))
    }

    /// Substitute the build step.
    pub fn with_builder(builder: Box<ArtifactBuilder>) -> Self {
        Self {
            builder,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn cell(&self, key: ModuleKey) -> Cell {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        entries.entry(key).or_default().clone()
    }
}

impl BuildInfo for BuildCache {
    fn get_or_create(&self, module: &ModuleRef) -> Arc<BuildArtifacts> {
        let key = ModuleKey {
            root: module.root.clone(),
            package: module.package.clone(),
        };
        let cell = self.cell(key);
        // get_or_init serializes initializers per key: exactly one build
        // runs, concurrent losers block and adopt the winner's artifacts.
        cell.get_or_init(|| Arc::new((self.builder)(module))).clone()
    }

    fn invalidate_package(&self, package: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        let before = entries.len();
        entries.retain(|key, _| key.package != package);
        debug!(package, removed = before - entries.len(), "package cache invalidated");
    }
}

/// Build the artifact set for a resolved module.
///
/// Registry construction cannot fail on a validated manifest. Rule
/// compilation can; the entry is then cached container-less so a module with
/// compile errors is not recompiled on every call.
pub fn build_artifacts(module: &ModuleRef) -> BuildArtifacts {
    let registry = Arc::new(FactRegistry::from_manifest(&module.manifest));
    match compile_rules(&registry, &module.manifest.rules) {
        Ok(rules) => {
            debug!(
                package = %module.package,
                rules = rules.len(),
                fingerprint = %module.fingerprint,
                "module built"
            );
            BuildArtifacts {
                registry,
                container: Some(Arc::new(RuleContainer::new(rules))),
                diagnostics: Vec::new(),
                fingerprint: module.fingerprint.clone(),
            }
        }
        Err(errors) => {
            let diagnostics: Vec<String> = errors.iter().map(ToString::to_string).collect();
            warn!(
                package = %module.package,
                diagnostics = diagnostics.len(),
                "rule compilation failed; caching registry-only entry"
            );
            BuildArtifacts {
                registry,
                container: None,
                diagnostics,
                fingerprint: module.fingerprint.clone(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::manifest::ModuleManifest;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn module(package: &str) -> ModuleRef {
        let manifest = ModuleManifest::parse(
            Path::new("module.toml"),
            &format!(
            r#"
[module]
name = "claims"
package = "{package}"

[[facts]]
name = "claim"
fields = ["amount"]

[[rules]]
name = "approve_small"
when = "claim.amount < 500"
then = {{ verdict = "approve" }}
"#
            ),
        )
        .expect("manifest parses");
        ModuleRef {
            root: PathBuf::from(format!("/modules/{package}")),
            package: package.to_string(),
            manifest,
            fingerprint: "0011223344556677".to_string(),
        }
    }

    #[test]
    fn second_resolution_returns_the_same_artifacts() {
        let cache = BuildCache::new();
        let module = module("acme.claims");

        let first = cache.get_or_create(&module);
        let second = cache.get_or_create(&module);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first.registry, &second.registry));
        assert!(first.container.is_some());
    }

    #[test]
    fn invalidation_forces_a_fresh_build() {
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = builds.clone();
        let cache = BuildCache::with_builder(Box::new(move |module| {
            counter.fetch_add(1, Ordering::SeqCst);
            build_artifacts(module)
        }));
        let module = module("acme.claims");

        let first = cache.get_or_create(&module);
        cache.invalidate_package("acme.claims");
        let second = cache.get_or_create(&module);

        assert_eq!(builds.load(Ordering::SeqCst), 2);
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn invalidation_leaves_other_packages_cached() {
        let cache = BuildCache::new();
        let claims = module("acme.claims");
        let billing = module("acme.billing");

        let kept = cache.get_or_create(&billing);
        cache.get_or_create(&claims);
        cache.invalidate_package("acme.claims");

        assert!(Arc::ptr_eq(&kept, &cache.get_or_create(&billing)));
    }

    #[test]
    fn concurrent_resolution_builds_once() {
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = builds.clone();
        let cache = BuildCache::with_builder(Box::new(move |module| {
            counter.fetch_add(1, Ordering::SeqCst);
            // Widen the race window so every thread sees the in-flight build.
            std::thread::sleep(std::time::Duration::from_millis(50));
            build_artifacts(module)
        }));
        let module = module("acme.claims");

        let artifacts = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| cache.get_or_create(&module)))
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().expect("thread"))
                .collect::<Vec<_>>()
        });

        assert_eq!(builds.load(Ordering::SeqCst), 1);
        for other in &artifacts[1..] {
            assert!(Arc::ptr_eq(&artifacts[0], other));
        }
    }

    #[test]
    fn compile_failure_caches_registry_only_entry() {
        let mut module = module("acme.claims");
        module.manifest.rules[0].when = "claim.amount ~ 500".to_string();
        let cache = BuildCache::new();

        let artifacts = cache.get_or_create(&module);
        assert!(artifacts.container.is_none());
        assert!(!artifacts.diagnostics.is_empty());
        assert!(artifacts.diagnostics[0].contains("approve_small"));
        // The failed entry is cached, not rebuilt.
        assert!(Arc::ptr_eq(&artifacts, &cache.get_or_create(&module)));
    }
}
