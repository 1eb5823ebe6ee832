//! Module resolution: addressing a rule module by filesystem path.
//!
//! Resolution is a per-call step owned by the caller's collaborator graph;
//! the engine never caches references. A path addresses a module when it is,
//! or sits inside, a directory containing a `module.toml` manifest.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

use crate::manifest::{MANIFEST_FILE, ManifestError, ModuleManifest};

/// Resolved identity of a rule module.
///
/// Carries everything a build needs: the module root, the package identity
/// used as the invalidation key, the parsed manifest, and a short fingerprint
/// of the manifest source.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleRef {
    pub root: PathBuf,
    pub package: String,
    pub manifest: ModuleManifest,
    pub fingerprint: String,
}

#[derive(Debug, Error)]
pub enum ResolveError {
    /// The path does not address a known module.
    #[error("no module addresses {0}")]
    NotFound(PathBuf),
    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

/// Resolves a path to the module that owns it.
pub trait ModuleResolver: Send + Sync {
    fn resolve(&self, path: &Path) -> Result<ModuleRef, ResolveError>;
}

/// Filesystem resolver: walks up from `path` to the nearest directory with a
/// `module.toml` and loads it.
#[derive(Debug, Default)]
pub struct FsModuleResolver;

impl ModuleResolver for FsModuleResolver {
    fn resolve(&self, path: &Path) -> Result<ModuleRef, ResolveError> {
        let root = path
            .ancestors()
            .find(|candidate| candidate.join(MANIFEST_FILE).is_file())
            .ok_or_else(|| ResolveError::NotFound(path.to_path_buf()))?;

        let manifest_path = root.join(MANIFEST_FILE);
        let contents = fs::read_to_string(&manifest_path).map_err(|source| {
            ManifestError::Read {
                path: manifest_path.clone(),
                source,
            }
        })?;
        let manifest = ModuleManifest::parse(&manifest_path, &contents)?;
        let fingerprint = content_hash(&contents);
        debug!(
            package = %manifest.module.package,
            root = %root.display(),
            fingerprint,
            "module resolved"
        );

        Ok(ModuleRef {
            root: root.to_path_buf(),
            package: manifest.module.package.clone(),
            manifest,
            fingerprint,
        })
    }
}

/// Compute a short hash of manifest content for build identity.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..8])
}
