//! On-disk compile cache.
//!
//! One JSON artifact per source file, named by the SHA-256 of the source's
//! absolute path. An artifact is reused only if it is at least as new as
//! the source and was compiled for the same path and the same operator set.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use xpp_types::ast::Program;

use crate::config::CacheConfig;

/// Directory created beside a source file when no cache dir is configured.
pub const CACHE_DIR_NAME: &str = ".xpp-cache";

/// What is written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheArtifact {
    /// Absolute path of the source this was compiled from.
    pub source: PathBuf,
    /// Fingerprint of the operator names the program was classified against.
    pub registry_digest: String,
    pub program: Program,
}

/// A cache directory.
#[derive(Debug, Clone)]
pub struct ProgramCache {
    dir: PathBuf,
}

impl ProgramCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The cache used for `source` under `config`.
    pub fn for_source(source: &Path, config: &CacheConfig) -> Self {
        match &config.dir {
            Some(dir) => Self::new(dir),
            None => {
                let parent = absolute(source)
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_default();
                Self::new(parent.join(CACHE_DIR_NAME))
            }
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the artifact for `source` lives.
    pub fn artifact_path(&self, source: &Path) -> PathBuf {
        let key = absolute(source);
        let digest = Sha256::digest(key.to_string_lossy().as_bytes());
        self.dir.join(format!("{digest:x}.json"))
    }

    /// A cached program for `source`, if a valid artifact exists.
    pub fn load(&self, source: &Path, registry_digest: &str) -> Option<Program> {
        let artifact_path = self.artifact_path(source);
        let source_time = modified(source)?;
        let artifact_time = modified(&artifact_path)?;
        if artifact_time < source_time {
            tracing::debug!(artifact = %artifact_path.display(), "cache artifact is stale");
            return None;
        }

        let bytes = fs::read(&artifact_path).ok()?;
        let artifact: CacheArtifact = match serde_json::from_slice(&bytes) {
            Ok(artifact) => artifact,
            Err(e) => {
                tracing::debug!(error = %e, "unreadable cache artifact");
                return None;
            }
        };
        if artifact.source != absolute(source) || artifact.registry_digest != registry_digest {
            tracing::debug!(artifact = %artifact_path.display(), "cache artifact does not match");
            return None;
        }
        Some(artifact.program)
    }

    /// Write the artifact for `source`, replacing any earlier one.
    pub fn store(
        &self,
        source: &Path,
        registry_digest: &str,
        program: &Program,
    ) -> io::Result<PathBuf> {
        let artifact = CacheArtifact {
            source: absolute(source),
            registry_digest: registry_digest.to_string(),
            program: program.clone(),
        };
        let bytes = serde_json::to_vec(&artifact)?;
        fs::create_dir_all(&self.dir)?;
        let path = self.artifact_path(source);
        fs::write(&path, bytes)?;
        Ok(path)
    }
}

/// Fingerprint a set of operator names, order-independent.
pub fn registry_digest<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    let mut names: Vec<&str> = names.into_iter().collect();
    names.sort_unstable();
    let mut hasher = Sha256::new();
    for name in names {
        hasher.update(name.as_bytes());
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}

fn absolute(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}
