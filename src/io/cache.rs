//! Build manifest deciding whether persisted composites are still current.
//!
//! A manifest records the sorted source list (name, size, modification time)
//! and the warp target the composites were built from. Composites are reused
//! only when the recorded manifest equals the one computed now.
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEntry {
    pub file_name: String,
    pub len: u64,
    /// Nanoseconds since the Unix epoch
    pub modified_ns: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildManifest {
    pub target_srs: String,
    pub resample_alg: String,
    pub sources: Vec<SourceEntry>,
}

impl BuildManifest {
    /// Describe `files` as they are on disk now, in the given order
    pub fn compute(files: &[PathBuf], target_srs: &str, resample_alg: &str) -> Result<Self> {
        let mut sources = Vec::with_capacity(files.len());
        for path in files {
            let meta = std::fs::metadata(path)?;
            let modified_ns = meta
                .modified()?
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or(0);
            sources.push(SourceEntry {
                file_name: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                len: meta.len(),
                modified_ns,
            });
        }
        Ok(Self {
            target_srs: target_srs.to_string(),
            resample_alg: resample_alg.to_string(),
            sources,
        })
    }

    /// Previously written manifest, or `None` if missing or unreadable
    pub fn load(path: &Path) -> Option<Self> {
        let json = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str(&json) {
            Ok(m) => Some(m),
            Err(e) => {
                warn!("Ignoring corrupt build manifest {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Write atomically next to the composites
    pub fn store(&self, path: &Path) -> Result<()> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(serde_json::to_string_pretty(self)?.as_bytes())?;
        tmp.persist(path).map_err(|e| e.error)?;
        debug!("Wrote build manifest {}", path.display());
        Ok(())
    }

    /// True when `recorded` describes exactly the same build inputs
    pub fn matches(&self, recorded: Option<&BuildManifest>) -> bool {
        recorded == Some(self)
    }
}
