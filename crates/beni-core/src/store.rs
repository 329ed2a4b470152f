use std::path::PathBuf;

use anyhow::{Context, Result};
use dirs_next::{cache_dir, home_dir};

use crate::config::EnvSnapshot;

/// Where fetched documents are cached, and which setting picked it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLocation {
    pub path: PathBuf,
    pub source: &'static str,
}

/// Determine the root directory for the document cache.
///
/// `BENI_CACHE_PATH` wins; otherwise the platform cache directory is used,
/// then `$HOME/.cache`, then a directory under `/tmp`.
pub(crate) fn resolve_cache_root(snapshot: &EnvSnapshot) -> Result<CacheLocation> {
    if let Some(override_path) = snapshot.var("BENI_CACHE_PATH").filter(|v| !v.is_empty()) {
        return Ok(CacheLocation {
            path: absolutize(PathBuf::from(override_path))?,
            source: "BENI_CACHE_PATH",
        });
    }

    if let Some(base) = cache_dir() {
        return Ok(CacheLocation {
            path: base.join("beni"),
            source: "user cache dir",
        });
    }

    if let Some(home) = home_dir() {
        return Ok(CacheLocation {
            path: home.join(".cache").join("beni"),
            source: "HOME/.cache",
        });
    }

    Ok(CacheLocation {
        path: PathBuf::from("/tmp/beni-cache"),
        source: "default (/tmp/beni-cache)",
    })
}

pub(crate) fn absolutize(path: PathBuf) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(std::env::current_dir()
            .context("failed to resolve cache path")?
            .join(path))
    }
}
