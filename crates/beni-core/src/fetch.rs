use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use url::Url;

use crate::net::build_http_client;

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("GET {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("failed to fetch {url}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} is not cached and network access is disabled (BENI_OFFLINE/--offline)")]
    Offline { url: String },
}

/// Something that can produce the bytes behind a URL.
pub trait DocumentSource: Send + Sync {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>>;
}

pub struct HttpDocumentSource {
    client: Client,
}

impl HttpDocumentSource {
    pub fn new(keep_proxies: bool) -> Result<Self> {
        Ok(Self {
            client: build_http_client(keep_proxies)?,
        })
    }
}

impl DocumentSource for HttpDocumentSource {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>> {
        let transport = |source| FetchError::Transport {
            url: url.to_string(),
            source,
        };
        let response = self.client.get(url.clone()).send().map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
            .into());
        }
        let body = response.bytes().map_err(transport)?;
        Ok(body.to_vec())
    }
}

/// Serves documents through an on-disk cache laid out as
/// `<root>/<host>/<path segments>`, refetching entries older than `max_age`.
pub struct CachedFetcher<'a> {
    source: &'a dyn DocumentSource,
    root: PathBuf,
    max_age: Duration,
    offline: bool,
}

impl<'a> CachedFetcher<'a> {
    pub fn new(
        source: &'a dyn DocumentSource,
        root: impl Into<PathBuf>,
        max_age: Duration,
        offline: bool,
    ) -> Self {
        Self {
            source,
            root: root.into(),
            max_age,
            offline,
        }
    }

    #[must_use]
    pub fn cache_path(&self, url: &Url) -> PathBuf {
        let mut path = self.root.join(url.host_str().unwrap_or("localhost"));
        let mut segments = 0usize;
        for segment in url
            .path_segments()
            .into_iter()
            .flatten()
            .filter(|segment| !segment.is_empty())
        {
            path.push(segment);
            segments += 1;
        }
        if segments == 0 {
            path.push("index");
        }
        path
    }

    /// Returns the document at `url`, from cache when the entry is fresh
    /// (or whenever offline), otherwise from the source.
    pub fn fetch(&self, url: &Url) -> Result<Vec<u8>> {
        let path = self.cache_path(url);
        if path.is_file() && (self.offline || self.is_fresh(&path)) {
            debug!(url = %url, path = %path.display(), "document cache hit");
            return fs::read(&path)
                .with_context(|| format!("failed to read cached {}", path.display()));
        }
        if self.offline {
            return Err(FetchError::Offline {
                url: url.to_string(),
            }
            .into());
        }

        debug!(url = %url, path = %path.display(), "document cache miss");
        info!(url = %url, "fetching");
        let bytes = self.source.fetch(url)?;
        if let Err(err) = store_entry(&path, &bytes) {
            warn!(path = %path.display(), error = %err, "failed to write cache entry");
        }
        Ok(bytes)
    }

    fn is_fresh(&self, path: &Path) -> bool {
        let Ok(modified) = fs::metadata(path).and_then(|meta| meta.modified()) else {
            return false;
        };
        // mtimes in the future count as brand new
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        age <= self.max_age
    }
}

fn store_entry(path: &Path, bytes: &[u8]) -> Result<()> {
    write_entry(path, |file| file.write_all(bytes))
}

// The entry is written beside its final path and renamed over it once
// complete, so readers never observe a truncated document.
fn write_entry<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut NamedTempFile) -> io::Result<()>,
{
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)
        .with_context(|| format!("failed to create {}", parent.display()))?;
    let mut tmp = NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create temp file in {}", parent.display()))?;
    write(&mut tmp).with_context(|| format!("failed to write {}", path.display()))?;
    tmp.persist(path)
        .with_context(|| format!("failed to replace {}", path.display()))?;
    Ok(())
}
