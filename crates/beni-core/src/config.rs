use std::collections::HashMap;
use std::env;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use url::Url;

use crate::net;
use crate::store::{self, CacheLocation};

pub const DEFAULT_GRAPH_URL: &str =
    "https://raw.githubusercontent.com/regro/cf-graph-countyfair/master/graph.json";
pub const DEFAULT_MAPPING_URL: &str = "https://raw.githubusercontent.com/regro/cf-graph-countyfair/master/mappings/pypi/grayskull_pypi_mapping.yaml";
pub const DEFAULT_MAX_AGE_SECS: u64 = 3600;

#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalOptions {
    pub quiet: bool,
}

/// Command-line settings that take precedence over the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub cache_dir: Option<PathBuf>,
    pub max_age: Option<u64>,
    pub offline: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    pub(crate) fn capture() -> Self {
        Self {
            vars: env::vars().collect(),
        }
    }

    pub(crate) fn var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Truthy unless unset or one of `0`, `false`, `no`, `off`, or empty.
    pub(crate) fn flag_is_enabled(&self, key: &str) -> bool {
        self.var(key).is_some_and(is_truthy)
    }

    #[cfg(test)]
    pub(crate) fn testing(pairs: &[(&str, &str)]) -> Self {
        let vars = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Self { vars }
    }
}

pub(crate) fn is_truthy(value: &str) -> bool {
    let lowered = value.trim().to_ascii_lowercase();
    !matches!(lowered.as_str(), "" | "0" | "false" | "no" | "off")
}

#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) cache: CacheConfig,
    pub(crate) network: NetworkConfig,
    pub(crate) sources: SourceConfig,
    pub(crate) python: PythonConfig,
    pub(crate) progress: bool,
}

impl Config {
    /// Builds a configuration snapshot from the current process environment,
    /// then applies `overrides`.
    pub fn from_env(overrides: &ConfigOverrides) -> Result<Self> {
        Self::from_snapshot(&EnvSnapshot::capture(), overrides)
    }

    pub(crate) fn from_snapshot(snapshot: &EnvSnapshot, overrides: &ConfigOverrides) -> Result<Self> {
        let location = match &overrides.cache_dir {
            Some(path) => CacheLocation {
                path: store::absolutize(path.clone())?,
                source: "--cache-dir",
            },
            None => store::resolve_cache_root(snapshot)?,
        };
        let max_age = match overrides.max_age {
            Some(secs) => secs,
            None => match snapshot.var("BENI_CACHE_MAX_AGE") {
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .with_context(|| format!("BENI_CACHE_MAX_AGE must be seconds, got `{raw}`"))?,
                None => DEFAULT_MAX_AGE_SECS,
            },
        };

        Ok(Self {
            cache: CacheConfig {
                location,
                max_age: Duration::from_secs(max_age),
            },
            network: NetworkConfig {
                offline: overrides.offline || snapshot.flag_is_enabled("BENI_OFFLINE"),
                keep_proxies: net::keep_proxies(snapshot),
            },
            sources: SourceConfig {
                graph_url: source_url(snapshot, "BENI_GRAPH_URL", DEFAULT_GRAPH_URL)?,
                mapping_url: source_url(snapshot, "BENI_MAPPING_URL", DEFAULT_MAPPING_URL)?,
            },
            python: PythonConfig {
                runtime: snapshot
                    .var("BENI_RUNTIME_PYTHON")
                    .filter(|value| !value.trim().is_empty())
                    .map(ToOwned::to_owned),
            },
            progress: match snapshot.var("BENI_PROGRESS") {
                Some(value) => value != "0",
                None => io::stderr().is_terminal(),
            },
        })
    }

    #[must_use]
    pub fn cache(&self) -> &CacheConfig {
        &self.cache
    }

    #[must_use]
    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    #[must_use]
    pub fn sources(&self) -> &SourceConfig {
        &self.sources
    }

    #[must_use]
    pub fn python(&self) -> &PythonConfig {
        &self.python
    }

    #[must_use]
    pub fn progress(&self) -> bool {
        self.progress
    }
}

fn source_url(snapshot: &EnvSnapshot, key: &str, default: &str) -> Result<Url> {
    let raw = snapshot
        .var(key)
        .filter(|value| !value.trim().is_empty())
        .unwrap_or(default);
    Url::parse(raw.trim()).with_context(|| format!("{key} is not a valid URL: `{raw}`"))
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub location: CacheLocation,
    pub max_age: Duration,
}

#[derive(Debug, Clone, Copy)]
pub struct NetworkConfig {
    pub offline: bool,
    pub keep_proxies: bool,
}

#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub graph_url: Url,
    pub mapping_url: Url,
}

#[derive(Debug, Clone)]
pub struct PythonConfig {
    pub runtime: Option<String>,
}
