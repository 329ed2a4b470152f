use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;

use crate::config::{is_truthy, EnvSnapshot};

pub(crate) const BENI_VERSION: &str = env!("CARGO_PKG_VERSION");

const PROXY_KEYS: &[&str] = &[
    "HTTP_PROXY",
    "http_proxy",
    "HTTPS_PROXY",
    "https_proxy",
    "ALL_PROXY",
    "all_proxy",
    "NO_PROXY",
    "no_proxy",
];

/// Decide whether standard proxy environment variables are honoured.
///
/// - `BENI_KEEP_PROXIES=1/true/yes/on` forces proxies on.
/// - `BENI_KEEP_PROXIES=0/false/no/off/""` forces proxies off.
/// - If unset, proxies are enabled only when at least one proxy env var is set.
pub(crate) fn keep_proxies(snapshot: &EnvSnapshot) -> bool {
    match snapshot.var("BENI_KEEP_PROXIES") {
        Some(raw) => is_truthy(raw),
        None => PROXY_KEYS.iter().any(|key| {
            snapshot
                .var(key)
                .is_some_and(|value| !value.trim().is_empty())
        }),
    }
}

pub(crate) fn build_http_client(keep_proxies: bool) -> Result<Client> {
    let builder = Client::builder()
        .user_agent(format!("beni/{BENI_VERSION}"))
        .timeout(Duration::from_secs(60));
    let builder = if keep_proxies {
        builder
    } else {
        builder.no_proxy()
    };
    builder.build().context("failed to build HTTP client")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keep_proxies_defaults_to_enabled_when_proxy_env_is_set() {
        let snapshot = EnvSnapshot::testing(&[("HTTPS_PROXY", "http://proxy.example")]);
        assert!(keep_proxies(&snapshot));
    }

    #[test]
    fn keep_proxies_defaults_to_disabled_without_proxy_env() {
        assert!(!keep_proxies(&EnvSnapshot::testing(&[])));
        assert!(!keep_proxies(&EnvSnapshot::testing(&[("no_proxy", "  ")])));
    }

    #[test]
    fn keep_proxies_env_var_forces_enabled() {
        let snapshot = EnvSnapshot::testing(&[("BENI_KEEP_PROXIES", "1")]);
        assert!(keep_proxies(&snapshot));
    }

    #[test]
    fn keep_proxies_env_var_forces_disabled() {
        let snapshot = EnvSnapshot::testing(&[
            ("BENI_KEEP_PROXIES", "0"),
            ("HTTP_PROXY", "http://proxy.example"),
        ]);
        assert!(!keep_proxies(&snapshot));
    }

    #[test]
    fn client_builds_with_and_without_proxies() -> Result<()> {
        build_http_client(true)?;
        build_http_client(false)?;
        Ok(())
    }
}
