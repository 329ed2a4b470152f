use std::sync::{Arc, OnceLock};

use anyhow::Result;
use beni_domain::{host_marker_environment, MarkerEnvironment, FALLBACK_PYTHON_VERSION};
use tracing::{debug, warn};

use crate::config::{Config, ConfigOverrides, GlobalOptions};
use crate::effects::{Effects, SharedEffects, SystemEffects};
use crate::fetch::CachedFetcher;
use crate::progress::ProgressReporter;

pub struct CommandContext<'a> {
    pub global: &'a GlobalOptions,
    config: Config,
    marker_env: OnceLock<MarkerEnvironment>,
    effects: SharedEffects,
}

impl<'a> CommandContext<'a> {
    pub fn new(global: &'a GlobalOptions, config: Config, effects: SharedEffects) -> Self {
        Self {
            global,
            config,
            marker_env: OnceLock::new(),
            effects,
        }
    }

    /// Builds a context from the process environment and system effects.
    pub fn from_env(global: &'a GlobalOptions, overrides: &ConfigOverrides) -> Result<Self> {
        let config = Config::from_env(overrides)?;
        let effects = Arc::new(SystemEffects::new(config.network().keep_proxies)?);
        Ok(Self::new(global, config, effects))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn effects(&self) -> &dyn Effects {
        self.effects.as_ref()
    }

    pub fn fetcher(&self) -> CachedFetcher<'_> {
        let cache = self.config.cache();
        CachedFetcher::new(
            self.effects.documents(),
            cache.location.path.clone(),
            cache.max_age,
            self.config.network().offline,
        )
    }

    pub fn progress_enabled(&self) -> bool {
        self.config.progress() && !self.global.quiet
    }

    pub fn bar(&self, label: &str, total: usize) -> ProgressReporter {
        ProgressReporter::bar(label, total, self.progress_enabled())
    }

    /// The marker environment of the configured interpreter, or a host-derived
    /// approximation when it cannot be probed.
    pub fn marker_environment(&self) -> Result<&MarkerEnvironment> {
        if let Some(env) = self.marker_env.get() {
            return Ok(env);
        }
        let env = match self.probe_marker_environment() {
            Ok(env) => {
                debug!(
                    python = %env.python_full_version,
                    platform = %env.sys_platform,
                    "probed marker environment"
                );
                env
            }
            Err(err) => {
                warn!(
                    error = %err,
                    fallback = FALLBACK_PYTHON_VERSION,
                    "python probe failed; using host marker environment"
                );
                host_marker_environment(FALLBACK_PYTHON_VERSION)?
            }
        };
        Ok(self.marker_env.get_or_init(|| env))
    }

    fn probe_marker_environment(&self) -> Result<MarkerEnvironment> {
        let python = self
            .effects
            .python()
            .detect_interpreter(self.config.python().runtime.as_deref())?;
        self.effects.python().marker_environment(&python)
    }
}
