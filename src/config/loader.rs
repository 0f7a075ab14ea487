use anyhow::{Context, Result, bail};
use figment::Figment;
use figment::providers::{Env, Serialized};
use std::path::Path;

use super::{ENV_PREFIX, OutputConfig, smart_load};
use crate::shared::json::without_nulls;

impl OutputConfig {
    /// Loads the configuration from defaults, `config_path`, the environment
    /// and `overrides`, in increasing priority.
    ///
    /// `overrides` is a JSON object keyed like [`OutputConfig`]; null fields are
    /// dropped so that unset command-line flags leave lower layers alone.
    pub fn load(config_path: Option<&Path>, overrides: Option<serde_json::Value>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(OutputConfig::default()));

        if let Some(path) = config_path {
            if !path.is_file() {
                bail!("Config file not found: {}", path.display());
            }
            figment = figment.merge(smart_load::auto(path));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX));

        if let Some(overrides) = overrides {
            figment = figment.merge(Serialized::defaults(without_nulls(overrides)));
        }

        let mut config: OutputConfig = figment
            .extract()
            .context("Invalid output configuration")?;
        config.normalize();

        tracing::debug!(
            mode = ?config.mode,
            console = config.console,
            file = ?config.file,
            log_level = ?config.log_level,
            poll_interval_ms = config.poll_interval_ms,
            "output configuration loaded"
        );
        Ok(config)
    }
}
