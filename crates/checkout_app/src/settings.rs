//! Run settings: an optional RON file overlaid by command line flags.
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use checkout_core::{BatchConfig, ConfigError};
use checkout_engine::AlmaSettings;
use serde::Deserialize;

use crate::cli::Cli;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FileSettings {
    pub library: Option<String>,
    pub circ_desk: Option<String>,
    pub concurrency_limit: Option<usize>,
    pub retry_count: Option<u32>,
    pub base_delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
    pub base_url: Option<String>,
    pub output_dir: Option<PathBuf>,
}

impl FileSettings {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading settings file {}", path.display()))?;
        ron::from_str(&text).with_context(|| format!("parsing settings file {}", path.display()))
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub batch: BatchConfig,
    pub alma: AlmaSettings,
    pub output_dir: PathBuf,
}

impl Settings {
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => FileSettings::load(path)?,
            None => FileSettings::default(),
        };
        let settings = Self::merge(cli, file);
        settings.batch.validate().map_err(|err| {
            let hint = match err {
                ConfigError::MissingLibrary | ConfigError::MissingCircDesk => {
                    "unable to determine library and circulation desk; pass --library and --circ-desk"
                }
                ConfigError::ZeroConcurrency | ConfigError::DelayBounds { .. } => {
                    "invalid batch settings"
                }
            };
            anyhow::Error::new(err).context(hint)
        })?;
        Ok(settings)
    }

    fn merge(cli: &Cli, file: FileSettings) -> Self {
        let library = cli.library.clone().or(file.library).unwrap_or_default();
        let circ_desk = cli.circ_desk.clone().or(file.circ_desk).unwrap_or_default();
        let mut batch = BatchConfig::new(library, circ_desk);
        if let Some(limit) = cli.concurrency.or(file.concurrency_limit) {
            batch.concurrency_limit = limit;
        }
        if let Some(retries) = cli.retries.or(file.retry_count) {
            batch.retry_count = retries;
        }
        if let Some(base) = file.base_delay_ms {
            batch.base_delay_ms = base;
        }
        if let Some(max) = file.max_delay_ms {
            batch.max_delay_ms = max;
        }

        let mut alma = AlmaSettings::default();
        if let Some(base_url) = cli.base_url.clone().or(file.base_url) {
            alma.base_url = base_url;
        }
        alma.api_key = cli.api_key.clone();

        let output_dir = cli
            .output_dir
            .clone()
            .or(file.output_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        Self {
            batch,
            alma,
            output_dir,
        }
    }
}
