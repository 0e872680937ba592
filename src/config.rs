use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ScoreError;

pub const DEFAULT_CONFIG_FILE: &str = "scorefetch.json";
pub const DEFAULT_CATALOG: &str = "repertoire.csv";
pub const DEFAULT_OUTPUT_DIR: &str = "scores";
pub const DEFAULT_QUOTA: u32 = 3;
pub const DEFAULT_RESULTS_PER_QUERY: usize = 30;
pub const DEFAULT_DOWNLOAD_DELAY_MS: u64 = 1000;
pub const DEFAULT_ENTRY_DELAY_MS: u64 = 1000;

/// Raw `scorefetch.json` shape; every field optional.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub catalog: Option<String>,
    #[serde(default)]
    pub output_dir: Option<String>,
    #[serde(default)]
    pub quota: Option<u32>,
    #[serde(default)]
    pub results_per_query: Option<usize>,
    #[serde(default)]
    pub download_delay_ms: Option<u64>,
    #[serde(default)]
    pub entry_delay_ms: Option<u64>,
}

/// Settings a run actually executes with, after defaults and config merge.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub catalog: PathBuf,
    pub output_dir: PathBuf,
    pub quota: u32,
    pub results_per_query: usize,
    pub download_delay: Duration,
    pub entry_delay: Duration,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            catalog: PathBuf::from(DEFAULT_CATALOG),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            quota: DEFAULT_QUOTA,
            results_per_query: DEFAULT_RESULTS_PER_QUERY,
            download_delay: Duration::from_millis(DEFAULT_DOWNLOAD_DELAY_MS),
            entry_delay: Duration::from_millis(DEFAULT_ENTRY_DELAY_MS),
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads settings from an explicit config path, or `scorefetch.json` in
    /// the working directory when present, or pure defaults otherwise. An
    /// explicitly named file must exist.
    pub fn resolve(path: Option<&str>) -> Result<RunSettings, ScoreError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(RunSettings::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| ScoreError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| ScoreError::ConfigParse(err.to_string()))?;
        Ok(Self::resolve_config(config))
    }

    pub fn resolve_config(config: Config) -> RunSettings {
        let defaults = RunSettings::default();
        RunSettings {
            catalog: config.catalog.map(PathBuf::from).unwrap_or(defaults.catalog),
            output_dir: config
                .output_dir
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            quota: config.quota.unwrap_or(defaults.quota),
            results_per_query: config
                .results_per_query
                .unwrap_or(defaults.results_per_query),
            download_delay: config
                .download_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.download_delay),
            entry_delay: config
                .entry_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.entry_delay),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_resolves_to_defaults() {
        let settings = ConfigLoader::resolve_config(Config::default());
        assert_eq!(settings.quota, DEFAULT_QUOTA);
        assert_eq!(settings.catalog, PathBuf::from(DEFAULT_CATALOG));
        assert_eq!(settings.download_delay, Duration::from_millis(1000));
    }

    #[test]
    fn explicit_fields_override_defaults() {
        let config = Config {
            catalog: Some("etudes.csv".to_string()),
            quota: Some(5),
            download_delay_ms: Some(0),
            ..Config::default()
        };
        let settings = ConfigLoader::resolve_config(config);
        assert_eq!(settings.catalog, PathBuf::from("etudes.csv"));
        assert_eq!(settings.quota, 5);
        assert_eq!(settings.download_delay, Duration::ZERO);
        assert_eq!(settings.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
    }
}
