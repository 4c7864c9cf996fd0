use std::collections::HashMap;
use std::env;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use anyhow::{anyhow, Context as _};
use directories::ProjectDirs;

use crate::analysis::AnalysisMode;

const APP_NAME: &str = "deck-analysis";
const APP_AUTHOR: &str = "akio";
const APP_QUALIFIER: &str = "com";

const CONFIG_FILE_NAME: &str = "runtime_data.json";

pub const LAST_RUN_AT_KEY: &str = "last_run_at";
pub const LAST_RUN_MODE_KEY: &str = "last_run_mode";
pub const LAST_RUN_SUMMARY_KEY: &str = "last_run_summary";

const DEFAULT_CONNECTION: &str = "ws://localhost:8000";
const DEFAULT_NAMESPACE: &str = "mtg";
const DEFAULT_DATABASE: &str = "mtg";
const DEFAULT_CONCURRENCY: usize = 4;
const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;

/// Where deck data is read from and analyses are written to.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    pub connection: String,
    pub namespace: String,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub store: StoreConfig,
    pub mode: AnalysisMode,
    pub concurrency: usize,
    pub query_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            store: StoreConfig {
                connection: DEFAULT_CONNECTION.to_string(),
                namespace: DEFAULT_NAMESPACE.to_string(),
                database: DEFAULT_DATABASE.to_string(),
                username: None,
                password: None,
            },
            mode: AnalysisMode::FreshOnly,
            concurrency: DEFAULT_CONCURRENCY,
            query_timeout: Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = EngineConfig::default();

        let mode = match get("DECK_ANALYSIS_MODE") {
            Some(value) => AnalysisMode::from_str(&value)
                .map_err(|_| anyhow!("DECK_ANALYSIS_MODE must be fresh-only or overwrite, got {}", value))?,
            None => defaults.mode,
        };
        let concurrency = match get("DECK_ANALYSIS_CONCURRENCY") {
            Some(value) => value
                .parse::<usize>()
                .with_context(|| format!("invalid DECK_ANALYSIS_CONCURRENCY {}", value))?,
            None => defaults.concurrency,
        };
        let query_timeout = match get("DECK_ANALYSIS_QUERY_TIMEOUT_SECS") {
            Some(value) => Duration::from_secs(
                value
                    .parse::<u64>()
                    .with_context(|| format!("invalid DECK_ANALYSIS_QUERY_TIMEOUT_SECS {}", value))?,
            ),
            None => defaults.query_timeout,
        };

        Ok(EngineConfig {
            store: StoreConfig {
                connection: get("SURREAL_DB_HOST").unwrap_or(defaults.store.connection),
                namespace: get("SURREAL_DB_NS").unwrap_or(defaults.store.namespace),
                database: get("SURREAL_DB_NAME").unwrap_or(defaults.store.database),
                username: get("SURREAL_DB_USER"),
                password: get("SURREAL_DB_PASS"),
            },
            mode,
            concurrency: concurrency.max(1),
            query_timeout,
        })
    }
}

/// Small key/value file kept between runs, e.g. the last run summary.
pub struct Context {
    pub data: Arc<RwLock<HashMap<String, String>>>,
    config_file_path: PathBuf,
}

pub fn create_context() -> anyhow::Result<Context> {
    let project_dirs = ProjectDirs::from(APP_QUALIFIER, APP_AUTHOR, APP_NAME)
        .ok_or_else(|| anyhow!("Failed to get the project directory"))?;

    let runtime_dir = project_dirs.data_local_dir();
    log::debug!("Runtime directory: {:?}", runtime_dir);

    std::fs::create_dir_all(runtime_dir)
        .with_context(|| format!("Failed to create {:?}", runtime_dir))?;

    load_data_from_file(&runtime_dir.join(CONFIG_FILE_NAME))
}

pub fn load_data_from_file(config_file_path: &Path) -> anyhow::Result<Context> {
    let data = if config_file_path.exists() {
        let mut file = File::open(config_file_path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        if contents.trim().is_empty() {
            HashMap::new()
        } else {
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse {:?}", config_file_path))?
        }
    } else {
        HashMap::new()
    };

    Ok(Context {
        data: Arc::new(RwLock::new(data)),
        config_file_path: config_file_path.to_path_buf(),
    })
}

impl Context {
    pub fn read_data(&self, key: &str) -> Option<String> {
        let data_read = self.data.read().ok()?;
        data_read.get(key).cloned()
    }

    pub fn write_data(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut data_write = self
            .data
            .write()
            .map_err(|_| anyhow!("runtime data lock poisoned"))?;
        data_write.insert(key.to_string(), value.to_string());
        save_data(&self.config_file_path, &data_write)
    }
}

fn save_data(config_file_path: &Path, data: &HashMap<String, String>) -> anyhow::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(config_file_path)?;
    let content = serde_json::to_string(data)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn create_temp_file_path() -> PathBuf {
        NamedTempFile::new()
            .expect("Failed to create a temp file")
            .path()
            .to_path_buf()
    }

    #[test]
    fn test_read_write_data() {
        let config_file_path = create_temp_file_path();
        let runtime_data = load_data_from_file(&config_file_path).unwrap();

        assert_eq!(runtime_data.read_data("key"), None);

        runtime_data.write_data("key", "value").unwrap();
        assert_eq!(runtime_data.read_data("key"), Some("value".to_string()));
    }

    #[test]
    fn test_persistence() {
        let config_file_path = create_temp_file_path();

        {
            let runtime_data = load_data_from_file(&config_file_path).unwrap();
            runtime_data.write_data(LAST_RUN_MODE_KEY, "overwrite").unwrap();
        }

        {
            let runtime_data = load_data_from_file(&config_file_path).unwrap();
            assert_eq!(
                runtime_data.read_data(LAST_RUN_MODE_KEY),
                Some("overwrite".to_string())
            );
        }
    }

    fn lookup(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = EngineConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.mode, AnalysisMode::FreshOnly);
        assert_eq!(config.store.username, None);
    }

    #[test]
    fn test_config_from_env_values() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("SURREAL_DB_HOST", "https://db.example.com"),
            ("SURREAL_DB_USER", "root"),
            ("SURREAL_DB_PASS", "secret"),
            ("SURREAL_DB_NS", " "),
            ("DECK_ANALYSIS_MODE", "overwrite"),
            ("DECK_ANALYSIS_CONCURRENCY", "0"),
            ("DECK_ANALYSIS_QUERY_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();

        assert_eq!(config.store.connection, "https://db.example.com");
        assert_eq!(config.store.username.as_deref(), Some("root"));
        assert_eq!(config.store.namespace, "mtg");
        assert_eq!(config.mode, AnalysisMode::Overwrite);
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.query_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_config_rejects_unknown_mode() {
        assert!(EngineConfig::from_lookup(lookup(&[("DECK_ANALYSIS_MODE", "sometimes")])).is_err());
    }
}
