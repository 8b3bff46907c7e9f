//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use uuid::Uuid;

use crate::application::pagination::{DEFAULT_PAGE_SIZE, DEFAULT_PAGE_SIZE_OPTIONS};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "saldo";
const DEFAULT_STORAGE_PATH: &str = "saldo-customers.json";
const DEFAULT_DEBOUNCE_MS: u64 = 400;

/// Command-line arguments for the Saldo demo binary.
#[derive(Debug, Parser)]
#[command(name = "saldo", version, about = "Customer ledger data service")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "SALDO_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args, Default, Clone)]
pub struct Overrides {
    /// Override the path of the persisted customer blob.
    #[arg(long = "storage-path", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub storage_path: Option<PathBuf>,

    /// Override the simulated storage latency in milliseconds.
    #[arg(long = "storage-latency-ms", value_name = "MILLIS")]
    pub storage_latency_ms: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// List customers, optionally filtered and paginated.
    List(ListArgs),
    /// Create a customer.
    Add(AddArgs),
    /// Apply a partial update to a customer.
    Update(UpdateArgs),
    /// Delete customers by id.
    Remove(RemoveArgs),
    /// Reset the blob to the deterministic seed collection.
    Seed,
}

#[derive(Debug, Args, Clone)]
pub struct ListArgs {
    /// Search text matched against every customer field.
    #[arg(long, default_value = "")]
    pub search: String,

    /// Zero-based page index.
    #[arg(long, default_value_t = 0)]
    pub page: usize,

    /// Rows per page; must be one of the configured options.
    #[arg(long = "page-size")]
    pub page_size: Option<usize>,
}

#[derive(Debug, Args, Clone)]
pub struct AddArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub rate: f64,

    #[arg(long)]
    pub description: Option<String>,

    /// One of Open, Paid, Due, Inactive.
    #[arg(long)]
    pub status: Option<String>,

    #[arg(long)]
    pub balance: Option<f64>,

    #[arg(long)]
    pub deposit: Option<f64>,
}

#[derive(Debug, Args, Clone)]
pub struct UpdateArgs {
    pub id: Uuid,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// One of Open, Paid, Due, Inactive.
    #[arg(long)]
    pub status: Option<String>,

    #[arg(long)]
    pub rate: Option<f64>,

    #[arg(long)]
    pub balance: Option<f64>,

    #[arg(long)]
    pub deposit: Option<f64>,
}

#[derive(Debug, Args, Clone)]
pub struct RemoveArgs {
    /// One or more customer ids.
    #[arg(required = true)]
    pub ids: Vec<Uuid>,
}

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub storage: StorageSettings,
    pub query: QuerySettings,
    pub search: SearchSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone)]
pub struct StorageSettings {
    /// Path of the single JSON-array blob holding the full collection.
    pub path: PathBuf,
    /// Artificial per-operation latency for demos; `None` disables it.
    pub simulated_latency: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct QuerySettings {
    pub default_page_size: usize,
    pub page_size_options: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub debounce: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("SALDO").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

/// Resolve settings without a CLI context (library embedders, tests).
pub fn load_default() -> Result<Settings, LoadError> {
    Settings::from_raw(RawSettings::default())
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    storage: RawStorageSettings,
    query: RawQuerySettings,
    search: RawSearchSettings,
    logging: RawLoggingSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(path) = overrides.storage_path.as_ref() {
            self.storage.path = Some(path.clone());
        }
        if let Some(latency) = overrides.storage_latency_ms {
            self.storage.simulated_latency_ms = Some(latency);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawStorageSettings {
    path: Option<PathBuf>,
    simulated_latency_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawQuerySettings {
    default_page_size: Option<usize>,
    page_size_options: Option<Vec<usize>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSearchSettings {
    debounce_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        Ok(Self {
            storage: build_storage_settings(raw.storage),
            query: build_query_settings(raw.query)?,
            search: build_search_settings(raw.search),
            logging: build_logging_settings(raw.logging)?,
        })
    }
}

fn build_storage_settings(storage: RawStorageSettings) -> StorageSettings {
    StorageSettings {
        path: storage
            .path
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_PATH)),
        simulated_latency: storage
            .simulated_latency_ms
            .filter(|millis| *millis > 0)
            .map(Duration::from_millis),
    }
}

fn build_query_settings(query: RawQuerySettings) -> Result<QuerySettings, LoadError> {
    let page_size_options = query
        .page_size_options
        .unwrap_or_else(|| DEFAULT_PAGE_SIZE_OPTIONS.to_vec());
    if page_size_options.is_empty() {
        return Err(LoadError::invalid(
            "query.page_size_options",
            "must not be empty",
        ));
    }
    if page_size_options.contains(&0) {
        return Err(LoadError::invalid(
            "query.page_size_options",
            "page sizes must be greater than zero",
        ));
    }

    let default_page_size = query.default_page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    if !page_size_options.contains(&default_page_size) {
        return Err(LoadError::invalid(
            "query.default_page_size",
            format!("{default_page_size} is not one of the configured options"),
        ));
    }

    Ok(QuerySettings {
        default_page_size,
        page_size_options,
    })
}

fn build_search_settings(search: RawSearchSettings) -> SearchSettings {
    SearchSettings {
        debounce: Duration::from_millis(search.debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS)),
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_resolve_without_any_source() {
        let settings = load_default().expect("default settings");

        assert_eq!(settings.storage.path, PathBuf::from(DEFAULT_STORAGE_PATH));
        assert!(settings.storage.simulated_latency.is_none());
        assert_eq!(settings.query.default_page_size, 10);
        assert_eq!(settings.query.page_size_options, vec![10, 20, 30, 40, 50]);
        assert_eq!(settings.search.debounce, Duration::from_millis(400));
        assert_eq!(settings.logging.level, LevelFilter::INFO);
        assert!(matches!(settings.logging.format, LogFormat::Compact));
    }

    #[test]
    fn zero_latency_means_disabled() {
        let storage = build_storage_settings(RawStorageSettings {
            path: None,
            simulated_latency_ms: Some(0),
        });
        assert!(storage.simulated_latency.is_none());
    }

    #[test]
    fn default_page_size_must_be_an_allowed_option() {
        let err = build_query_settings(RawQuerySettings {
            default_page_size: Some(15),
            page_size_options: None,
        })
        .expect_err("15 is not an option");
        assert!(matches!(err, LoadError::Invalid { key, .. } if key == "query.default_page_size"));
    }

    #[test]
    fn zero_page_size_option_is_rejected() {
        let err = build_query_settings(RawQuerySettings {
            default_page_size: None,
            page_size_options: Some(vec![10, 0]),
        })
        .expect_err("zero page size rejected");
        assert!(matches!(err, LoadError::Invalid { key, .. } if key == "query.page_size_options"));
    }

    #[test]
    fn invalid_log_level_is_rejected() {
        let err = build_logging_settings(RawLoggingSettings {
            level: Some("verbose".to_string()),
            json: None,
        })
        .expect_err("unknown level rejected");
        assert!(matches!(err, LoadError::Invalid { key, .. } if key == "logging.level"));
    }

    #[test]
    fn overrides_take_precedence() {
        let mut raw = RawSettings::default();
        raw.apply_overrides(&Overrides {
            storage_path: Some(PathBuf::from("/tmp/ledger.json")),
            storage_latency_ms: Some(250),
            log_level: Some("debug".to_string()),
            log_json: Some(true),
        });

        let settings = Settings::from_raw(raw).expect("valid settings");
        assert_eq!(settings.storage.path, PathBuf::from("/tmp/ledger.json"));
        assert_eq!(
            settings.storage.simulated_latency,
            Some(Duration::from_millis(250))
        );
        assert_eq!(settings.logging.level, LevelFilter::DEBUG);
        assert!(matches!(settings.logging.format, LogFormat::Json));
    }
}
