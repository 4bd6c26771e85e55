use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

use crate::{
    error::ConfigError,
    storage::local::DEFAULT_DATA_LAKE_DIR,
    types::{Period, StorageTarget},
};

/// Shipped value of `bucket_name`. A run against object storage refuses it.
pub const PLACEHOLDER_BUCKET: &str = "your-gcs-bucket-name";
/// S3-compatible endpoint of Google Cloud Storage (interoperability API).
pub const DEFAULT_ENDPOINT: &str = "https://storage.googleapis.com";
pub const DEFAULT_REGION: &str = "auto";
/// HMAC access id for the object store.
pub const ACCESS_ID_VAR: &str = "GCS_HMAC_ACCESS_ID";
/// HMAC secret for the object store.
pub const SECRET_VAR: &str = "GCS_HMAC_SECRET";

/// Contents of an optional settings file (`.toml`, `.yaml` or `.json`).
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Root folder of the local data lake.
    pub data_lake_dir: Option<PathBuf>,
    /// How many partition writes may be in flight at once.
    pub concurrency: Option<usize>,
    pub object_store: Option<ObjectStoreConfig>,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ObjectStoreConfig {
    /// Bucket that receives the partitions. Must be edited before use.
    pub bucket_name: String,
    pub endpoint: String,
    pub region: String,
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        Self {
            bucket_name: PLACEHOLDER_BUCKET.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            region: DEFAULT_REGION.to_string(),
        }
    }
}

impl ObjectStoreConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bucket = self.bucket_name.trim();
        if bucket.is_empty() || bucket == PLACEHOLDER_BUCKET {
            return Err(ConfigError::PlaceholderBucket(
                PLACEHOLDER_BUCKET.to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    /// Normalized ticker, e.g. `RELIANCE.NS`.
    pub ticker: String,
    pub period: Period,
    pub storage: StorageTarget,
    /// The folder for local partitions. Partitions are saved
    /// in this structure: `$data_lake_dir/ticker=$TICKER/date=$YYYY-MM-DD.csv`
    pub data_lake_dir: PathBuf,
    pub object_store: ObjectStoreConfig,
    /// How many partition writes may be in flight at once
    pub concurrency: usize,
}

impl Config {
    pub fn new(ticker: &str, period: Period, storage: StorageTarget) -> Self {
        Self {
            ticker: ticker.to_string(),
            period,
            storage,
            data_lake_dir: PathBuf::from(DEFAULT_DATA_LAKE_DIR),
            object_store: ObjectStoreConfig::default(),
            concurrency: 1,
        }
    }

    /// Fill in anything a settings file provides.
    pub fn with_settings(mut self, settings: Settings) -> Self {
        if let Some(dir) = settings.data_lake_dir {
            self.data_lake_dir = dir;
        }
        if let Some(concurrency) = settings.concurrency {
            self.concurrency = concurrency;
        }
        if let Some(object_store) = settings.object_store {
            self.object_store = object_store;
        }
        self
    }

    /// Checks everything that must hold before a fetch is attempted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if normalize_ticker(&self.ticker)? != self.ticker {
            return Err(ConfigError::InvalidTicker(self.ticker.clone()));
        }
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency);
        }
        if self.storage == StorageTarget::ObjectStore {
            self.object_store.validate()?;
        }
        Ok(())
    }
}

/// Trim and uppercase a ticker, rejecting anything unsafe as a path segment.
pub fn normalize_ticker(raw: &str) -> Result<String, ConfigError> {
    let ticker = raw.trim().to_uppercase();
    if ticker.is_empty() {
        return Err(ConfigError::EmptyTicker);
    }
    let is_single_segment = matches!(
        Path::new(&ticker).components().collect::<Vec<_>>().as_slice(),
        [Component::Normal(_)]
    );
    if !is_single_segment
        || ticker.contains(['/', '\\', '#', '?', '%'])
        || ticker.chars().any(char::is_whitespace)
    {
        return Err(ConfigError::InvalidTicker(ticker));
    }
    Ok(ticker)
}
