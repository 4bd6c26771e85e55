use displaydoc::Display;
use thiserror::Error;

use crate::types::ChartRequestBuilderError;

/// Problems in run configuration. All of these are fatal before any fetch.
#[derive(Debug, Display, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Bucket name is still the placeholder `{0}`; set a real bucket before using object storage
    PlaceholderBucket(String),
    /// No ticker provided
    EmptyTicker,
    /// Ticker `{0}` cannot be used as a partition path segment
    InvalidTicker(String),
    /// Write concurrency must be at least 1
    InvalidConcurrency,
}

/// Fatal outcomes of an ingestion run.
#[derive(Debug, Display, Error)]
pub enum IngestError {
    /// No data found for '{ticker}'. Please check the symbol
    NoData { ticker: String },
    /// Failed to fetch data for '{ticker}': {source}
    SourceFailure {
        ticker: String,
        #[source]
        source: SourceError,
    },
}

/// Failure to persist or read back a single partition.
#[derive(Debug, Display, Error)]
pub enum WriteError {
    /// I/O failure: {0}
    IoFailure(#[from] std::io::Error),
    /// Could not authenticate the object store client: {0}
    AuthFailure(String),
    /// Error encoding CSV: {0}
    Csv(#[from] csv::Error),
}

#[derive(Debug, Display, Error)]
pub enum SourceError {
    /// Init error: {0}
    Init(#[from] Init),
    /// URL is not valid
    InvalidUrl(#[from] url::ParseError),
    /// Error sending request: {0}
    SendRequest(reqwest::Error),
    /// Failed to deserialize response: {0}
    Deserialization(reqwest::Error),
    /// Unexpected status code: {0}
    UnexpectedStatus(reqwest::Error),
    /// Data source returned an error: {code}: {description}
    Api { code: String, description: String },
    /// Invalid chart request: {0}
    InvalidRequest(#[from] ChartRequestBuilderError),
}

#[derive(Debug, Display, Error)]
pub enum Init {
    /// Failed to initialize the client: {0}
    ClientInitialization(reqwest::Error),
}

/// Any fatal outcome of a full run, tagged by the stage that failed.
#[derive(Debug, Display, Error)]
pub enum Error {
    /// Configuration error: {0}
    Config(#[from] ConfigError),
    /// Storage setup failed: {0}
    Storage(#[from] WriteError),
    /// {0}
    Ingest(#[from] IngestError),
}
