//! Durable partition storage.
//!
//! A [`StorageBackend`] is picked once per run and handed to the ingestion
//! service by reference. Each call writes exactly one artifact at the
//! location implied by its [`PartitionKey`], replacing whatever was there.

use async_trait::async_trait;
use csv::{ReaderBuilder, WriterBuilder};

use crate::{
    config::Config,
    error::WriteError,
    partition::PartitionKey,
    types::{PriceRow, StorageTarget},
};

pub mod local;
pub mod object;

pub use local::LocalStore;
pub use object::{ObjectClient, ObjectStore, CSV_CONTENT_TYPE};

#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Human-readable name used in logs.
    fn name(&self) -> &str;

    /// Persist `rows` as the whole content of `key` (last write wins).
    async fn write_partition(
        &self,
        key: &PartitionKey,
        rows: &[PriceRow],
    ) -> Result<(), WriteError>;

    /// Read back the rows stored under `key`.
    async fn read_partition(
        &self,
        key: &PartitionKey,
    ) -> Result<Vec<PriceRow>, WriteError>;
}

/// Build the backend a run is configured for.
///
/// Expects a validated [`Config`]; object storage authenticates here, before
/// any data is fetched.
pub fn open(config: &Config) -> Result<Box<dyn StorageBackend>, WriteError> {
    let backend: Box<dyn StorageBackend> = match config.storage {
        StorageTarget::Local => Box::new(LocalStore::new(&config.data_lake_dir)),
        StorageTarget::ObjectStore => {
            Box::new(ObjectStore::connect(&config.object_store)?)
        }
    };
    Ok(backend)
}

/// Serialize rows as CSV with a header line.
pub fn encode_rows(rows: &[PriceRow]) -> Result<Vec<u8>, WriteError> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| WriteError::IoFailure(e.into_error()))
}

pub fn decode_rows(bytes: &[u8]) -> Result<Vec<PriceRow>, WriteError> {
    ReaderBuilder::new()
        .from_reader(bytes)
        .deserialize::<PriceRow>()
        .map(|record| record.map_err(WriteError::from))
        .collect()
}
