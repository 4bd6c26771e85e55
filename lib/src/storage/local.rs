use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, instrument};

use super::{decode_rows, encode_rows, StorageBackend};
use crate::{error::WriteError, partition::PartitionKey, types::PriceRow};

/// Default root of the local data lake, relative to the working directory.
pub const DEFAULT_DATA_LAKE_DIR: &str = "stock_data_lake";

/// Partitions as files under a root directory:
/// `$root/ticker=$TICKER/date=$YYYY-MM-DD.csv`.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, key: &PartitionKey) -> PathBuf {
        key.local_path(&self.root)
    }
}

#[async_trait]
impl StorageBackend for LocalStore {
    fn name(&self) -> &str {
        "local"
    }

    #[instrument(skip_all, err, fields(key = %key))]
    async fn write_partition(
        &self,
        key: &PartitionKey,
        rows: &[PriceRow],
    ) -> Result<(), WriteError> {
        let file_path = self.path_for(key);
        if let Some(parent_dir) = file_path.parent() {
            fs::create_dir_all(parent_dir).await?;
        }
        let contents = encode_rows(rows)?;
        // `fs::write` truncates, so a rewrite replaces the old partition
        fs::write(&file_path, contents).await?;
        debug!(path = ?file_path, num_rows = rows.len(), "Wrote partition");
        Ok(())
    }

    async fn read_partition(
        &self,
        key: &PartitionKey,
    ) -> Result<Vec<PriceRow>, WriteError> {
        let contents = fs::read(self.path_for(key)).await?;
        decode_rows(&contents)
    }
}
