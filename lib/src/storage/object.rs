use std::{io, sync::Arc};

use async_trait::async_trait;
use s3::{creds::Credentials, Bucket, Region};
use tracing::{debug, info, instrument};

use super::{decode_rows, encode_rows, StorageBackend};
use crate::{
    config::{ObjectStoreConfig, ACCESS_ID_VAR, SECRET_VAR},
    error::WriteError,
    partition::PartitionKey,
    types::PriceRow,
};

pub const CSV_CONTENT_TYPE: &str = "text/csv";

/// Minimal object API the store needs from a bucket client.
#[async_trait]
pub trait ObjectClient: Send + Sync {
    async fn upload(
        &self,
        key: &str,
        content: &[u8],
        content_type: &str,
    ) -> Result<(), WriteError>;

    async fn download(&self, key: &str) -> Result<Vec<u8>, WriteError>;
}

#[async_trait]
impl ObjectClient for Bucket {
    async fn upload(
        &self,
        key: &str,
        content: &[u8],
        content_type: &str,
    ) -> Result<(), WriteError> {
        let response = self
            .put_object_with_content_type(key, content, content_type)
            .await
            .map_err(io::Error::other)?;
        check_status(key, response.status_code())
    }

    async fn download(&self, key: &str) -> Result<Vec<u8>, WriteError> {
        let response = self.get_object(key).await.map_err(io::Error::other)?;
        check_status(key, response.status_code())?;
        Ok(response.as_slice().to_vec())
    }
}

#[async_trait]
impl<C: ObjectClient + ?Sized> ObjectClient for Arc<C> {
    async fn upload(
        &self,
        key: &str,
        content: &[u8],
        content_type: &str,
    ) -> Result<(), WriteError> {
        (**self).upload(key, content, content_type).await
    }

    async fn download(&self, key: &str) -> Result<Vec<u8>, WriteError> {
        (**self).download(key).await
    }
}

fn check_status(key: &str, status: u16) -> Result<(), WriteError> {
    match status {
        200..=299 => Ok(()),
        404 => Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("object store has no object at {key}"),
        )
        .into()),
        _ => Err(io::Error::other(format!(
            "object store returned status {status} for {key}"
        ))
        .into()),
    }
}

/// Partitions as flat objects `ticker=$TICKER/date=$YYYY-MM-DD.csv` in one bucket.
pub struct ObjectStore {
    bucket_name: String,
    client: Box<dyn ObjectClient>,
}

impl ObjectStore {
    pub fn new(
        bucket_name: impl Into<String>,
        client: Box<dyn ObjectClient>,
    ) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            client,
        }
    }

    /// Build an authenticated client for the configured bucket.
    ///
    /// Credentials are HMAC keys read from [`ACCESS_ID_VAR`] and
    /// [`SECRET_VAR`]. Nothing is sent over the network here.
    pub fn connect(config: &ObjectStoreConfig) -> Result<Self, WriteError> {
        let credentials = Credentials::from_env_specific(
            Some(ACCESS_ID_VAR),
            Some(SECRET_VAR),
            None,
            None,
        )
        .map_err(|e| {
            WriteError::AuthFailure(format!(
                "could not load credentials from {ACCESS_ID_VAR}/{SECRET_VAR}: {e}"
            ))
        })?;
        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };
        let bucket = Bucket::new(&config.bucket_name, region, credentials)
            .map_err(|e| WriteError::AuthFailure(e.to_string()))?;
        info!(
            bucket = %config.bucket_name,
            endpoint = %config.endpoint,
            "Object store client ready"
        );
        Ok(Self::new(config.bucket_name.clone(), bucket))
    }
}

#[async_trait]
impl StorageBackend for ObjectStore {
    fn name(&self) -> &str {
        "object-store"
    }

    #[instrument(skip_all, err, fields(bucket = %self.bucket_name, key = %key))]
    async fn write_partition(
        &self,
        key: &PartitionKey,
        rows: &[PriceRow],
    ) -> Result<(), WriteError> {
        let contents = encode_rows(rows)?;
        let object_key = key.object_key();
        self.client
            .upload(&object_key, &contents, CSV_CONTENT_TYPE)
            .await?;
        debug!(%object_key, num_bytes = contents.len(), "Uploaded partition");
        Ok(())
    }

    async fn read_partition(
        &self,
        key: &PartitionKey,
    ) -> Result<Vec<PriceRow>, WriteError> {
        let contents = self.client.download(&key.object_key()).await?;
        decode_rows(&contents)
    }
}
