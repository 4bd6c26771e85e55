use async_trait::async_trait;

use crate::{
    error::SourceError,
    types::{ChartRequest, PriceSeries},
};

/// Anything that can produce a daily price series for a ticker.
///
/// An unknown ticker is reported as an empty series, not as an error; the
/// ingestion service decides what an empty series means.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(
        &self,
        request: &ChartRequest<'_>,
    ) -> Result<PriceSeries, SourceError>;
}
