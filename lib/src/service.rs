use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, instrument, warn};

use crate::{
    config::Config,
    error::{Error, IngestError, SourceError},
    partition::PartitionKey,
    source::MarketDataSource,
    storage::{self, StorageBackend},
    types::{ChartRequestBuilder, Interval, Period, PriceSeries},
};

/// Outcome of a run that fetched data. Partial writes are still a success.
#[derive(Debug)]
pub struct Ingestion {
    /// Everything the source returned, whether or not its partition was written.
    pub series: PriceSeries,
    pub written: usize,
    pub failed: usize,
}

impl Ingestion {
    pub fn total(&self) -> usize {
        self.series.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Fetches a ticker's daily series and writes one partition per row.
pub struct Service<S> {
    source: S,
    concurrency: usize,
}

impl<S: MarketDataSource> Service<S> {
    /// Writes go out one at a time unless [`Service::with_concurrency`] says otherwise.
    pub fn new(source: S) -> Self {
        Self {
            source,
            concurrency: 1,
        }
    }

    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.concurrency = limit.max(1);
        self
    }

    /// Validate `config`, open its backend and ingest its ticker.
    ///
    /// Configuration and storage setup fail before the source is called.
    pub async fn run(&self, config: &Config) -> Result<Ingestion, Error> {
        config.validate()?;
        let backend = storage::open(config)?;
        Ok(self
            .ingest(&config.ticker, config.period, backend.as_ref())
            .await?)
    }

    #[instrument(skip_all, fields(ticker = %ticker, period = %period, backend = backend.name()))]
    pub async fn ingest(
        &self,
        ticker: &str,
        period: Period,
        backend: &dyn StorageBackend,
    ) -> Result<Ingestion, IngestError> {
        let source_failure = |source: SourceError| IngestError::SourceFailure {
            ticker: ticker.to_string(),
            source,
        };
        let request = ChartRequestBuilder::default()
            .ticker(ticker)
            .period(period)
            .interval(Interval::Daily)
            .build()
            .map_err(|e| source_failure(e.into()))?;

        info!(source = self.source.name(), "Fetching data...");
        let series = self
            .source
            .fetch(&request)
            .await
            .map_err(source_failure)?;
        if series.is_empty() {
            return Err(IngestError::NoData {
                ticker: ticker.to_string(),
            });
        }
        info!(
            num_rows = series.len(),
            first = ?series.first_date(),
            last = ?series.last_date(),
            "Fetched series"
        );

        let progress_bar =
            ProgressBar::new(series.len() as u64).with_style(style());
        let (mut written, mut failed) = (0, 0);
        {
            // `buffered` yields in input order, so logs stay in date order
            let mut writes = stream::iter(series.rows())
                .map(|row| async move {
                    let key = PartitionKey::build(ticker, row.date);
                    let result = backend
                        .write_partition(&key, std::slice::from_ref(row))
                        .await;
                    (key, result)
                })
                .buffered(self.concurrency);

            while let Some((key, result)) = writes.next().await {
                match result {
                    Ok(()) => written += 1,
                    Err(e) => {
                        failed += 1;
                        warn!(error = %e, key = %key, "Failed to write partition, skipping");
                    }
                }
                progress_bar.inc(1);
            }
        }
        progress_bar.finish();

        info!(written, failed, total = series.len(), "Finished writing partitions");
        Ok(Ingestion {
            series,
            written,
            failed,
        })
    }
}

fn style() -> ProgressStyle {
    ProgressStyle::with_template(
        "[{elapsed}] {bar:40.cyan/blue} {pos:>4}/{len:4} partitions {msg}",
    )
    .expect("always valid if tests pass")
}
