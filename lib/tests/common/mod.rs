#![allow(dead_code)]

use std::{
    collections::HashMap,
    io,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Weekday};
use rust_decimal::Decimal;
use stock_lake::{
    error::{SourceError, WriteError},
    storage::ObjectClient,
    types::ChartRequest,
    MarketDataSource, PartitionKey, PriceRow, PriceSeries, StorageBackend,
};

/// `n` weekday rows starting 2024-01-01 with prices drifting upward.
pub fn trading_days(ticker: &str, n: usize) -> Vec<PriceRow> {
    let mut date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let mut rows = Vec::with_capacity(n);
    while rows.len() < n {
        if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            let step = Decimal::new(rows.len() as i64 * 25, 2);
            let open = Decimal::new(250_050, 2) + step;
            rows.push(PriceRow {
                date,
                open,
                high: open + Decimal::new(1_275, 2),
                low: open - Decimal::new(830, 2),
                close: open + Decimal::new(410, 2),
                volume: 1_000_000 + rows.len() as u64 * 1_000,
                ticker: ticker.to_string(),
            });
        }
        date = date.succ_opt().unwrap();
    }
    rows
}

/// Source that always answers with the same rows.
pub struct FixedSource {
    rows: Vec<PriceRow>,
    calls: Arc<AtomicUsize>,
}

impl FixedSource {
    /// The source plus a handle counting its fetches.
    pub fn new(rows: Vec<PriceRow>) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                rows,
                calls: calls.clone(),
            },
            calls,
        )
    }
}

#[async_trait]
impl MarketDataSource for FixedSource {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn fetch(
        &self,
        request: &ChartRequest<'_>,
    ) -> Result<PriceSeries, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(PriceSeries::new(request.ticker, self.rows.clone()))
    }
}

/// Source that fails like a dropped connection.
pub struct BrokenSource;

#[async_trait]
impl MarketDataSource for BrokenSource {
    fn name(&self) -> &str {
        "broken"
    }

    async fn fetch(
        &self,
        _request: &ChartRequest<'_>,
    ) -> Result<PriceSeries, SourceError> {
        Err(SourceError::Api {
            code: "Internal Server Error".to_string(),
            description: "upstream unavailable".to_string(),
        })
    }
}

/// Delegates to `inner` but refuses to write one date.
pub struct FailOn<B> {
    pub inner: B,
    pub date: NaiveDate,
}

#[async_trait]
impl<B: StorageBackend> StorageBackend for FailOn<B> {
    fn name(&self) -> &str {
        "fail-on"
    }

    async fn write_partition(
        &self,
        key: &PartitionKey,
        rows: &[PriceRow],
    ) -> Result<(), WriteError> {
        if rows.iter().any(|row| row.date == self.date) {
            return Err(io::Error::other("simulated disk failure").into());
        }
        self.inner.write_partition(key, rows).await
    }

    async fn read_partition(
        &self,
        key: &PartitionKey,
    ) -> Result<Vec<PriceRow>, WriteError> {
        self.inner.read_partition(key).await
    }
}

/// In-memory bucket.
#[derive(Default)]
pub struct MemoryBucket {
    pub objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
}

#[async_trait]
impl ObjectClient for MemoryBucket {
    async fn upload(
        &self,
        key: &str,
        content: &[u8],
        content_type: &str,
    ) -> Result<(), WriteError> {
        self.objects.lock().unwrap().insert(
            key.to_string(),
            (content.to_vec(), content_type.to_string()),
        );
        Ok(())
    }

    async fn download(&self, key: &str) -> Result<Vec<u8>, WriteError> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|(content, _)| content.clone())
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, key.to_string()).into()
            })
    }
}
