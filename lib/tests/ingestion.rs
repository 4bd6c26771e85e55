//! End-to-end ingestion against real directories and an in-memory bucket.

use std::sync::{atomic::Ordering, Arc};

use chrono::NaiveDate;
use stock_lake::{
    config::{Config, ObjectStoreConfig, PLACEHOLDER_BUCKET},
    error::{ConfigError, Error, IngestError},
    projector::project,
    storage::{LocalStore, ObjectStore, CSV_CONTENT_TYPE},
    PartitionKey, Period, Service, StorageBackend, StorageTarget,
};
use tempfile::TempDir;

mod common;
use common::{trading_days, BrokenSource, FailOn, FixedSource, MemoryBucket};

fn csv_files(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<_> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn one_month_of_test_ns_lands_as_21_files() {
    let tmp = TempDir::new().unwrap();
    let lake = tmp.path().join("stock_data_lake");
    let (source, _) = FixedSource::new(trading_days("TEST.NS", 21));
    let mut config = Config::new("TEST.NS", Period::Month, StorageTarget::Local);
    config.data_lake_dir = lake.clone();

    let ingestion = Service::new(source).run(&config).await.unwrap();

    assert_eq!((ingestion.written, ingestion.failed), (21, 0));
    assert_eq!(csv_files(&lake), ["ticker=TEST.NS"]);
    let dir = lake.join("ticker=TEST.NS");
    let files = csv_files(&dir);
    assert_eq!(files.len(), 21);
    assert_eq!(files[0], "date=2024-01-01.csv");
    assert_eq!(files[20], "date=2024-01-29.csv");
    for name in &files {
        let content = std::fs::read_to_string(dir.join(name)).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2, "{name} should hold a header and one row");
        assert_eq!(lines[0], "Date,Open,High,Low,Close,Volume,Ticker");
        assert!(lines[1].ends_with(",TEST.NS"));
    }
}

#[tokio::test]
async fn one_failed_write_keeps_the_rest_and_the_series() {
    let tmp = TempDir::new().unwrap();
    let rows = trading_days("TEST.NS", 5);
    let broken_day = rows[2].date;
    let (source, _) = FixedSource::new(rows.clone());
    let backend = FailOn {
        inner: LocalStore::new(tmp.path()),
        date: broken_day,
    };

    let ingestion = Service::new(source)
        .ingest("TEST.NS", Period::Week, &backend)
        .await
        .unwrap();

    assert_eq!(ingestion.total(), 5);
    assert_eq!((ingestion.written, ingestion.failed), (4, 1));
    assert!(!ingestion.is_complete());
    assert_eq!(ingestion.series.rows(), rows.as_slice());
    let files = csv_files(&tmp.path().join("ticker=TEST.NS"));
    assert_eq!(files.len(), 4);
    assert!(!files.contains(&format!("date={broken_day}.csv")));
}

#[tokio::test]
async fn concurrent_writes_produce_the_same_layout() {
    let tmp = TempDir::new().unwrap();
    let (source, _) = FixedSource::new(trading_days("TEST.NS", 12));

    let ingestion = Service::new(source)
        .with_concurrency(4)
        .ingest("TEST.NS", Period::Month, &LocalStore::new(tmp.path()))
        .await
        .unwrap();

    assert_eq!(ingestion.written, 12);
    assert_eq!(csv_files(&tmp.path().join("ticker=TEST.NS")).len(), 12);
}

#[tokio::test]
async fn empty_result_creates_nothing() {
    let tmp = TempDir::new().unwrap();
    let lake = tmp.path().join("stock_data_lake");
    let (source, calls) = FixedSource::new(Vec::new());
    let mut config = Config::new("NOPE.NS", Period::Year, StorageTarget::Local);
    config.data_lake_dir = lake.clone();

    let err = Service::new(source).run(&config).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Ingest(IngestError::NoData { ref ticker }) if ticker == "NOPE.NS"
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!lake.exists());
}

#[tokio::test]
async fn source_failure_is_reported_with_ticker() {
    let tmp = TempDir::new().unwrap();

    let err = Service::new(BrokenSource)
        .ingest("TEST.NS", Period::Month, &LocalStore::new(tmp.path()))
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(matches!(err, IngestError::SourceFailure { .. }));
    assert!(message.contains("TEST.NS"), "{message}");
    assert!(message.contains("upstream unavailable"), "{message}");
}

#[tokio::test]
async fn placeholder_bucket_fails_before_fetch() {
    let (source, calls) = FixedSource::new(trading_days("TEST.NS", 3));
    let mut config =
        Config::new("TEST.NS", Period::Month, StorageTarget::ObjectStore);
    config.object_store = ObjectStoreConfig {
        bucket_name: PLACEHOLDER_BUCKET.to_string(),
        ..ObjectStoreConfig::default()
    };

    let err = Service::new(source).run(&config).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Config(ConfigError::PlaceholderBucket(_))
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn object_store_partitions_read_back_intact() {
    let bucket = Arc::new(MemoryBucket::default());
    let store = ObjectStore::new("prices-prod", Box::new(bucket.clone()));
    let rows = trading_days("RELIANCE.NS", 3);
    let (source, _) = FixedSource::new(rows.clone());

    let ingestion = Service::new(source)
        .ingest("RELIANCE.NS", Period::Week, &store)
        .await
        .unwrap();

    assert_eq!(ingestion.written, 3);
    {
        let objects = bucket.objects.lock().unwrap();
        assert_eq!(objects.len(), 3);
        let (_, content_type) =
            &objects["ticker=RELIANCE.NS/date=2024-01-01.csv"];
        assert_eq!(content_type, CSV_CONTENT_TYPE);
    }
    for row in &rows {
        let key = PartitionKey::build(&row.ticker, row.date);
        assert_eq!(store.read_partition(&key).await.unwrap(), vec![row.clone()]);
    }
}

#[tokio::test]
async fn rewriting_a_day_keeps_only_the_new_content() {
    let tmp = TempDir::new().unwrap();
    let store = LocalStore::new(tmp.path());
    let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let mut rows = trading_days("TEST.NS", 2);
    let (first, _) = FixedSource::new(rows.clone());
    Service::new(first)
        .ingest("TEST.NS", Period::Week, &store)
        .await
        .unwrap();

    rows[1].close += rust_decimal::Decimal::ONE;
    let (second, _) = FixedSource::new(rows.clone());
    Service::new(second)
        .ingest("TEST.NS", Period::Week, &store)
        .await
        .unwrap();

    let key = PartitionKey::build("TEST.NS", day);
    assert_eq!(csv_files(&tmp.path().join("ticker=TEST.NS")).len(), 2);
    assert_eq!(store.read_partition(&key).await.unwrap(), vec![rows[1].clone()]);
}

#[tokio::test]
async fn projection_matches_fetched_series() {
    let tmp = TempDir::new().unwrap();
    let (source, _) = FixedSource::new(trading_days("TEST.NS", 7));

    let ingestion = Service::new(source)
        .ingest("TEST.NS", Period::Week, &LocalStore::new(tmp.path()))
        .await
        .unwrap();
    let table = project(&ingestion.series);

    assert_eq!(table.len(), 7);
    assert_eq!(table.close.last(), ingestion.series.rows().last().map(|r| &r.close));
    assert_eq!(table.tail(5).len(), 5);
}
