//! Fetch a ticker's daily prices and store each day as its own partition,
//! `ticker=<TICKER>/date=<YYYY-MM-DD>.csv`, on local disk or in a bucket.

pub mod client;
pub mod companion;
pub mod config;
pub mod error;
pub mod partition;
pub mod projector;
pub mod service;
pub mod source;
pub mod storage;
pub mod types;

pub use error::Error;
pub use partition::PartitionKey;
pub use service::{Ingestion, Service};
pub use source::MarketDataSource;
pub use storage::StorageBackend;
pub use types::{Period, PriceRow, PriceSeries, StorageTarget};
