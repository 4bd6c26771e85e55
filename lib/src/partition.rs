use std::{
    fmt,
    path::{Path, PathBuf},
};

use chrono::NaiveDate;

/// File extension shared by local files and object keys.
pub const PARTITION_EXTENSION: &str = "csv";

/// Canonical location of one `(ticker, date)` partition,
/// `ticker=<TICKER>/date=<YYYY-MM-DD>`.
///
/// The ticker is expected to be normalized already (see
/// [`crate::config::normalize_ticker`]), which also guarantees it holds no
/// `/`, so the `date=` segment always starts after the only separator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartitionKey(String);

impl PartitionKey {
    pub fn build(ticker: &str, date: NaiveDate) -> Self {
        Self(format!("ticker={ticker}/date={}", date.format("%Y-%m-%d")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Flat object-store key, `ticker=T/date=D.csv`.
    pub fn object_key(&self) -> String {
        format!("{}.{PARTITION_EXTENSION}", self.0)
    }

    /// Nested file path under `root`, `root/ticker=T/date=D.csv`.
    pub fn local_path(&self, root: &Path) -> PathBuf {
        self.0
            .split('/')
            .fold(root.to_path_buf(), |path, segment| path.join(segment))
            .with_extension(PARTITION_EXTENSION)
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
