use chrono::{Days, Months, NaiveDate, Utc};
use derive_builder::Builder;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How far back to fetch history, counted from the request's `today`.
#[derive(
    Debug,
    Default,
    Deserialize,
    Serialize,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
)]
pub enum Period {
    #[serde(rename = "7d")]
    #[strum(serialize = "7d")]
    Week,
    #[default]
    #[serde(rename = "1mo")]
    #[strum(serialize = "1mo")]
    Month,
    #[serde(rename = "1y")]
    #[strum(serialize = "1y")]
    Year,
    #[serde(rename = "3y")]
    #[strum(serialize = "3y")]
    ThreeYears,
    #[serde(rename = "5y")]
    #[strum(serialize = "5y")]
    FiveYears,
    #[serde(rename = "max")]
    #[strum(serialize = "max")]
    Max,
}

impl Period {
    /// First calendar day covered by this period, or `None` for [`Period::Max`].
    pub fn start_from(self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            Period::Week => today.checked_sub_days(Days::new(7)),
            Period::Month => today.checked_sub_months(Months::new(1)),
            Period::Year => today.checked_sub_months(Months::new(12)),
            Period::ThreeYears => today.checked_sub_months(Months::new(36)),
            Period::FiveYears => today.checked_sub_months(Months::new(60)),
            Period::Max => None,
        }
    }

    /// Label shown to an operator choosing a period.
    pub fn label(self) -> &'static str {
        match self {
            Period::Week => "Weekly (7d)",
            Period::Month => "Monthly (1mo)",
            Period::Year => "Yearly (1y)",
            Period::ThreeYears => "3 Years",
            Period::FiveYears => "5 Years",
            Period::Max => "All Time",
        }
    }
}

/// Bar granularity. Only daily bars are partitioned.
#[derive(
    Debug,
    Default,
    Deserialize,
    Serialize,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
)]
pub enum Interval {
    #[default]
    #[serde(rename = "1d")]
    #[strum(serialize = "1d")]
    Daily,
}

/// Where partitions are written. Chosen once per run.
#[derive(
    Debug,
    Default,
    Deserialize,
    Serialize,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StorageTarget {
    #[default]
    Local,
    #[serde(rename = "gcp", alias = "gcs")]
    #[strum(to_string = "gcp", serialize = "gcs")]
    ObjectStore,
}

#[derive(Builder, Debug, Clone)]
#[builder(setter(into))]
pub struct ChartRequest<'a> {
    pub ticker: &'a str,
    #[builder(default)]
    pub period: Period,
    #[builder(default)]
    pub interval: Interval,
    /// Anchor for relative periods. Defaults to the current UTC date.
    #[builder(default = "Utc::now().date_naive()")]
    pub today: NaiveDate,
}

/// One trading day for one ticker.
///
/// This is also the on-disk shape of a partition: serializing a row writes
/// `Date,Open,High,Low,Close,Volume,Ticker`, so every partition file names
/// its own ticker and date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PriceRow {
    pub date: NaiveDate,
    #[serde(with = "rust_decimal::serde::str")]
    pub open: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub high: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub low: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub close: Decimal,
    pub volume: u64,
    pub ticker: String,
}

/// Every row fetched for one ticker, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceSeries {
    ticker: String,
    rows: Vec<PriceRow>,
}

impl PriceSeries {
    /// Sorts `rows` by date. When two rows share a date the later one wins.
    pub fn new(ticker: impl Into<String>, mut rows: Vec<PriceRow>) -> Self {
        rows.sort_by_key(|row| row.date);
        rows.reverse();
        rows.dedup_by_key(|row| row.date);
        rows.reverse();
        Self {
            ticker: ticker.into(),
            rows,
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn rows(&self) -> &[PriceRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.first().map(|row| row.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|row| row.date)
    }
}
