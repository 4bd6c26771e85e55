//! Column-shaped view of a fetched series for whatever renders it.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::types::PriceSeries;

pub const COLUMNS: [&str; 6] = ["Date", "Open", "High", "Low", "Close", "Volume"];

/// Columns `Date, Open, High, Low, Close, Volume`, one entry per fetched row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceTable {
    pub date: Vec<NaiveDate>,
    pub open: Vec<Decimal>,
    pub high: Vec<Decimal>,
    pub low: Vec<Decimal>,
    pub close: Vec<Decimal>,
    pub volume: Vec<u64>,
}

pub fn project(series: &PriceSeries) -> PriceTable {
    PriceTable::from(series)
}

impl From<&PriceSeries> for PriceTable {
    fn from(series: &PriceSeries) -> Self {
        let rows = series.rows();
        Self {
            date: rows.iter().map(|r| r.date).collect(),
            open: rows.iter().map(|r| r.open).collect(),
            high: rows.iter().map(|r| r.high).collect(),
            low: rows.iter().map(|r| r.low).collect(),
            close: rows.iter().map(|r| r.close).collect(),
            volume: rows.iter().map(|r| r.volume).collect(),
        }
    }
}

impl PriceTable {
    pub fn len(&self) -> usize {
        self.date.len()
    }

    pub fn is_empty(&self) -> bool {
        self.date.is_empty()
    }

    /// The last `n` rows, or all of them if there are fewer.
    pub fn tail(&self, n: usize) -> PriceTable {
        let start = self.len().saturating_sub(n);
        PriceTable {
            date: self.date[start..].to_vec(),
            open: self.open[start..].to_vec(),
            high: self.high[start..].to_vec(),
            low: self.low[start..].to_vec(),
            close: self.close[start..].to_vec(),
            volume: self.volume[start..].to_vec(),
        }
    }

    fn cells(&self, i: usize) -> [String; 6] {
        [
            self.date[i].format("%Y-%m-%d").to_string(),
            self.open[i].to_string(),
            self.high[i].to_string(),
            self.low[i].to_string(),
            self.close[i].to_string(),
            self.volume[i].to_string(),
        ]
    }
}

/// Plain fixed-width table: dates left aligned, numbers right aligned.
impl fmt::Display for PriceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows: Vec<_> = (0..self.len()).map(|i| self.cells(i)).collect();
        let mut widths = COLUMNS.map(str::len);
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.len());
            }
        }

        let header = COLUMNS.map(str::to_string);
        for row in std::iter::once(&header).chain(&rows) {
            for (col, cell) in row.iter().enumerate() {
                if col == 0 {
                    write!(f, "{cell:<width$}", width = widths[col])?;
                } else {
                    write!(f, "  {cell:>width$}", width = widths[col])?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
