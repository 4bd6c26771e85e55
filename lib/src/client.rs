use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate};
use reqwest::{
    header::{self, HeaderMap, HeaderValue},
    StatusCode,
};
use rust_decimal::{prelude::FromPrimitive, Decimal};
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::{
    error::{self, SourceError},
    source::MarketDataSource,
    types::{ChartRequest, Period, PriceRow, PriceSeries},
};

const BASE_URL: &str = "https://query2.finance.yahoo.com";
// Yahoo rejects requests without a browser-like agent
const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Yahoo Finance v8 chart API.
#[derive(Clone)]
pub struct YahooClient {
    inner: reqwest::Client,
}

impl YahooClient {
    pub fn new() -> Result<Self, error::Init> {
        let headers = HeaderMap::from_iter([(
            header::ACCEPT,
            HeaderValue::from_static("application/json"),
        )]);
        let inner = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .build()
            .map_err(error::Init::ClientInitialization)?;
        Ok(Self { inner })
    }

    fn chart_url(request: &ChartRequest<'_>) -> Result<Url, SourceError> {
        let ChartRequest {
            ticker,
            period,
            interval,
            today,
        } = request;
        let mut params = vec![
            ("interval", interval.to_string()),
            ("includeAdjustedClose", "true".to_string()),
        ];
        match period.start_from(*today) {
            Some(start) => {
                params.push(("period1", midnight_timestamp(start).to_string()));
                // period2 is exclusive, so reach past today
                let end = today.checked_add_days(Days::new(1)).unwrap_or(*today);
                params.push(("period2", midnight_timestamp(end).to_string()));
            }
            None => params.push(("range", Period::Max.to_string())),
        }
        let mut url = Url::parse_with_params(
            &format!("{BASE_URL}/v8/finance/chart"),
            &params,
        )?;
        // pushed as a segment so `#`, `?` and `/` are percent-encoded
        url.path_segments_mut()
            .map_err(|()| {
                SourceError::InvalidUrl(
                    url::ParseError::RelativeUrlWithCannotBeABaseBase,
                )
            })?
            .push(ticker);
        Ok(url)
    }
}

#[async_trait]
impl MarketDataSource for YahooClient {
    fn name(&self) -> &str {
        "yahoo-finance"
    }

    #[instrument(skip_all, err, fields(ticker = %request.ticker, period = %request.period))]
    async fn fetch(
        &self,
        request: &ChartRequest<'_>,
    ) -> Result<PriceSeries, SourceError> {
        let url = Self::chart_url(request)?;
        let response = self
            .inner
            .get(url)
            .send()
            .await
            .map_err(SourceError::SendRequest)?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(status = %status, "Ticker not known to the data source");
            return Ok(PriceSeries::new(request.ticker, Vec::new()));
        }
        let response: ChartResponse = response
            .error_for_status()
            .map_err(SourceError::UnexpectedStatus)?
            .json()
            .await
            .map_err(SourceError::Deserialization)?;
        let series = parse_chart(request.ticker, response)?;
        debug!(status = %status, num_results = series.len(), "Got response");
        Ok(series)
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    /// Exchange offset from UTC in seconds.
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteData>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

fn parse_chart(
    ticker: &str,
    response: ChartResponse,
) -> Result<PriceSeries, SourceError> {
    if let Some(err) = response.chart.error {
        if err.code == "Not Found" {
            return Ok(PriceSeries::new(ticker, Vec::new()));
        }
        return Err(SourceError::Api {
            code: err.code,
            description: err.description,
        });
    }
    let Some(data) = response.chart.result.and_then(|r| r.into_iter().next())
    else {
        return Ok(PriceSeries::new(ticker, Vec::new()));
    };
    let quote = data.indicators.quote.into_iter().next().unwrap_or_default();
    let offset = data.meta.gmtoffset;

    let mut rows = Vec::with_capacity(data.timestamp.len());
    for (i, &ts) in data.timestamp.iter().enumerate() {
        let Some(date) = DateTime::from_timestamp(ts + offset, 0)
            .map(|dt| dt.date_naive())
        else {
            warn!(timestamp = ts, "Skipping bar with invalid timestamp");
            continue;
        };
        let price = |column: &[Option<f64>]| {
            column
                .get(i)
                .copied()
                .flatten()
                .and_then(Decimal::from_f64)
                .map(|d| d.normalize())
        };
        // holidays come back as all-null bars
        let (Some(open), Some(high), Some(low), Some(close)) = (
            price(quote.open.as_slice()),
            price(quote.high.as_slice()),
            price(quote.low.as_slice()),
            price(quote.close.as_slice()),
        ) else {
            debug!(%date, "Skipping bar without prices");
            continue;
        };
        rows.push(PriceRow {
            date,
            open,
            high,
            low,
            close,
            volume: quote.volume.get(i).copied().flatten().unwrap_or(0),
            ticker: ticker.to_string(),
        });
    }
    Ok(PriceSeries::new(ticker, rows))
}

fn midnight_timestamp(date: NaiveDate) -> i64 {
    date.and_time(chrono::NaiveTime::MIN).and_utc().timestamp()
}
