//! Data loading
//!
//! Candle files are named `{symbol}_{timeframe}.csv` with the columns
//! `datetime,open,high,low,close,volume`; quote files are `{symbol}_quotes.csv`
//! with `datetime,bid,ask`. Datetimes are RFC 3339 or `%Y-%m-%d %H:%M:%S` (UTC).

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::security::Security;
use crate::{Candle, Quote, Symbol, Timeframe};

/// Parse a timestamp as RFC 3339 or as a naive UTC `%Y-%m-%d %H:%M:%S`
pub fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    value.parse::<DateTime<Utc>>().ok().or_else(|| {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(|ndt| DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc))
    })
}

/// Parse a `YYYY-MM-DD` date (start of day, UTC) or a full timestamp
pub fn parse_date(value: &str) -> Result<DateTime<Utc>> {
    if let Some(dt) = parse_datetime(value) {
        return Ok(dt);
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", value))?;
    let start = date
        .and_hms_opt(0, 0, 0)
        .context("Invalid start of day")?;
    Ok(DateTime::<Utc>::from_naive_utc_and_offset(start, Utc))
}

pub fn candle_path(data_dir: impl AsRef<Path>, symbol: &Symbol, timeframe: Timeframe) -> PathBuf {
    data_dir
        .as_ref()
        .join(format!("{}_{}.csv", symbol.as_str(), timeframe))
}

pub fn quote_path(data_dir: impl AsRef<Path>, symbol: &Symbol) -> PathBuf {
    data_dir
        .as_ref()
        .join(format!("{}_quotes.csv", symbol.as_str()))
}

fn field<'a>(record: &'a csv::StringRecord, index: usize, name: &str) -> Result<&'a str> {
    record
        .get(index)
        .with_context(|| format!("Missing {} column", name))
}

fn number(record: &csv::StringRecord, index: usize, name: &str) -> Result<f64> {
    field(record, index, name)?
        .trim()
        .parse()
        .with_context(|| format!("Failed to parse {}", name))
}

fn datetime(record: &csv::StringRecord) -> Result<DateTime<Utc>> {
    let raw = field(record, 0, "datetime")?.trim();
    parse_datetime(raw).with_context(|| format!("Failed to parse datetime: {}", raw))
}

/// Load OHLCV data from a CSV file, sorted by open time
pub fn load_csv(path: impl AsRef<Path>) -> Result<Vec<Candle>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open CSV file {}", path.display()))?;

    let mut candles = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;
        let parsed = (|| -> Result<Candle> {
            let candle = Candle::new(
                datetime(&record)?,
                number(&record, 1, "open")?,
                number(&record, 2, "high")?,
                number(&record, 3, "low")?,
                number(&record, 4, "close")?,
                number(&record, 5, "volume").unwrap_or(0.0),
            )?;
            Ok(candle)
        })();
        let candle =
            parsed.with_context(|| format!("{}: invalid row {}", path.display(), row_idx + 1))?;
        candles.push(candle);
    }

    candles.sort_by_key(|c| c.datetime);
    candles.dedup_by_key(|c| c.datetime);
    Ok(candles)
}

/// Load level-1 quotes (`datetime,bid,ask`), sorted by time
pub fn load_quotes(path: impl AsRef<Path>) -> Result<Vec<Quote>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open quote file {}", path.display()))?;

    let mut quotes = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;
        let quote = Quote {
            time: datetime(&record)?,
            bid: number(&record, 1, "bid")?,
            ask: number(&record, 2, "ask")?,
        };
        if quote.bid <= 0.0 || quote.ask < quote.bid {
            warn!(row = row_idx + 1, bid = quote.bid, ask = quote.ask, "Invalid quote skipped");
            continue;
        }
        quotes.push(quote);
    }

    quotes.sort_by_key(|q| q.time);
    Ok(quotes)
}

/// One quote per candle at its close with a fixed spread around the close
pub fn synthesize_quotes(
    candles: &[Candle],
    timeframe: Timeframe,
    security: &Security,
    spread_pips: f64,
) -> Vec<Quote> {
    let half = security.pips(spread_pips) / 2.0;
    candles
        .iter()
        .map(|c| Quote {
            time: c.close_time(timeframe),
            bid: security.round_price(c.close - half),
            ask: security.round_price(c.close + half),
        })
        .collect()
}

/// Load every requested timeframe of a symbol. All series must exist.
pub fn load_timeframes(
    data_dir: impl AsRef<Path>,
    symbol: &Symbol,
    timeframes: &[Timeframe],
) -> Result<BTreeMap<Timeframe, Vec<Candle>>> {
    let mut data = BTreeMap::new();

    for &timeframe in timeframes {
        if data.contains_key(&timeframe) {
            continue;
        }
        let path = candle_path(data_dir.as_ref(), symbol, timeframe);
        if !path.exists() {
            anyhow::bail!("Data file not found: {}", path.display());
        }

        let candles = load_csv(&path)
            .with_context(|| format!("Failed to load {} {} data", symbol, timeframe))?;
        if candles.is_empty() {
            anyhow::bail!("No candles in {}", path.display());
        }

        info!("Loaded {} {} candles for {}", candles.len(), timeframe, symbol);
        data.insert(timeframe, candles);
    }

    Ok(data)
}

/// Keep candles whose open time lies in `[start, end]`
pub fn filter_candles_by_date(
    candles: Vec<Candle>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Vec<Candle> {
    candles
        .into_iter()
        .filter(|c| start.map_or(true, |s| c.datetime >= s))
        .filter(|c| end.map_or(true, |e| c.datetime <= e))
        .collect()
}

pub fn filter_quotes_by_date(
    quotes: Vec<Quote>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Vec<Quote> {
    quotes
        .into_iter()
        .filter(|q| start.map_or(true, |s| q.time >= s))
        .filter(|q| end.map_or(true, |e| q.time <= e))
        .collect()
}

/// Check candle data for consistency
pub fn validate_candles(candles: &[Candle]) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if candles.is_empty() {
        errors.push("No candles provided".to_string());
        return ValidationResult { errors, warnings };
    }

    for (i, candle) in candles.iter().enumerate() {
        if let Err(e) = candle.validate() {
            errors.push(format!("Candle {}: {}", i, e));
        }
        if i > 0 && candle.datetime <= candles[i - 1].datetime {
            warnings.push(format!("Candle {}: not chronological", i));
        }
    }

    ValidationResult { errors, warnings }
}

/// Result of data validation
#[derive(Debug)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}
