//! Bar loading for the command line and tests.
//!
//! Two sources:
//! - CSV with header `timestamp,open,high,low,close,volume`. The timestamp is
//!   epoch milliseconds, an RFC 3339 datetime, or a `YYYY-MM-DD` date (UTC
//!   midnight).
//! - Deterministic synthetic random-walk bars seeded by a label.
//!
//! Loading does not validate ordering or values; the runner rejects bad bars
//! at the point it reaches them.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use thiserror::Error;
use tradelab_core::PriceBar;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: unrecognised timestamp '{value}'")]
    Timestamp { row: usize, value: String },
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Parse bars from any CSV reader.
pub fn read_bars<R: Read>(reader: R) -> Result<Vec<PriceBar>, DataError> {
    let mut csv = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut bars = Vec::new();
    for (i, row) in csv.deserialize::<CsvRow>().enumerate() {
        let row = row?;
        let timestamp = parse_timestamp(&row.timestamp).ok_or_else(|| DataError::Timestamp {
            row: i + 1,
            value: row.timestamp.clone(),
        })?;
        bars.push(PriceBar::new(
            timestamp, row.open, row.high, row.low, row.close, row.volume,
        ));
    }
    Ok(bars)
}

pub fn load_bars_csv(path: impl AsRef<Path>) -> Result<Vec<PriceBar>, DataError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_bars(file)
}

/// Epoch milliseconds from ms, RFC 3339 or `YYYY-MM-DD`.
pub fn parse_timestamp(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(ms) = value.parse::<i64>() {
        return Some(ms);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.timestamp_millis());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// `count` random-walk bars starting at 100.0, one every `interval_ms`.
///
/// The same `seed` always yields the same series.
pub fn synthetic_bars(seed: &str, count: usize, start_ts: i64, interval_ms: i64) -> Vec<PriceBar> {
    let mut rng = StdRng::from_seed(*blake3::hash(seed.as_bytes()).as_bytes());

    let mut bars = Vec::with_capacity(count);
    let mut price = 100.0_f64;
    for i in 0..count {
        let step_return: f64 = rng.gen_range(-0.03..0.03);
        let open = price;
        let close = price * (1.0 + step_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(500.0..5_000.0);

        bars.push(PriceBar::new(
            start_ts + i as i64 * interval_ms,
            open,
            high,
            low,
            close,
            volume,
        ));
        price = close;
    }
    bars
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_timestamp_forms() {
        assert_eq!(parse_timestamp("1700000000000"), Some(1_700_000_000_000));
        assert_eq!(parse_timestamp("1970-01-02"), Some(86_400_000));
        assert_eq!(parse_timestamp("1970-01-01T00:00:01Z"), Some(1_000));
        assert_eq!(parse_timestamp("1970-01-01T01:00:00+01:00"), Some(0));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn reads_csv_rows() {
        let text = "timestamp,open,high,low,close,volume\n\
                    2024-01-01,10,12,9,11,100\n\
                    1704153600000, 11, 13, 10, 12, 200\n";
        let bars = read_bars(text.as_bytes()).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].timestamp, 1_704_067_200_000);
        assert_eq!(bars[1].timestamp, 1_704_153_600_000);
        assert_eq!(bars[1].close, 12.0);
        assert_eq!(bars[1].volume, 200.0);
    }

    #[test]
    fn bad_timestamp_reports_row() {
        let text = "timestamp,open,high,low,close,volume\n0,1,1,1,1,1\nnope,1,1,1,1,1\n";
        match read_bars(text.as_bytes()) {
            Err(DataError::Timestamp { row, value }) => {
                assert_eq!(row, 2);
                assert_eq!(value, "nope");
            }
            other => panic!("expected timestamp error, got {other:?}"),
        }
    }

    #[test]
    fn synthetic_is_deterministic() {
        let a = synthetic_bars("BTC-USD", 200, 0, 60_000);
        let b = synthetic_bars("BTC-USD", 200, 0, 60_000);
        let c = synthetic_bars("ETH-USD", 200, 0, 60_000);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a[199].timestamp, 199 * 60_000);
    }

    #[test]
    fn synthetic_bars_are_tradeable() {
        for bar in synthetic_bars("seed", 500, 0, 1) {
            assert!(bar.is_tradeable());
            assert!(bar.high >= bar.open.max(bar.close));
            assert!(bar.low <= bar.open.min(bar.close));
        }
    }
}
