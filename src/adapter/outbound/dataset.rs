//! CSV import of historical OHLC candles.
//!
//! Accepts MetaTrader-style exports:
//!
//! ```text
//! 2024.01.02,00:15:00,2063.10,2064.55,2062.80,2064.20,1520
//! 2024.01.02 00:15:00,2063.10,2064.55,2062.80,2064.20
//! ```
//!
//! Rows that are blank, too short, unparsable or fail the OHLC sanity check
//! are skipped, which also takes care of a header line.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, info};

use crate::domain::dataset::{Candle, Dataset};
use crate::error::{DatasetError, Result};
use crate::port::outbound::dataset::DatasetSource;

const DATETIME_FORMATS: &[&str] = &[
    "%Y.%m.%d %H:%M:%S",
    "%Y.%m.%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y.%m.%d", "%Y-%m-%d"];

/// Counts from one parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseReport {
    pub accepted: usize,
    pub skipped: usize,
}

/// Dataset source backed by a CSV file on disk.
pub struct CsvDatasetSource {
    path: PathBuf,
}

impl CsvDatasetSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DatasetSource for CsvDatasetSource {
    async fn load(&self) -> Result<Dataset> {
        let origin = self.path.display().to_string();
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| DatasetError::Read {
                path: origin.clone(),
                source,
            })?;

        let (candles, report) = parse_candles(&content);
        if candles.is_empty() {
            return Err(DatasetError::Empty(origin).into());
        }
        info!(
            path = %origin,
            candles = report.accepted,
            skipped = report.skipped,
            "Dataset imported"
        );
        Ok(Dataset::new(origin, candles))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Parse CSV text into candles, skipping rows that do not hold a valid bar.
#[must_use]
pub fn parse_candles(content: &str) -> (Vec<Candle>, ParseReport) {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let mut candles = Vec::new();
    let mut report = ParseReport::default();
    for (line, record) in reader.records().enumerate() {
        let parsed = record.ok().and_then(|r| parse_record(&r));
        match parsed {
            Some(candle) => {
                candles.push(candle);
                report.accepted += 1;
            }
            None => {
                report.skipped += 1;
                debug!(line = line + 1, "Skipping CSV row");
            }
        }
    }
    (candles, report)
}

fn parse_record(record: &StringRecord) -> Option<Candle> {
    if record.len() < 5 {
        return None;
    }
    let split_time = record.len() >= 6 && record.get(1).is_some_and(|f| f.contains(':'));
    let (timestamp, first_price) = if split_time {
        let joined = format!("{} {}", record.get(0)?, record.get(1)?);
        (parse_timestamp(&joined)?, 2)
    } else {
        (parse_timestamp(record.get(0)?)?, 1)
    };

    let price = |offset: usize| -> Option<f64> {
        record.get(first_price + offset)?.parse::<f64>().ok()
    };
    let candle = Candle {
        timestamp,
        open: price(0)?,
        high: price(1)?,
        low: price(2)?,
        close: price(3)?,
        volume: price(4),
    };
    candle.is_consistent().then_some(candle)
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(raw, f).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use std::io::Write;

    #[test]
    fn test_parses_split_date_time_with_volume() {
        let (candles, report) = parse_candles(
            "Date,Time,Open,High,Low,Close,Volume\n\
             2024.01.02,00:15:00,2063.10,2064.55,2062.80,2064.20,1520\n",
        );
        assert_eq!(report, ParseReport { accepted: 1, skipped: 1 });
        let c = candles[0];
        assert_eq!(c.timestamp.year(), 2024);
        assert_eq!(c.timestamp.minute(), 15);
        assert_eq!(c.close, 2064.20);
        assert_eq!(c.volume, Some(1520.0));
    }

    #[test]
    fn test_parses_combined_timestamp_without_volume() {
        let (candles, _) = parse_candles("2024.01.02 01:00:00,10,12,9,11\n");
        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].timestamp.hour(), 1);
        assert_eq!(candles[0].volume, None);
    }

    #[test]
    fn test_parses_date_only_rows() {
        let (candles, _) = parse_candles("2024-03-04,10,12,9,11\n");
        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].timestamp.day(), 4);
    }

    #[test]
    fn test_skips_blank_short_and_inconsistent_rows() {
        let (candles, report) = parse_candles(
            "\n\
             2024.01.02,00:15:00,1,2\n\
             2024.01.02,00:30:00,10,9,8,11,5\n\
             not-a-date,10,12,9,11\n\
             2024.01.02,00:45:00,10,12,9,11,5\n",
        );
        assert_eq!(candles.len(), 1);
        assert_eq!(report.skipped, 3);
    }

    #[tokio::test]
    async fn test_load_sorts_candles() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "2024.01.02,01:00:00,10,12,9,11,1").unwrap();
        writeln!(file, "2024.01.02,00:00:00,10,12,9,11,1").unwrap();

        let dataset = CsvDatasetSource::new(file.path()).load().await.unwrap();

        assert_eq!(dataset.len(), 2);
        assert!(dataset.candles()[0].timestamp < dataset.candles()[1].timestamp);
    }

    #[tokio::test]
    async fn test_load_rejects_file_without_candles() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Date,Time,Open,High,Low,Close").unwrap();

        let err = CsvDatasetSource::new(file.path()).load().await.unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Dataset(DatasetError::Empty(_))
        ));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = CsvDatasetSource::new("/definitely/not/here.csv")
            .load()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not/here.csv"));
    }
}
