//! Bulk loading of rate rows into table-ready batches.

use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use ledgerfx_common::{parse_rate_date, Currency, Timestamp};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::FxResult;
use crate::source::{RateRow, RateSource};

/// A row that passed parsing and is ready for `RateTable::put`.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedRate {
    pub base: Currency,
    pub quote: Currency,
    pub date: NaiveDate,
    pub rate: f64,
}

/// Everything read by one loader pass.
///
/// A batch is built in full before anything touches the table, so a failed
/// read never leaves the table half updated.
#[derive(Debug, Clone, Default)]
pub struct RateBatch {
    pub rows: Vec<LoadedRate>,
    /// Rows dropped as unusable: bad date or currency code, a currency
    /// paired with itself, or a non-finite rate.
    pub skipped: usize,
}

impl RateBatch {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Outcome of a reload applied to the engine's table.
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    /// Rows written into the table.
    pub applied: usize,
    /// Rows dropped during parsing.
    pub skipped: usize,
    /// Distinct pairs in the table after the load.
    pub pairs: usize,
    /// When the load was marked complete.
    pub loaded_at: Timestamp,
}

/// Reads every row from a source and turns it into a `RateBatch`.
#[derive(Clone)]
pub struct RateLoader {
    source: Arc<dyn RateSource>,
}

impl RateLoader {
    pub fn new(source: Arc<dyn RateSource>) -> Self {
        Self { source }
    }

    /// Name of the underlying source.
    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Read the full row set. Blocks on the source.
    pub fn load(&self) -> FxResult<RateBatch> {
        let started = Instant::now();
        let raw = self.source.fetch_all()?;

        let mut batch = RateBatch {
            rows: Vec::with_capacity(raw.len()),
            skipped: 0,
        };
        for row in raw {
            match parse_row(&row) {
                Some(rate) => batch.rows.push(rate),
                None => {
                    warn!(
                        source = self.source.name(),
                        date = %row.date,
                        currency_a = %row.currency_a,
                        currency_b = %row.currency_b,
                        rate = row.rate,
                        "Skipping unusable rate row"
                    );
                    batch.skipped += 1;
                }
            }
        }

        debug!(
            source = self.source.name(),
            rows = batch.rows.len(),
            skipped = batch.skipped,
            elapsed = ?started.elapsed(),
            "Loaded rate batch"
        );
        Ok(batch)
    }
}

fn parse_row(row: &RateRow) -> Option<LoadedRate> {
    let date = parse_rate_date(&row.date).ok()?;
    let base = Currency::parse(&row.currency_a).ok()?;
    let quote = Currency::parse(&row.currency_b).ok()?;
    if base == quote || !row.rate.is_finite() {
        return None;
    }
    Some(LoadedRate {
        base,
        quote,
        date,
        rate: row.rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FxError;
    use crate::source::StaticRateSource;

    #[test]
    fn test_load_truncates_time_of_day() {
        let source = Arc::new(StaticRateSource::with_rows(
            "static",
            vec![
                RateRow::new("2023-01-10T23:59:59Z", "usd", "jpy", 131.0),
                RateRow::new("2023-01-11 00:00:00.000", "USD", "JPY", 132.0),
            ],
        ));
        let batch = RateLoader::new(source).load().unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.skipped, 0);
        assert_eq!(batch.rows[0].date, NaiveDate::from_ymd_opt(2023, 1, 10).unwrap());
        assert_eq!(batch.rows[0].base, Currency::usd());
        assert_eq!(batch.rows[1].date, NaiveDate::from_ymd_opt(2023, 1, 11).unwrap());
    }

    #[test]
    fn test_load_skips_unusable_rows() {
        let source = Arc::new(StaticRateSource::with_rows(
            "static",
            vec![
                RateRow::new("not a date", "USD", "JPY", 131.0),
                RateRow::new("2023-01-11", "", "JPY", 132.0),
                RateRow::new("2023-01-12", "USD", "JPY", 133.0),
            ],
        ));
        let batch = RateLoader::new(source).load().unwrap();

        assert_eq!(batch.len(), 1);
        assert_eq!(batch.skipped, 2);
        assert_eq!(batch.rows[0].rate, 133.0);
    }

    #[test]
    fn test_load_skips_self_pairs_and_non_finite_rates() {
        let source = Arc::new(StaticRateSource::with_rows(
            "static",
            vec![
                RateRow::new("2023-01-01", "USD", "usd", 1.0),
                RateRow::new("2023-01-01", "EUR", "USD", f64::NAN),
                RateRow::new("2023-01-01", "GBP", "USD", f64::INFINITY),
                RateRow::new("2023-01-01", "CHF", "USD", 0.0),
            ],
        ));
        let batch = RateLoader::new(source).load().unwrap();

        assert_eq!(batch.skipped, 3);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.rows[0].base, Currency::chf());
        assert_eq!(batch.rows[0].rate, 0.0);
    }

    #[test]
    fn test_load_propagates_source_failure() {
        let source = Arc::new(StaticRateSource::new("static"));
        source.fail_with("disk on fire");

        let result = RateLoader::new(source).load();
        assert!(matches!(result, Err(FxError::SourceUnavailable { .. })));
    }
}
