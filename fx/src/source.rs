//! Persistent rate sources the loader reads from.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{FxError, FxResult};

/// One raw row as stored by the persistent source.
///
/// The date is kept as text; the loader decides what part of it is a date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRow {
    pub date: String,
    pub currency_a: String,
    pub currency_b: String,
    pub rate: f64,
}

impl RateRow {
    pub fn new(
        date: impl Into<String>,
        currency_a: impl Into<String>,
        currency_b: impl Into<String>,
        rate: f64,
    ) -> Self {
        Self {
            date: date.into(),
            currency_a: currency_a.into(),
            currency_b: currency_b.into(),
            rate,
        }
    }
}

/// Trait for stores holding historical rate rows.
///
/// `fetch_all` is a blocking full read; the engine never writes back.
pub trait RateSource: Send + Sync {
    /// Source name used in logs and errors.
    fn name(&self) -> &str;

    /// Read every known row.
    fn fetch_all(&self) -> FxResult<Vec<RateRow>>;
}

/// Rate source backed by a row list held in memory.
///
/// Rows can be swapped at runtime, and the source can be told to fail, which
/// makes it the stand-in for a database in tests and embedded setups.
pub struct StaticRateSource {
    name: String,
    rows: Mutex<Vec<RateRow>>,
    failure: Mutex<Option<String>>,
    fetches: AtomicU64,
}

impl StaticRateSource {
    /// Create an empty source.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
            fetches: AtomicU64::new(0),
        }
    }

    /// Create a source holding `rows`.
    pub fn with_rows(name: impl Into<String>, rows: Vec<RateRow>) -> Self {
        let source = Self::new(name);
        *source.rows.lock() = rows;
        source
    }

    /// Append a row.
    pub fn push(&self, row: RateRow) {
        self.rows.lock().push(row);
    }

    /// Replace every row.
    pub fn replace(&self, rows: Vec<RateRow>) {
        *self.rows.lock() = rows;
    }

    /// Make subsequent reads fail with `reason`.
    pub fn fail_with(&self, reason: impl Into<String>) {
        *self.failure.lock() = Some(reason.into());
    }

    /// Make subsequent reads succeed again.
    pub fn recover(&self) {
        *self.failure.lock() = None;
    }

    /// Number of `fetch_all` calls so far, failed ones included.
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl RateSource for StaticRateSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch_all(&self) -> FxResult<Vec<RateRow>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = self.failure.lock().clone() {
            return Err(FxError::SourceUnavailable {
                source_name: self.name.clone(),
                reason,
            });
        }
        Ok(self.rows.lock().clone())
    }
}

#[cfg(feature = "sqlite")]
pub use self::sqlite::{SqliteRateSource, DEFAULT_TABLE};

#[cfg(feature = "sqlite")]
mod sqlite {
    use std::path::Path;

    use parking_lot::Mutex;
    use rusqlite::Connection;
    use tracing::debug;

    use super::{RateRow, RateSource};
    use crate::error::{FxError, FxResult};

    /// Default table holding historical rates.
    pub const DEFAULT_TABLE: &str = "_FXRates";

    /// Rate source reading a `(date, ccy1, ccy2, rate)` table from SQLite.
    pub struct SqliteRateSource {
        name: String,
        table: String,
        conn: Mutex<Connection>,
    }

    impl SqliteRateSource {
        /// Wrap an open connection, reading from the default table.
        pub fn new(conn: Connection) -> Self {
            Self {
                name: "sqlite".to_string(),
                table: DEFAULT_TABLE.to_string(),
                conn: Mutex::new(conn),
            }
        }

        /// Open the database file at `path`.
        pub fn open(path: impl AsRef<Path>) -> FxResult<Self> {
            let path = path.as_ref();
            let conn = Connection::open(path).map_err(|e| FxError::SourceUnavailable {
                source_name: path.display().to_string(),
                reason: format!("Failed to open database: {}", e),
            })?;
            Ok(Self::new(conn).with_name(path.display().to_string()))
        }

        /// Read from `table` instead of the default.
        pub fn with_table(mut self, table: impl Into<String>) -> Self {
            self.table = table.into();
            self
        }

        pub fn with_name(mut self, name: impl Into<String>) -> Self {
            self.name = name.into();
            self
        }

        fn unavailable(&self, e: rusqlite::Error) -> FxError {
            FxError::SourceUnavailable {
                source_name: self.name.clone(),
                reason: e.to_string(),
            }
        }
    }

    impl RateSource for SqliteRateSource {
        fn name(&self) -> &str {
            &self.name
        }

        fn fetch_all(&self) -> FxResult<Vec<RateRow>> {
            let conn = self.conn.lock();
            let sql = format!("SELECT date, ccy1, ccy2, rate FROM \"{}\"", self.table);
            let mut stmt = conn.prepare(&sql).map_err(|e| self.unavailable(e))?;

            let rows = stmt
                .query_map([], |row| {
                    Ok(RateRow {
                        date: row.get(0)?,
                        currency_a: row.get(1)?,
                        currency_b: row.get(2)?,
                        rate: row.get(3)?,
                    })
                })
                .map_err(|e| self.unavailable(e))?
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| self.unavailable(e))?;

            debug!(source = %self.name, table = %self.table, rows = rows.len(), "Read rate rows");
            Ok(rows)
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_source_returns_rows() {
        let source = StaticRateSource::with_rows(
            "static",
            vec![RateRow::new("2023-01-02", "USD", "CHF", 0.92)],
        );
        source.push(RateRow::new("2023-01-03", "USD", "CHF", 0.93));

        let rows = source.fetch_all().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(source.fetch_count(), 1);
    }

    #[test]
    fn test_static_source_failure_and_recovery() {
        let source = StaticRateSource::new("static");
        source.fail_with("connection refused");

        let err = source.fetch_all().unwrap_err();
        assert!(matches!(
            err,
            FxError::SourceUnavailable { ref reason, .. } if reason == "connection refused"
        ));

        source.recover();
        assert!(source.fetch_all().unwrap().is_empty());
        assert_eq!(source.fetch_count(), 2);
    }
}
