//! Main FX engine implementation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{Days, NaiveDate};
use ledgerfx_common::{
    parse_rate_date, Clock, CommonError, Currency, CurrencyPair, Money, SystemClock, Timestamp,
};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::config::FxEngineConfig;
use crate::conversion::{apply_rate, Conversion};
use crate::error::{FxError, FxResult};
use crate::loader::{LoadReport, RateBatch, RateLoader};
use crate::refresh::RefreshPolicy;
use crate::source::RateSource;
use crate::table::RateTable;

/// Hops allowed through the reference currency.
const MAX_TRIANGULATION_HOPS: u8 = 1;

/// Table and refresh bookkeeping, guarded together so a reload pass is
/// applied and marked in one exclusive section.
#[derive(Debug, Default)]
struct RateState {
    table: RateTable,
    refresh: RefreshPolicy,
    /// When the read behind the most recently applied pass started.
    applied_read_at: Option<Timestamp>,
}

/// Historical FX rate engine.
///
/// Holds the process-wide rate table, reloads it from its source when it
/// ages past the configured TTL, and answers `resolve` queries. Share it
/// between threads behind an `Arc`.
pub struct FxEngine {
    loader: RateLoader,
    state: RwLock<RateState>,
    clock: Arc<dyn Clock>,
    config: FxEngineConfig,
    reloads: AtomicU64,
    failed_reloads: AtomicU64,
}

impl FxEngine {
    /// Create an engine over `source`. Nothing is loaded until
    /// [`initialize`](Self::initialize) or the first lookup.
    pub fn new(source: Arc<dyn RateSource>, config: FxEngineConfig) -> Self {
        Self {
            loader: RateLoader::new(source),
            state: RwLock::new(RateState {
                table: RateTable::new(),
                refresh: RefreshPolicy::new(config.refresh_ttl),
                applied_read_at: None,
            }),
            clock: Arc::new(SystemClock),
            config,
            reloads: AtomicU64::new(0),
            failed_reloads: AtomicU64::new(0),
        }
    }

    /// Replace the wall clock, e.g. with a `ManualClock`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Perform the initial load.
    ///
    /// An error here means the engine has no data to serve; callers usually
    /// treat it as fatal at startup.
    pub fn initialize(&self) -> FxResult<LoadReport> {
        info!(
            source = self.loader.source_name(),
            lookback_days = self.config.lookback_days,
            refresh_ttl_secs = self.config.refresh_ttl.num_seconds(),
            reference = %self.config.reference_currency,
            "Initializing FX engine"
        );
        self.reload()
    }

    /// Read the source and apply every row, regardless of the TTL.
    ///
    /// Rows are read before the table is locked; the write lock is only held
    /// while the batch is applied. Existing entries missing from the source
    /// are kept.
    ///
    /// Concurrent reloads may finish out of order. A pass whose read started
    /// before the read of the pass already applied is dropped, so an older
    /// snapshot never overwrites a newer one.
    pub fn reload(&self) -> FxResult<LoadReport> {
        let read_at = self.clock.now();
        let batch = match self.loader.load() {
            Ok(batch) => batch,
            Err(e) => {
                self.failed_reloads.fetch_add(1, Ordering::Relaxed);
                warn!(source = self.loader.source_name(), error = %e, "Rate reload failed");
                return Err(e);
            }
        };

        let report = self.apply_batch(&batch, read_at);
        info!(
            source = self.loader.source_name(),
            applied = report.applied,
            skipped = report.skipped,
            pairs = report.pairs,
            "Rate table reloaded"
        );
        Ok(report)
    }

    /// Apply `batch` and mark the load in one exclusive section, unless a
    /// pass read after `read_at` is already in the table.
    fn apply_batch(&self, batch: &RateBatch, read_at: Timestamp) -> LoadReport {
        let mut state = self.state.write();

        if let Some(newer) = state.applied_read_at.filter(|applied| *applied > read_at) {
            debug!(read_at = %read_at, newer = %newer, "Dropping superseded rate pass");
            return LoadReport {
                applied: 0,
                skipped: batch.skipped,
                pairs: state.table.pair_count(),
                loaded_at: state.refresh.last_loaded_at().unwrap_or(newer),
            };
        }

        let loaded_at = self.clock.now();
        let applied = state.table.apply(batch);
        state.refresh.mark_loaded(loaded_at);
        state.applied_read_at = Some(read_at);
        self.reloads.fetch_add(1, Ordering::Relaxed);

        LoadReport {
            applied,
            skipped: batch.skipped,
            pairs: state.table.pair_count(),
            loaded_at,
        }
    }

    /// Rate converting `from` into `to` on `date`.
    ///
    /// Searches backward up to `lookback_days` for the most recent rate on
    /// or before `date`, then falls back to triangulating through the
    /// reference currency. A stale table is reloaded first; each
    /// triangulation leg may reload again, so a single call can pay for
    /// more than one source read.
    pub fn resolve(&self, date: NaiveDate, from: &Currency, to: &Currency) -> FxResult<f64> {
        self.resolve_with_hops(date, from, to, MAX_TRIANGULATION_HOPS)
    }

    /// [`resolve`](Self::resolve) with text inputs, e.g. straight from a record.
    pub fn resolve_str(&self, date: &str, from: &str, to: &str) -> FxResult<f64> {
        let date = parse_rate_date(date)?;
        let from = Currency::parse(from)?;
        let to = Currency::parse(to)?;
        self.resolve(date, &from, &to)
    }

    #[instrument(level = "debug", skip_all, fields(date = %date, from = %from, to = %to, hops = hops))]
    fn resolve_with_hops(
        &self,
        date: NaiveDate,
        from: &Currency,
        to: &Currency,
        hops: u8,
    ) -> FxResult<f64> {
        let refreshed = self.refresh_if_stale();

        if from == to {
            return Ok(1.0);
        }
        refreshed?;

        if let Some((found_on, rate)) = self.lookup_recent(date, from, to) {
            debug!(found_on = %found_on, rate, "Rate found");
            return Ok(rate);
        }

        let pair = CurrencyPair::new(from.clone(), to.clone());
        let reference = &self.config.reference_currency;
        if hops == 0 || pair.involves(reference) {
            return Err(FxError::RateNotFound {
                pair,
                date,
                triangulated: false,
            });
        }

        debug!(reference = %reference, "No direct rate, triangulating");
        let legs = self
            .resolve_with_hops(date, from, reference, hops - 1)
            .and_then(|from_ref| {
                let to_ref = self.resolve_with_hops(date, to, reference, hops - 1)?;
                Ok((from_ref, to_ref))
            });

        match legs {
            Ok((from_ref, to_ref)) => Ok(from_ref / to_ref),
            Err(e) => {
                debug!(error = %e, "Triangulation leg failed");
                Err(FxError::RateNotFound {
                    pair,
                    date,
                    triangulated: true,
                })
            }
        }
    }

    /// Reload if the TTL has passed.
    ///
    /// A failed reload is only an error when nothing was ever loaded;
    /// otherwise the existing table keeps serving.
    fn refresh_if_stale(&self) -> FxResult<()> {
        let now = self.clock.now();
        let stale = self.state.read().refresh.should_refresh(now);
        if !stale {
            return Ok(());
        }

        debug!("Rate table stale, reloading");
        match self.reload() {
            Ok(_) => Ok(()),
            Err(e) if self.state.read().refresh.has_loaded() => {
                debug!(error = %e, "Serving previously loaded rates");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn lookup_recent(
        &self,
        date: NaiveDate,
        from: &Currency,
        to: &Currency,
    ) -> Option<(NaiveDate, f64)> {
        let state = self.state.read();
        search_backward(&state.table, date, from, to, self.config.lookback_days)
    }

    /// Convert `amount` into `to` at the rate for `date`.
    pub fn convert(&self, amount: &Money, to: &Currency, date: NaiveDate) -> FxResult<Conversion> {
        let rate = self.resolve(date, &amount.currency, to)?;
        let output = apply_rate(amount, rate, to, date)?;
        Ok(Conversion::new(amount.clone(), output, rate, date))
    }

    /// Sum `amounts` in `base` currency at the rates for `date`.
    ///
    /// Each amount is converted and rounded individually before summing.
    pub fn total_in(&self, amounts: &[Money], base: &Currency, date: NaiveDate) -> FxResult<Money> {
        amounts.iter().try_fold(Money::zero(base.clone()), |total, amount| {
            let converted = self.convert(amount, base, date)?;
            (total + converted.output).map_err(|e| match e {
                CommonError::AmountOverflow(currency) => FxError::AmountOverflow { currency, date },
                other => other.into(),
            })
        })
    }

    pub fn config(&self) -> &FxEngineConfig {
        &self.config
    }

    /// Get engine statistics.
    pub fn stats(&self) -> FxEngineStats {
        let state = self.state.read();
        FxEngineStats {
            pairs: state.table.pair_count(),
            entries: state.table.len(),
            last_loaded_at: state.refresh.last_loaded_at(),
            reloads: self.reloads.load(Ordering::Relaxed),
            failed_reloads: self.failed_reloads.load(Ordering::Relaxed),
        }
    }
}

/// Most recent rate on or before `date`, looking at most `lookback_days` days back.
///
/// `date` itself counts as the first day of the window.
pub fn search_backward(
    table: &RateTable,
    date: NaiveDate,
    from: &Currency,
    to: &Currency,
    lookback_days: u32,
) -> Option<(NaiveDate, f64)> {
    (0..u64::from(lookback_days)).find_map(|offset| {
        let day = date.checked_sub_days(Days::new(offset))?;
        table.get(from, to, day).map(|rate| (day, rate))
    })
}

/// Engine statistics.
#[derive(Debug, Clone, Serialize)]
pub struct FxEngineStats {
    pub pairs: usize,
    pub entries: usize,
    pub last_loaded_at: Option<Timestamp>,
    pub reloads: u64,
    pub failed_reloads: u64,
}
