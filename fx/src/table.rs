//! In-memory table of historical rates keyed by canonical currency pair.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use ledgerfx_common::{Currency, CurrencyPair};

use crate::loader::RateBatch;

/// Historical rates for every known pair, one direction per pair.
///
/// The first orientation seen for an unordered pair becomes its canonical
/// key; rates offered in the other orientation are inverted on the way in
/// and on the way out. A pair never appears under both orientations.
#[derive(Debug, Clone, Default)]
pub struct RateTable {
    rates: HashMap<CurrencyPair, BTreeMap<NaiveDate, f64>>,
}

impl RateTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `rate` for `base -> quote` on `date`.
    pub fn put(&mut self, base: &Currency, quote: &Currency, date: NaiveDate, rate: f64) {
        let pair = CurrencyPair::new(base.clone(), quote.clone());
        if let Some(dates) = self.rates.get_mut(&pair) {
            dates.insert(date, rate);
            return;
        }

        let inverse = pair.inverse();
        if let Some(dates) = self.rates.get_mut(&inverse) {
            dates.insert(date, 1.0 / rate);
            return;
        }

        self.rates.entry(pair).or_default().insert(date, rate);
    }

    /// Rate for `base -> quote` on exactly `date`, inverting if stored the other way.
    pub fn get(&self, base: &Currency, quote: &Currency, date: NaiveDate) -> Option<f64> {
        let pair = CurrencyPair::new(base.clone(), quote.clone());
        if let Some(dates) = self.rates.get(&pair) {
            return dates.get(&date).copied();
        }

        self.rates
            .get(&pair.inverse())
            .and_then(|dates| dates.get(&date))
            .map(|stored| 1.0 / stored)
    }

    /// The orientation under which the pair is stored, if it is stored at all.
    pub fn canonical_pair(&self, a: &Currency, b: &Currency) -> Option<CurrencyPair> {
        let pair = CurrencyPair::new(a.clone(), b.clone());
        if self.rates.contains_key(&pair) {
            return Some(pair);
        }
        let inverse = pair.inverse();
        self.rates.contains_key(&inverse).then_some(inverse)
    }

    /// Put every row of a loaded batch. Returns the number of rows applied.
    pub fn apply(&mut self, batch: &RateBatch) -> usize {
        for row in &batch.rows {
            self.put(&row.base, &row.quote, row.date, row.rate);
        }
        batch.rows.len()
    }

    /// Canonical pairs currently stored.
    pub fn pairs(&self) -> Vec<CurrencyPair> {
        let mut pairs: Vec<CurrencyPair> = self.rates.keys().cloned().collect();
        pairs.sort();
        pairs
    }

    /// Number of distinct pairs.
    pub fn pair_count(&self) -> usize {
        self.rates.len()
    }

    /// Number of dated entries across all pairs.
    pub fn len(&self) -> usize {
        self.rates.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}
