//! FX engine configuration.

use chrono::Duration;
use ledgerfx_common::{constants, Currency};
use tracing::warn;

use crate::error::{FxError, FxResult};

/// Configuration for the FX engine.
#[derive(Debug, Clone)]
pub struct FxEngineConfig {
    /// Days searched backward (inclusive of the requested date) before giving up.
    pub lookback_days: u32,
    /// Maximum age of the loaded table before a lookup forces a reload.
    pub refresh_ttl: Duration,
    /// Pivot for triangulating pairs with no direct data.
    pub reference_currency: Currency,
}

impl Default for FxEngineConfig {
    fn default() -> Self {
        Self {
            lookback_days: constants::DEFAULT_LOOKBACK_DAYS,
            refresh_ttl: constants::default_refresh_ttl(),
            reference_currency: Currency::usd(),
        }
    }
}

impl FxEngineConfig {
    /// Load configuration from environment variables.
    ///
    /// `FX_LOOKBACK_DAYS`, `FX_REFRESH_TTL_SECS` and `FX_REFERENCE_CURRENCY`
    /// override the defaults; unparseable values are ignored with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(days) = lookup("FX_LOOKBACK_DAYS") {
            match days.parse() {
                Ok(days) => config.lookback_days = days,
                Err(_) => warn!(value = %days, "Ignoring unparseable FX_LOOKBACK_DAYS"),
            }
        }

        if let Some(secs) = lookup("FX_REFRESH_TTL_SECS") {
            match secs.parse::<i64>() {
                Ok(secs) => config.refresh_ttl = Duration::seconds(secs),
                Err(_) => warn!(value = %secs, "Ignoring unparseable FX_REFRESH_TTL_SECS"),
            }
        }

        if let Some(code) = lookup("FX_REFERENCE_CURRENCY") {
            config.reference_currency = Currency::new(code);
        }

        config
    }

    pub fn with_lookback_days(mut self, days: u32) -> Self {
        self.lookback_days = days;
        self
    }

    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }

    pub fn with_reference_currency(mut self, currency: Currency) -> Self {
        self.reference_currency = currency;
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> FxResult<()> {
        if self.lookback_days == 0 {
            return Err(FxError::InvalidConfig(
                "Lookback period must be at least one day".to_string(),
            ));
        }

        if self.refresh_ttl <= Duration::zero() {
            return Err(FxError::InvalidConfig(
                "Refresh TTL must be positive".to_string(),
            ));
        }

        if Currency::parse(self.reference_currency.code()).is_err() {
            return Err(FxError::InvalidConfig(format!(
                "Reference currency {:?} is not a currency code",
                self.reference_currency.code()
            )));
        }

        Ok(())
    }
}
