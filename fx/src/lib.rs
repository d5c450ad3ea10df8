//! LedgerFX rate engine
//!
//! Resolves historical exchange rates so amounts booked in different
//! currencies can be compared and summed in one base currency.
//!
//! # Features
//!
//! - In-memory table of dated rates, one canonical direction per pair
//! - Reload from a persistent source once the table outlives its TTL
//! - Most-recent-rate lookup over a bounded backward window
//! - Triangulation through a reference currency when a pair has no data
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ledgerfx_fx::{FxEngine, FxEngineConfig, SqliteRateSource};
//!
//! let source = Arc::new(SqliteRateSource::open("books.db")?);
//! let engine = FxEngine::new(source, FxEngineConfig::default());
//! engine.initialize()?;
//!
//! let rate = engine.resolve_str("2023-01-15", "EUR", "USD")?;
//! ```

pub mod config;
pub mod conversion;
pub mod engine;
pub mod error;
pub mod loader;
pub mod refresh;
pub mod source;
pub mod table;

pub use config::FxEngineConfig;
pub use conversion::Conversion;
pub use engine::{search_backward, FxEngine, FxEngineStats};
pub use error::{FxError, FxResult};
pub use loader::{LoadReport, LoadedRate, RateBatch, RateLoader};
pub use refresh::RefreshPolicy;
#[cfg(feature = "sqlite")]
pub use source::{SqliteRateSource, DEFAULT_TABLE};
pub use source::{RateRow, RateSource, StaticRateSource};
pub use table::RateTable;
