//! LedgerFX Common Types
//!
//! Value types shared between the rate engine and the code that calls it:
//! currencies, currency pairs, money amounts, calendar dates and clocks.

pub mod error;
pub mod monetary;
pub mod time;

pub use error::*;
pub use monetary::*;
pub use time::*;
