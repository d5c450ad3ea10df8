//! LedgerFX Rate Lookup
//!
//! Resolves a historical rate, or converts an amount, against a SQLite rate
//! store.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;
use rust_decimal::Decimal;
use serde_json::json;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ledgerfx_common::{format_rate_date, parse_rate_date, Currency, Money};
use ledgerfx_fx::{Conversion, FxEngine, FxEngineConfig, SqliteRateSource, DEFAULT_TABLE};

/// LedgerFX rate lookup CLI
#[derive(Parser, Debug)]
#[command(name = "fx-lookup")]
#[command(about = "Resolve historical FX rates from a LedgerFX rate store")]
struct Args {
    /// Date to price at (YYYY-MM-DD, anything after the date is ignored)
    date: String,

    /// Currency to convert from
    from: String,

    /// Currency to convert into
    to: String,

    /// SQLite database holding the rate table
    #[arg(long, env = "FX_DATABASE_PATH", default_value = "fx.db")]
    db: PathBuf,

    /// Table holding (date, ccy1, ccy2, rate) rows
    #[arg(long, default_value = DEFAULT_TABLE)]
    table: String,

    /// Convert this amount instead of printing the bare rate
    #[arg(long)]
    amount: Option<Decimal>,

    /// Print JSON instead of plain text
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout only carries the answer
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let config = FxEngineConfig::from_env();
    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    let date = parse_rate_date(&args.date).context("Unreadable date")?;
    let from = Currency::parse(&args.from).context("Unreadable source currency")?;
    let to = Currency::parse(&args.to).context("Unreadable target currency")?;

    let source = SqliteRateSource::open(&args.db)
        .with_context(|| format!("Cannot open rate store {}", args.db.display()))?
        .with_table(args.table.clone());
    let engine = FxEngine::new(Arc::new(source), config);

    // Without an initial load there is nothing to answer from
    let report = engine.initialize().context("Initial rate load failed")?;
    info!(rows = report.applied, pairs = report.pairs, "Rate store loaded");

    let line = match args.amount {
        Some(value) => {
            let conversion = engine.convert(&Money::new(value, from), &to, date)?;
            render_conversion(&conversion, args.json)
        }
        None => {
            let rate = engine.resolve(date, &from, &to)?;
            render_rate(date, &from, &to, rate, args.json)
        }
    };
    println!("{}", line);

    Ok(())
}

fn render_rate(date: NaiveDate, from: &Currency, to: &Currency, rate: f64, as_json: bool) -> String {
    if as_json {
        json!({
            "date": format_rate_date(date),
            "from": from,
            "to": to,
            "rate": rate,
        })
        .to_string()
    } else {
        format!("{} {}/{} {}", format_rate_date(date), from, to, rate)
    }
}

fn render_conversion(conversion: &Conversion, as_json: bool) -> String {
    if as_json {
        json!(conversion).to_string()
    } else {
        format!(
            "{} {} = {} (rate {})",
            conversion.date, conversion.input, conversion.output, conversion.rate
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "fx-lookup",
            "--db",
            "/tmp/books.db",
            "--amount",
            "12.50",
            "2023-01-15",
            "eur",
            "usd",
        ])
        .unwrap();

        assert_eq!(args.date, "2023-01-15");
        assert_eq!(args.db, PathBuf::from("/tmp/books.db"));
        assert_eq!(args.table, "_FXRates");
        assert_eq!(args.amount, Some(dec!(12.50)));
        assert!(!args.json);
    }

    #[test]
    fn test_args_require_pair() {
        assert!(Args::try_parse_from(["fx-lookup", "2023-01-15", "EUR"]).is_err());
    }

    #[test]
    fn test_render_rate() {
        let date = NaiveDate::from_ymd_opt(2023, 1, 15).unwrap();
        let text = render_rate(date, &Currency::eur(), &Currency::usd(), 1.08, false);
        assert_eq!(text, "2023-01-15 EUR/USD 1.08");

        let value: serde_json::Value =
            serde_json::from_str(&render_rate(date, &Currency::eur(), &Currency::usd(), 1.08, true))
                .unwrap();
        assert_eq!(value["from"], "EUR");
        assert_eq!(value["date"], "2023-01-15");
        assert_eq!(value["rate"], 1.08);
    }

    #[test]
    fn test_render_conversion() {
        let conversion = Conversion::new(
            Money::new(dec!(100), Currency::eur()),
            Money::new(dec!(108.00), Currency::usd()),
            1.08,
            NaiveDate::from_ymd_opt(2023, 1, 15).unwrap(),
        );
        assert_eq!(
            render_conversion(&conversion, false),
            "2023-01-15 100 EUR = 108.00 USD (rate 1.08)"
        );
    }
}
