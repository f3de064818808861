//! Runs every source once and assembles a [`MarketSnapshot`].

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::core::config::ProvidersConfig;
use crate::core::{FiatQuoteSet, FiatSource, MarketSnapshot, PriceQuote, QuoteSource};
use crate::providers::{self, fiat_page::FiatPageSource, yahoo_finance::YahooGoldSource};

fn grams_per_troy_ounce() -> Decimal {
    Decimal::new(311035, 4)
}

fn fineness_18k() -> Decimal {
    Decimal::new(75, 2)
}

/// Toman price of one gram of 18-karat gold, truncated toward zero.
pub fn gold_18k_per_gram(ounce_usd: Decimal, usd_toman: Decimal) -> Option<Decimal> {
    ounce_usd
        .checked_div(grams_per_troy_ounce())?
        .checked_mul(usd_toman)?
        .checked_mul(fineness_18k())
        .map(|value| value.trunc())
}

/// Combines raw quotes into a snapshot. The 18K price needs both the ounce
/// price and the USD rate; USDT is never used as a stand-in for USD.
pub fn assemble_snapshot(gold: PriceQuote, usdt: PriceQuote, fiat: FiatQuoteSet) -> MarketSnapshot {
    let gold_18k_toman = match (&gold, &fiat.usd) {
        (Some(ounce), Some(usd)) => gold_18k_per_gram(ounce.value, usd.value),
        _ => None,
    };
    MarketSnapshot {
        gold_ounce_usd: gold,
        usdt_toman: usdt,
        usd_toman: fiat.usd,
        eur_toman: fiat.eur,
        gold_18k_toman,
    }
}

pub struct Aggregator {
    gold: Box<dyn QuoteSource>,
    usdt: Box<dyn QuoteSource>,
    fiat: Box<dyn FiatSource>,
}

impl Aggregator {
    pub fn new(
        gold: Box<dyn QuoteSource>,
        usdt: Box<dyn QuoteSource>,
        fiat: Box<dyn FiatSource>,
    ) -> Self {
        Aggregator { gold, usdt, fiat }
    }

    pub fn from_config(config: &ProvidersConfig) -> anyhow::Result<Self> {
        Ok(Aggregator::new(
            Box::new(YahooGoldSource::new(&config.yahoo)?),
            Box::new(providers::stablecoin_chain(config)?),
            Box::new(FiatPageSource::new(&config.fiat)?),
        ))
    }

    /// Fetches all sources concurrently and waits for every one of them.
    pub async fn build_snapshot(&self) -> MarketSnapshot {
        let (gold, usdt, fiat) =
            futures::join!(self.gold.fetch(), self.usdt.fetch(), self.fiat.fetch());
        let snapshot = assemble_snapshot(gold, usdt, fiat);
        debug!(?snapshot, "Snapshot assembled");
        info!(
            gold = snapshot.gold_ounce_usd.is_some(),
            usdt = snapshot.usdt_toman.is_some(),
            usd = snapshot.usd_toman.is_some(),
            eur = snapshot.eur_toman.is_some(),
            "Market snapshot ready"
        );
        snapshot
    }
}
