//! Quote types shared by sources, the aggregator and the report

use rust_decimal::Decimal;

/// A single price reading and the upstream it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub value: Decimal,
    pub source: String,
}

impl Quote {
    pub fn new(value: Decimal, source: impl Into<String>) -> Self {
        Quote {
            value,
            source: source.into(),
        }
    }
}

/// An absent quote carries no source name.
pub type PriceQuote = Option<Quote>;

/// USD and EUR rates scraped from a single page fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FiatQuoteSet {
    pub usd: PriceQuote,
    pub eur: PriceQuote,
}

/// Everything one report cycle knows about the market.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarketSnapshot {
    pub gold_ounce_usd: PriceQuote,
    pub usdt_toman: PriceQuote,
    pub usd_toman: PriceQuote,
    pub eur_toman: PriceQuote,
    pub gold_18k_toman: Option<Decimal>,
}

impl MarketSnapshot {
    /// A snapshot is worth publishing when gold, USDT or USD is known.
    /// EUR alone does not count.
    pub fn is_reportable(&self) -> bool {
        self.gold_ounce_usd.is_some() || self.usdt_toman.is_some() || self.usd_toman.is_some()
    }
}
