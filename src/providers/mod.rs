pub mod fallback;
pub mod fiat_page;
pub mod nobitex;
pub mod tetherland;
pub mod util;
pub mod wallex;
pub mod yahoo_finance;

use crate::core::QuoteSource;
use crate::core::config::{ProvidersConfig, StablecoinProvider};
use fallback::FallbackSource;

/// Builds the USDT fallback chain in the configured order.
pub fn stablecoin_chain(config: &ProvidersConfig) -> anyhow::Result<FallbackSource> {
    let mut sources: Vec<Box<dyn QuoteSource>> = Vec::new();
    for provider in &config.stablecoin_order {
        let source: Box<dyn QuoteSource> = match provider {
            StablecoinProvider::Wallex => Box::new(wallex::WallexSource::new(&config.wallex)?),
            StablecoinProvider::TetherLand => {
                Box::new(tetherland::TetherLandSource::new(&config.tetherland)?)
            }
            StablecoinProvider::Nobitex => Box::new(nobitex::NobitexSource::new(&config.nobitex)?),
        };
        sources.push(source);
    }
    Ok(FallbackSource::new("USDT", sources))
}
