//! Source abstractions: one upstream, one price-or-nothing

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use super::quote::{FiatQuoteSet, PriceQuote, Quote};

/// Every way a single upstream can let us down.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected HTTP status: {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed JSON body: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing field: {0}")]
    MissingField(String),
    #[error("cannot parse {0:?} as a price")]
    Parse(String),
    #[error("all {0} sources failed")]
    AllSourcesFailed(usize),
}

#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Name shown as provenance in the report.
    fn name(&self) -> &str;

    async fn try_fetch(&self) -> Result<Quote, FetchError>;

    /// Fetches the quote and drops the failure reason.
    ///
    /// This is the adapter boundary: callers only ever see a present or
    /// absent quote.
    async fn fetch(&self) -> PriceQuote {
        match self.try_fetch().await {
            Ok(quote) => {
                debug!(source = %quote.source, value = %quote.value, "Fetched quote");
                Some(quote)
            }
            Err(e) => {
                warn!(source = self.name(), error = %e, "Source unavailable");
                None
            }
        }
    }
}

#[async_trait]
pub trait FiatSource: Send + Sync {
    async fn fetch(&self) -> FiatQuoteSet;
}
