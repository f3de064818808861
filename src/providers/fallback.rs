use async_trait::async_trait;
use tracing::{debug, warn};

use crate::core::{FetchError, Quote, QuoteSource};

/// Tries each source in order and returns the first quote that arrives.
pub struct FallbackSource {
    name: String,
    sources: Vec<Box<dyn QuoteSource>>,
}

impl FallbackSource {
    pub fn new(name: impl Into<String>, sources: Vec<Box<dyn QuoteSource>>) -> Self {
        FallbackSource {
            name: name.into(),
            sources,
        }
    }
}

#[async_trait]
impl QuoteSource for FallbackSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn try_fetch(&self) -> Result<Quote, FetchError> {
        for source in &self.sources {
            match source.try_fetch().await {
                Ok(quote) => return Ok(quote),
                Err(e) => {
                    warn!(source = source.name(), error = %e, "Falling back to next source");
                }
            }
        }
        debug!(chain = %self.name, "No source in the chain answered");
        Err(FetchError::AllSourcesFailed(self.sources.len()))
    }
}
