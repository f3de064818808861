use async_trait::async_trait;
use tracing::instrument;

use crate::core::config::ExchangeProviderConfig;
use crate::core::{FetchError, Quote, QuoteSource};
use crate::providers::util::{build_client, decimal_at, get_json};

const SOURCE_NAME: &str = "TetherLand";
const USDT_PRICE: &str = "/data/currencies/USDT/price";

pub struct TetherLandSource {
    base_url: String,
    client: reqwest::Client,
}

impl TetherLandSource {
    pub fn new(config: &ExchangeProviderConfig) -> anyhow::Result<Self> {
        Ok(TetherLandSource {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client: build_client(config.timeout_secs)?,
        })
    }
}

#[async_trait]
impl QuoteSource for TetherLandSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    #[instrument(name = "TetherLandFetch", skip(self))]
    async fn try_fetch(&self) -> Result<Quote, FetchError> {
        let url = format!("{}/currencies", self.base_url);
        let body = get_json(&self.client, &url).await?;
        let price = decimal_at(&body, USDT_PRICE)?;
        Ok(Quote::new(price.trunc(), SOURCE_NAME))
    }
}
