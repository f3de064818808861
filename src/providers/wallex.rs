use async_trait::async_trait;
use tracing::instrument;

use crate::core::config::ExchangeProviderConfig;
use crate::core::{FetchError, Quote, QuoteSource};
use crate::providers::util::{build_client, decimal_at, get_json};

const SOURCE_NAME: &str = "Wallex";
const LAST_PRICE: &str = "/result/symbols/USDTTMN/stats/lastPrice";

/// Last traded USDT/TMN price from the Wallex markets endpoint.
pub struct WallexSource {
    base_url: String,
    client: reqwest::Client,
}

impl WallexSource {
    pub fn new(config: &ExchangeProviderConfig) -> anyhow::Result<Self> {
        Ok(WallexSource {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client: build_client(config.timeout_secs)?,
        })
    }
}

#[async_trait]
impl QuoteSource for WallexSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    #[instrument(name = "WallexFetch", skip(self))]
    async fn try_fetch(&self) -> Result<Quote, FetchError> {
        let url = format!("{}/v1/markets", self.base_url);
        let body = get_json(&self.client, &url).await?;
        let price = decimal_at(&body, LAST_PRICE)?;
        Ok(Quote::new(price.trunc(), SOURCE_NAME))
    }
}
