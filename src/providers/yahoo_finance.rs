use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Deserialize;
use tracing::instrument;

use crate::core::config::YahooProviderConfig;
use crate::core::{FetchError, Quote, QuoteSource};
use crate::providers::util::{build_client, get_text};

const SOURCE_NAME: &str = "Yahoo Finance";

/// Gold futures quote (one troy ounce in USD) from the Yahoo chart API.
pub struct YahooGoldSource {
    base_url: String,
    symbol: String,
    client: reqwest::Client,
}

impl YahooGoldSource {
    pub fn new(config: &YahooProviderConfig) -> anyhow::Result<Self> {
        Ok(YahooGoldSource {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            symbol: config.symbol.clone(),
            client: build_client(config.timeout_secs)?,
        })
    }
}

#[derive(Deserialize, Debug)]
struct YahooChartResponse {
    chart: ChartResult,
}

#[derive(Deserialize, Debug)]
struct ChartResult {
    result: Option<Vec<ChartItem>>,
}

#[derive(Deserialize, Debug)]
struct ChartItem {
    meta: ChartMeta,
}

#[derive(Deserialize, Debug)]
struct ChartMeta {
    #[serde(alias = "regularMarketPrice")]
    regular_market_price: Option<f64>,
}

#[async_trait]
impl QuoteSource for YahooGoldSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    #[instrument(name = "YahooGoldFetch", skip(self), fields(symbol = %self.symbol))]
    async fn try_fetch(&self) -> Result<Quote, FetchError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, self.symbol);
        let text = get_text(&self.client, &url).await?;
        let data: YahooChartResponse = serde_json::from_str(&text)?;

        let price = data
            .chart
            .result
            .and_then(|items| items.into_iter().next())
            .and_then(|item| item.meta.regular_market_price)
            .ok_or_else(|| {
                FetchError::MissingField("chart.result[0].meta.regularMarketPrice".into())
            })?;

        let value = Decimal::from_f64(price)
            .ok_or_else(|| FetchError::Parse(price.to_string()))?
            .round_dp(2);
        Ok(Quote::new(value, SOURCE_NAME))
    }
}
