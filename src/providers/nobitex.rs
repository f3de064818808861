use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::instrument;

use crate::core::config::ExchangeProviderConfig;
use crate::core::{FetchError, Quote, QuoteSource};
use crate::providers::util::{build_client, decimal_at, get_json};

const SOURCE_NAME: &str = "Nobitex";
const BEST_BID: &str = "/bids/0/0";
const RIAL_PER_TOMAN: i64 = 10;

/// Best bid on the Nobitex USDT/IRT order book. Nobitex quotes in rial, so
/// the price is divided by ten.
pub struct NobitexSource {
    base_url: String,
    client: reqwest::Client,
}

impl NobitexSource {
    pub fn new(config: &ExchangeProviderConfig) -> anyhow::Result<Self> {
        Ok(NobitexSource {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client: build_client(config.timeout_secs)?,
        })
    }
}

#[async_trait]
impl QuoteSource for NobitexSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    #[instrument(name = "NobitexFetch", skip(self))]
    async fn try_fetch(&self) -> Result<Quote, FetchError> {
        let url = format!("{}/v3/orderbook/USDTIRT", self.base_url);
        let body = get_json(&self.client, &url).await?;
        let rial = decimal_at(&body, BEST_BID)?;
        let toman = (rial / Decimal::from(RIAL_PER_TOMAN)).trunc();
        Ok(Quote::new(toman, SOURCE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn source_with_body(body: &str) -> (MockServer, NobitexSource) {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v3/orderbook/USDTIRT"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&mock_server)
            .await;
        let source = NobitexSource::new(&ExchangeProviderConfig {
            base_url: mock_server.uri(),
            timeout_secs: 5,
        })
        .unwrap();
        (mock_server, source)
    }

    #[tokio::test]
    async fn test_best_bid_is_converted_from_rial() {
        let body = r#"{
            "status": "ok",
            "bids": [["579505", "120.5"], ["579000", "3.1"]],
            "asks": [["580100", "10"]]
        }"#;
        let (_server, source) = source_with_body(body).await;

        let quote = source.try_fetch().await.unwrap();
        assert_eq!(quote.value, Decimal::from(57950));
        assert_eq!(quote.source, "Nobitex");
    }

    #[tokio::test]
    async fn test_empty_order_book_is_an_error() {
        let (_server, source) =
            source_with_body(r#"{"status": "ok", "bids": [], "asks": []}"#).await;

        assert!(matches!(
            source.try_fetch().await.unwrap_err(),
            FetchError::MissingField(_)
        ));
    }
}
