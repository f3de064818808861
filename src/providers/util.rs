use crate::core::FetchError;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; nerkh/0.1)";

/// Builds a client whose every request is bounded by `timeout_secs`.
pub fn build_client(timeout_secs: u64) -> Result<reqwest::Client, FetchError> {
    Ok(reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(timeout_secs))
        .build()?)
}

/// GETs `url` and returns the body, treating any non-2xx status as a failure.
pub async fn get_text(client: &reqwest::Client, url: &str) -> Result<String, FetchError> {
    debug!("Requesting {}", url);
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(FetchError::Status(response.status()));
    }
    Ok(response.text().await?)
}

pub async fn get_json(client: &reqwest::Client, url: &str) -> Result<Value, FetchError> {
    let text = get_text(client, url).await?;
    Ok(serde_json::from_str(&text)?)
}

/// Reads the number at a JSON pointer. Exchanges disagree on whether prices
/// are strings or numbers, so both are accepted.
pub fn decimal_at(body: &Value, pointer: &str) -> Result<Decimal, FetchError> {
    let field = body
        .pointer(pointer)
        .ok_or_else(|| FetchError::MissingField(pointer.to_string()))?;
    match field {
        Value::String(s) => parse_decimal(s),
        Value::Number(n) => parse_decimal(&n.to_string()),
        other => Err(FetchError::Parse(other.to_string())),
    }
}

pub fn parse_decimal(raw: &str) -> Result<Decimal, FetchError> {
    let trimmed = raw.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| FetchError::Parse(raw.to_string()))
}
