use anyhow::anyhow;
use async_trait::async_trait;
use rust_decimal::Decimal;
use scraper::{Html, Selector};
use tracing::{instrument, warn};

use crate::core::config::FiatPageConfig;
use crate::core::{FetchError, FiatQuoteSet, FiatSource, PriceQuote, Quote};
use crate::providers::util::{build_client, get_text};

/// Scrapes USD and EUR toman rates from a rate table where each row's
/// `title` attribute names the currency.
pub struct FiatPageSource {
    url: String,
    name: String,
    usd_title: String,
    eur_title: String,
    row_selector: Selector,
    price_selector: Selector,
    client: reqwest::Client,
}

impl FiatPageSource {
    pub fn new(config: &FiatPageConfig) -> anyhow::Result<Self> {
        let row_selector =
            Selector::parse("tr[title]").map_err(|e| anyhow!("Invalid row selector: {e}"))?;
        let price_selector = Selector::parse(&config.price_selector).map_err(|e| {
            anyhow!("Invalid price selector {:?}: {e}", config.price_selector)
        })?;
        Ok(FiatPageSource {
            url: config.url.clone(),
            name: config.name.clone(),
            usd_title: config.usd_title.clone(),
            eur_title: config.eur_title.clone(),
            row_selector,
            price_selector,
            client: build_client(config.timeout_secs)?,
        })
    }

    /// Extracts both rates from a page. Each currency is looked up on its own,
    /// so a missing USD row does not hide the EUR rate.
    pub fn parse_page(&self, html: &str) -> FiatQuoteSet {
        let document = Html::parse_document(html);
        FiatQuoteSet {
            usd: self.quote_for(&document, &self.usd_title),
            eur: self.quote_for(&document, &self.eur_title),
        }
    }

    fn quote_for(&self, document: &Html, title: &str) -> PriceQuote {
        match self.price_for(document, title) {
            Ok(value) => Some(Quote::new(value, self.name.as_str())),
            Err(e) => {
                warn!(source = %self.name, currency = title, error = %e, "Rate unavailable");
                None
            }
        }
    }

    fn price_for(&self, document: &Html, title: &str) -> Result<Decimal, FetchError> {
        let row = document
            .select(&self.row_selector)
            .find(|row| row.value().attr("title").map(str::trim) == Some(title))
            .ok_or_else(|| FetchError::MissingField(format!("row titled {title}")))?;
        let cell = row
            .select(&self.price_selector)
            .next()
            .ok_or_else(|| FetchError::MissingField(format!("price cell for {title}")))?;
        parse_localized_integer(&cell.text().collect::<String>())
    }
}

#[async_trait]
impl FiatSource for FiatPageSource {
    #[instrument(name = "FiatPageFetch", skip(self), fields(url = %self.url))]
    async fn fetch(&self) -> FiatQuoteSet {
        match get_text(&self.client, &self.url).await {
            Ok(html) => self.parse_page(&html),
            Err(e) => {
                warn!(source = %self.name, error = %e, "Rate page unavailable");
                FiatQuoteSet::default()
            }
        }
    }
}

/// Maps Persian (U+06F0..U+06F9) and Arabic-Indic (U+0660..U+0669) digits to
/// ASCII. Everything else is left untouched.
pub fn normalize_digits(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{06F0}'..='\u{06F9}' => ascii_digit(c as u32 - 0x06F0),
            '\u{0660}'..='\u{0669}' => ascii_digit(c as u32 - 0x0660),
            _ => c,
        })
        .collect()
}

fn ascii_digit(offset: u32) -> char {
    char::from_digit(offset, 10).unwrap_or('0')
}

/// Normalizes digits, drops separators and unit text, then parses what is
/// left as an integer.
pub fn parse_localized_integer(text: &str) -> Result<Decimal, FetchError> {
    let digits: String = normalize_digits(text)
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    if digits.is_empty() {
        return Err(FetchError::Parse(text.trim().to_string()));
    }
    digits
        .parse::<u64>()
        .map(Decimal::from)
        .map_err(|_| FetchError::Parse(text.trim().to_string()))
}
