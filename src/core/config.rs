use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct TelegramConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub channel_id: Option<String>,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        TelegramConfig {
            base_url: "https://api.telegram.org".to_string(),
            token: None,
            channel_id: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ScheduleConfig {
    pub interval_secs: u64,
    pub initial_delay_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        ScheduleConfig {
            interval_secs: 600,
            initial_delay_secs: 10,
        }
    }
}

impl ScheduleConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct HealthConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HealthConfig {
    fn default() -> Self {
        HealthConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct YahooProviderConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_gold_symbol")]
    pub symbol: String,
    #[serde(default = "default_gold_timeout")]
    pub timeout_secs: u64,
}

fn default_gold_symbol() -> String {
    "GC=F".to_string()
}

fn default_gold_timeout() -> u64 {
    10
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExchangeProviderConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_exchange_timeout")]
    pub timeout_secs: u64,
}

fn default_exchange_timeout() -> u64 {
    5
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FiatPageConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_fiat_name")]
    pub name: String,
    #[serde(default = "default_usd_title")]
    pub usd_title: String,
    #[serde(default = "default_eur_title")]
    pub eur_title: String,
    #[serde(default = "default_price_selector")]
    pub price_selector: String,
    #[serde(default = "default_fiat_timeout")]
    pub timeout_secs: u64,
}

fn default_fiat_name() -> String {
    "Alanchand".to_string()
}

fn default_usd_title() -> String {
    "دلار".to_string()
}

fn default_eur_title() -> String {
    "یورو".to_string()
}

fn default_price_selector() -> String {
    "td.price".to_string()
}

fn default_fiat_timeout() -> u64 {
    15
}

/// Stablecoin exchanges, listed in the order they are tried.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StablecoinProvider {
    Wallex,
    TetherLand,
    Nobitex,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ProvidersConfig {
    pub yahoo: YahooProviderConfig,
    pub wallex: ExchangeProviderConfig,
    pub tetherland: ExchangeProviderConfig,
    pub nobitex: ExchangeProviderConfig,
    pub fiat: FiatPageConfig,
    pub stablecoin_order: Vec<StablecoinProvider>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            yahoo: YahooProviderConfig {
                base_url: "https://query1.finance.yahoo.com".to_string(),
                symbol: default_gold_symbol(),
                timeout_secs: default_gold_timeout(),
            },
            wallex: ExchangeProviderConfig {
                base_url: "https://api.wallex.ir".to_string(),
                timeout_secs: default_exchange_timeout(),
            },
            tetherland: ExchangeProviderConfig {
                base_url: "https://api.tetherland.com".to_string(),
                timeout_secs: default_exchange_timeout(),
            },
            nobitex: ExchangeProviderConfig {
                base_url: "https://api.nobitex.ir".to_string(),
                timeout_secs: default_exchange_timeout(),
            },
            fiat: FiatPageConfig {
                url: "https://alanchand.com/currencies-price".to_string(),
                name: default_fiat_name(),
                usd_title: default_usd_title(),
                eur_title: default_eur_title(),
                price_selector: default_price_selector(),
                timeout_secs: default_fiat_timeout(),
            },
            stablecoin_order: vec![StablecoinProvider::Wallex, StablecoinProvider::TetherLand],
        }
    }
}

impl ProvidersConfig {
    /// Sections given without an address keep the built-in one.
    fn fill_missing_urls(&mut self) {
        let defaults = ProvidersConfig::default();
        let fill = |value: &mut String, default: String| {
            if value.trim().is_empty() {
                *value = default;
            }
        };
        fill(&mut self.yahoo.base_url, defaults.yahoo.base_url);
        fill(&mut self.wallex.base_url, defaults.wallex.base_url);
        fill(&mut self.tetherland.base_url, defaults.tetherland.base_url);
        fill(&mut self.nobitex.base_url, defaults.nobitex.base_url);
        fill(&mut self.fiat.url, defaults.fiat.url);
    }

    fn timeouts(&self) -> [(&'static str, u64); 5] {
        [
            ("yahoo", self.yahoo.timeout_secs),
            ("wallex", self.wallex.timeout_secs),
            ("tetherland", self.tetherland.timeout_secs),
            ("nobitex", self.nobitex.timeout_secs),
            ("fiat", self.fiat.timeout_secs),
        ]
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub telegram: TelegramConfig,
    pub schedule: ScheduleConfig,
    pub health: HealthConfig,
    pub providers: ProvidersConfig,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("TOKEN is missing, scheduled reports will only be printed")]
    MissingToken,
    #[error("CHANNEL_ID is missing, scheduled reports cannot be published")]
    MissingChannel,
}

/// What the process can do with the configuration it was given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    Broadcast { token: String, channel_id: String },
    PrintOnly(ConfigError),
    Misconfigured(ConfigError),
}

impl AppConfig {
    /// Loads the file at `path`, or the default config file when it exists,
    /// then applies environment overrides.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from_path(path)?,
            None => {
                let default_path = Self::default_config_path()?;
                if default_path.exists() {
                    Self::load_from_path(&default_path)?
                } else {
                    debug!("No config file found, using defaults");
                    Self::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "nerkh", "nerkh")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let mut config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config.providers.fill_missing_urls();
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Overrides file values with `TOKEN`, `CHANNEL_ID`, `CHECK_INTERVAL`
    /// and `PORT`.
    pub fn apply_env<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = var("TOKEN") {
            self.telegram.token = Some(token);
        }
        if let Some(channel_id) = var("CHANNEL_ID") {
            self.telegram.channel_id = Some(channel_id);
        }
        if let Some(interval) = var("CHECK_INTERVAL") {
            self.schedule.interval_secs = interval
                .trim()
                .parse()
                .with_context(|| format!("Invalid CHECK_INTERVAL: {interval}"))?;
        }
        if let Some(port) = var("PORT") {
            self.health.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid PORT: {port}"))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.schedule.interval_secs == 0 {
            bail!("Check interval must be at least one second");
        }
        if self.providers.stablecoin_order.is_empty() {
            bail!("At least one stablecoin provider must be configured");
        }
        if let Some((provider, _)) = self
            .providers
            .timeouts()
            .into_iter()
            .find(|(_, timeout)| *timeout == 0)
        {
            bail!("Timeout for provider '{provider}' must be at least one second");
        }
        Ok(())
    }

    pub fn run_mode(&self) -> RunMode {
        let token = non_empty(&self.telegram.token);
        let channel_id = non_empty(&self.telegram.channel_id);
        match (token, channel_id) {
            (None, _) => RunMode::PrintOnly(ConfigError::MissingToken),
            (Some(_), None) => RunMode::Misconfigured(ConfigError::MissingChannel),
            (Some(token), Some(channel_id)) => RunMode::Broadcast {
                token: token.to_string(),
                channel_id: channel_id.to_string(),
            },
        }
    }

    /// Channel label for the report footer, available even in print-only mode.
    pub fn channel_label(&self) -> String {
        non_empty(&self.telegram.channel_id)
            .unwrap_or("local")
            .to_string()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
telegram:
  channel_id: "@gold_prices"
schedule:
  interval_secs: 300
providers:
  yahoo:
    base_url: "http://example.com/yahoo"
  fiat:
    url: "http://example.com/rates"
    usd_title: "US Dollar"
  stablecoin_order: [nobitex, wallex]
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.telegram.channel_id.as_deref(), Some("@gold_prices"));
        assert_eq!(config.telegram.base_url, "https://api.telegram.org");
        assert_eq!(config.schedule.interval_secs, 300);
        assert_eq!(config.schedule.initial_delay_secs, 10);
        assert_eq!(config.providers.yahoo.base_url, "http://example.com/yahoo");
        assert_eq!(config.providers.yahoo.symbol, "GC=F");
        assert_eq!(config.providers.yahoo.timeout_secs, 10);
        assert_eq!(config.providers.fiat.usd_title, "US Dollar");
        assert_eq!(config.providers.fiat.eur_title, "یورو");
        assert_eq!(config.providers.fiat.timeout_secs, 15);
        assert_eq!(config.providers.wallex.base_url, "https://api.wallex.ir");
        assert_eq!(
            config.providers.stablecoin_order,
            vec![StablecoinProvider::Nobitex, StablecoinProvider::Wallex]
        );
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.schedule.interval_secs, 600);
        assert_eq!(config.health.port, 8080);
        assert_eq!(
            config.providers.stablecoin_order,
            vec![StablecoinProvider::Wallex, StablecoinProvider::TetherLand]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_env(env(&[
                ("TOKEN", "123:abc"),
                ("CHANNEL_ID", "@chan"),
                ("CHECK_INTERVAL", "120"),
                ("PORT", "9000"),
            ]))
            .unwrap();

        assert_eq!(config.telegram.token.as_deref(), Some("123:abc"));
        assert_eq!(config.telegram.channel_id.as_deref(), Some("@chan"));
        assert_eq!(config.schedule.interval_secs, 120);
        assert_eq!(config.health.port, 9000);
    }

    #[test]
    fn test_invalid_interval_env_is_rejected() {
        let mut config = AppConfig::default();
        let result = config.apply_env(env(&[("CHECK_INTERVAL", "ten")]));
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Invalid CHECK_INTERVAL")
        );
    }

    #[test]
    fn test_zero_interval_fails_validation() {
        let mut config = AppConfig::default();
        config.schedule.interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_provider_section_keeps_default_url() {
        let file = tempfile::NamedTempFile::new().unwrap();
        fs::write(
            file.path(),
            "providers:\n  wallex:\n    timeout_secs: 3\n  fiat:\n    name: Rates\n",
        )
        .unwrap();

        let config = AppConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.providers.wallex.base_url, "https://api.wallex.ir");
        assert_eq!(config.providers.wallex.timeout_secs, 3);
        assert_eq!(
            config.providers.fiat.url,
            "https://alanchand.com/currencies-price"
        );
        assert_eq!(config.providers.fiat.name, "Rates");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_provider_timeout_fails_validation() {
        let mut config = AppConfig::default();
        config.providers.tetherland.timeout_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("tetherland"));
    }

    #[test]
    fn test_run_mode() {
        let mut config = AppConfig::default();
        assert_eq!(
            config.run_mode(),
            RunMode::PrintOnly(ConfigError::MissingToken)
        );

        config.telegram.token = Some("123:abc".to_string());
        assert_eq!(
            config.run_mode(),
            RunMode::Misconfigured(ConfigError::MissingChannel)
        );

        config.telegram.channel_id = Some("  ".to_string());
        assert_eq!(
            config.run_mode(),
            RunMode::Misconfigured(ConfigError::MissingChannel)
        );

        config.telegram.channel_id = Some("@chan".to_string());
        assert_eq!(
            config.run_mode(),
            RunMode::Broadcast {
                token: "123:abc".to_string(),
                channel_id: "@chan".to_string(),
            }
        );
    }

    #[test]
    fn test_channel_label_falls_back_to_local() {
        let mut config = AppConfig::default();
        assert_eq!(config.channel_label(), "local");
        config.telegram.channel_id = Some("@chan".to_string());
        assert_eq!(config.channel_label(), "@chan");
    }
}
