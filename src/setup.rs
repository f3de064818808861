//! `nerkh setup`: writes a starter config file.

use crate::core::config::AppConfig;
use anyhow::{Context, Result, bail};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::info;

const EXAMPLE_CONFIG: &str = include_str!("../docs/example_config.yaml");
const CHANNEL_PLACEHOLDER: &str = "@your_channel";

/// Writes the starter config to the default location. A `CHANNEL_ID` already
/// present in the environment replaces the channel placeholder.
pub fn setup() -> Result<()> {
    let path = AppConfig::default_config_path()?;
    let channel = std::env::var("CHANNEL_ID").ok();
    let written = setup_at_path(&path, channel.as_deref())?;
    info!(path = %written.display(), "Set TOKEN in the environment or .env to start publishing");
    Ok(())
}

/// Renders the starter config for `channel`, or keeps the placeholder.
pub fn render_config(channel: Option<&str>) -> String {
    match channel.map(str::trim).filter(|c| !c.is_empty()) {
        Some(channel) => EXAMPLE_CONFIG.replace(CHANNEL_PLACEHOLDER, channel),
        None => EXAMPLE_CONFIG.to_string(),
    }
}

/// Writes the starter config to `path`. An existing file is never replaced.
pub fn setup_at_path(path: &Path, channel: Option<&str>) -> Result<PathBuf> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            bail!("Configuration file already exists at {}", path.display())
        }
        Err(e) => {
            return Err(e)
                .with_context(|| format!("Failed to create config file {}", path.display()));
        }
    };
    file.write_all(render_config(channel).as_bytes())
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    info!(path = %path.display(), "Created starter configuration");
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::StablecoinProvider;
    use tempfile::TempDir;

    #[test]
    fn test_setup_writes_starter_config() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("nerkh").join("config.yaml");

        let written = setup_at_path(&config_path, None)?;

        assert_eq!(written, config_path);
        let config = AppConfig::load_from_path(&config_path)?;
        config.validate()?;
        assert_eq!(config.telegram.channel_id.as_deref(), Some(CHANNEL_PLACEHOLDER));
        assert!(config.telegram.token.is_none());
        Ok(())
    }

    #[test]
    fn test_setup_fills_in_channel() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("config.yaml");

        setup_at_path(&config_path, Some("@gold_prices"))?;

        let config = AppConfig::load_from_path(&config_path)?;
        assert_eq!(config.telegram.channel_id.as_deref(), Some("@gold_prices"));
        Ok(())
    }

    #[test]
    fn test_blank_channel_keeps_placeholder() {
        assert_eq!(render_config(Some("  ")), EXAMPLE_CONFIG);
    }

    #[test]
    fn test_setup_never_overwrites() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("config.yaml");
        fs::write(&config_path, "telegram: {}\n")?;

        let err = setup_at_path(&config_path, Some("@gold_prices")).unwrap_err();

        assert!(err.to_string().contains("already exists"));
        assert_eq!(fs::read_to_string(&config_path)?, "telegram: {}\n");
        Ok(())
    }

    #[test]
    fn test_starter_config_matches_defaults() -> Result<()> {
        let config: AppConfig = serde_yaml::from_str(EXAMPLE_CONFIG)?;
        let defaults = AppConfig::default();

        assert_eq!(config.schedule.interval_secs, defaults.schedule.interval_secs);
        assert_eq!(config.health.port, defaults.health.port);
        assert_eq!(
            config.providers.stablecoin_order,
            vec![StablecoinProvider::Wallex, StablecoinProvider::TetherLand]
        );
        Ok(())
    }
}
