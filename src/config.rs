use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

/// A seed holding from the config file. Order in the file is the
/// display order.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HoldingConfig {
    pub symbol: String,
    pub count: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct UpbitProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct YahooProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub upbit: Option<UpbitProviderConfig>,
    pub yahoo: Option<YahooProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            upbit: Some(UpbitProviderConfig {
                base_url: "https://api.upbit.com".to_string(),
            }),
            yahoo: Some(YahooProviderConfig {
                base_url: "https://query1.finance.yahoo.com".to_string(),
            }),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FxConfig {
    #[serde(default = "default_fx_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_fx_rate")]
    pub default_rate: f64,
}

fn default_fx_ttl_secs() -> u64 {
    600
}

fn default_fx_rate() -> f64 {
    1350.0
}

impl Default for FxConfig {
    fn default() -> Self {
        FxConfig {
            ttl_secs: default_fx_ttl_secs(),
            default_rate: default_fx_rate(),
        }
    }
}

fn default_refresh_secs() -> u64 {
    30
}

fn default_lookup_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub holdings: Vec<HoldingConfig>,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub fx: FxConfig,
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
    #[serde(default = "default_lookup_timeout_secs")]
    pub lookup_timeout_secs: u64,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("in", "codito", "jasan")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn upbit_base_url(&self) -> &str {
        self.providers
            .upbit
            .as_ref()
            .map_or("https://api.upbit.com", |p| &p.base_url)
    }

    pub fn yahoo_base_url(&self) -> &str {
        self.providers
            .yahoo
            .as_ref()
            .map_or("https://query1.finance.yahoo.com", |p| &p.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
holdings:
  - symbol: BTC
    count: 0.5
  - symbol: "005930"
    count: 12.0
refresh_secs: 15
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.holdings.len(), 2);
        assert_eq!(config.holdings[0].symbol, "BTC");
        assert_eq!(config.holdings[0].count, 0.5);
        assert_eq!(config.holdings[1].symbol, "005930");
        assert_eq!(config.refresh_secs, 15);

        // Providers and fx fall back to defaults
        assert_eq!(config.upbit_base_url(), "https://api.upbit.com");
        assert_eq!(config.yahoo_base_url(), "https://query1.finance.yahoo.com");
        assert_eq!(config.fx.ttl_secs, 600);
        assert_eq!(config.fx.default_rate, 1350.0);
        assert_eq!(config.lookup_timeout_secs, 10);
    }

    #[test]
    fn test_config_with_providers() {
        let yaml_str = r#"
holdings: []
providers:
  upbit:
    base_url: "http://example.com/upbit"
  yahoo:
    base_url: "http://example.com/yahoo"
fx:
  ttl_secs: 60
  default_rate: 1400.0
"#;
        let config: AppConfig = serde_yaml::from_str(yaml_str).unwrap();
        assert_eq!(config.upbit_base_url(), "http://example.com/upbit");
        assert_eq!(config.yahoo_base_url(), "http://example.com/yahoo");
        assert_eq!(config.fx.ttl_secs, 60);
        assert_eq!(config.fx.default_rate, 1400.0);
        assert_eq!(config.refresh_secs, 30);
    }
}
