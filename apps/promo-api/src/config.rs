//! Service configuration.
//!
//! Layered with the `config` crate, later layers winning:
//!
//! ```text
//! built-in defaults ──► promo.toml (optional) ──► environment variables
//! ```
//!
//! | Key | Env var | Default |
//! |-----|---------|---------|
//! | `port` | `PORT` | 8080 |
//! | `bind_addr` | `BIND_ADDR` | 0.0.0.0 |
//! | `database_path` | `DATABASE_PATH` | promo.db |
//! | `api_token` | `API_TOKEN` | **required** (server only) |
//! | `erp_feed_url` | `ERP_FEED_URL` | none |
//! | `erp_timeout_secs` | `ERP_TIMEOUT_SECS` | 30 |
//! | `order_targeting` | `ORDER_TARGETING` | line_list |
//! | `app_url` | `APP_URL` | **required** (client only) |

use config::{Config, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use promo_core::checkout::OrderTargeting;

/// Optional file layer, looked up in the working directory.
const CONFIG_FILE: &str = "promo";

/// Every key any binary may read. Each typed config picks what it needs.
#[derive(Debug, Deserialize)]
struct RawSettings {
    port: u16,
    bind_addr: String,
    database_path: String,
    api_token: Option<String>,
    erp_feed_url: Option<String>,
    erp_timeout_secs: u64,
    order_targeting: String,
    app_url: Option<String>,
}

/// `vars` replaces the process environment when given (tests).
fn load_settings(vars: Option<HashMap<String, String>>) -> Result<RawSettings, ConfigError> {
    let settings = Config::builder()
        .set_default("port", 8080)?
        .set_default("bind_addr", "0.0.0.0")?
        .set_default("database_path", "promo.db")?
        .set_default("erp_timeout_secs", 30)?
        .set_default("order_targeting", "line_list")?
        .add_source(File::with_name(CONFIG_FILE).required(false))
        .add_source(Environment::default().source(vars))
        .build()?;

    Ok(settings.try_deserialize()?)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// =============================================================================
// Server
// =============================================================================

/// HTTP service configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub port: u16,
    pub bind_addr: String,
    pub database_path: PathBuf,

    /// Static bearer token every `/api` caller must present.
    pub api_token: String,

    /// ERP discount feed. The import endpoint fails while unset.
    pub erp_feed_url: Option<String>,

    /// Timeout for ERP feed requests.
    pub erp_timeout: Duration,

    /// How ORDER directives are expressed in checkout output.
    pub order_targeting: OrderTargeting,
}

impl ApiConfig {
    /// Loads from defaults, `promo.toml` and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_settings(load_settings(None)?)
    }

    /// Loads with `vars` standing in for the environment.
    pub fn from_vars<K, V>(vars: impl IntoIterator<Item = (K, V)>) -> Result<Self, ConfigError>
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::from_settings(load_settings(Some(to_map(vars)))?)
    }

    fn from_settings(raw: RawSettings) -> Result<Self, ConfigError> {
        let api_token = non_blank(raw.api_token)
            .ok_or_else(|| ConfigError::MissingRequired("API_TOKEN".to_string()))?;

        let order_targeting = raw
            .order_targeting
            .parse()
            .map_err(|_| ConfigError::InvalidValue("ORDER_TARGETING".to_string()))?;

        Ok(ApiConfig {
            port: raw.port,
            bind_addr: raw.bind_addr,
            database_path: PathBuf::from(raw.database_path),
            api_token,
            erp_feed_url: non_blank(raw.erp_feed_url),
            erp_timeout: Duration::from_secs(raw.erp_timeout_secs),
            order_targeting,
        })
    }

    /// `bind_addr:port`, ready for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

// =============================================================================
// ERP Import
// =============================================================================

/// Configuration of the standalone `erp-import` binary.
#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub database_path: PathBuf,
    pub erp_feed_url: String,
    pub erp_timeout: Duration,
}

impl ImportConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let raw = load_settings(None)?;

        Ok(ImportConfig {
            database_path: PathBuf::from(raw.database_path),
            erp_feed_url: non_blank(raw.erp_feed_url)
                .ok_or_else(|| ConfigError::MissingRequired("ERP_FEED_URL".to_string()))?,
            erp_timeout: Duration::from_secs(raw.erp_timeout_secs),
        })
    }
}

// =============================================================================
// Checkout Function Client
// =============================================================================

/// Where the checkout function finds the rule endpoints.
///
/// Passed explicitly to [`crate::client::RuleClient`]; the client never
/// reads the environment itself.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the promo service, without trailing `/api`.
    pub app_url: String,
    pub api_token: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(app_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        ClientConfig {
            app_url: app_url.into().trim_end_matches('/').to_string(),
            api_token: api_token.into(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Loads `APP_URL` and `API_TOKEN` from `promo.toml` and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_settings(load_settings(None)?)
    }

    pub fn from_vars<K, V>(vars: impl IntoIterator<Item = (K, V)>) -> Result<Self, ConfigError>
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::from_settings(load_settings(Some(to_map(vars)))?)
    }

    fn from_settings(raw: RawSettings) -> Result<Self, ConfigError> {
        let app_url = non_blank(raw.app_url)
            .ok_or_else(|| ConfigError::MissingRequired("APP_URL".to_string()))?;
        let api_token = non_blank(raw.api_token)
            .ok_or_else(|| ConfigError::MissingRequired("API_TOKEN".to_string()))?;

        Ok(ClientConfig::new(app_url, api_token))
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn to_map<K, V>(vars: impl IntoIterator<Item = (K, V)>) -> HashMap<String, String>
where
    K: Into<String>,
    V: Into<String>,
{
    vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error(transparent)]
    Source(#[from] config::ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_with_token() {
        let config = ApiConfig::from_vars([("API_TOKEN", "secret")]).unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.database_path, PathBuf::from("promo.db"));
        assert_eq!(config.api_token, "secret");
        assert_eq!(config.erp_feed_url, None);
        assert_eq!(config.erp_timeout, Duration::from_secs(30));
        assert_eq!(config.order_targeting, OrderTargeting::LineList);
    }

    #[test]
    fn test_env_overrides() {
        let config = ApiConfig::from_vars([
            ("API_TOKEN", "secret"),
            ("PORT", "9000"),
            ("BIND_ADDR", "127.0.0.1"),
            ("ERP_FEED_URL", "https://erp.example/discounts"),
            ("ORDER_TARGETING", "whole_order"),
        ])
        .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:9000");
        assert_eq!(
            config.erp_feed_url.as_deref(),
            Some("https://erp.example/discounts")
        );
        assert_eq!(config.order_targeting, OrderTargeting::WholeOrder);
    }

    #[test]
    fn test_missing_token_is_rejected() {
        let err = ApiConfig::from_vars([("PORT", "9000")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired(ref key) if key == "API_TOKEN"));

        let err = ApiConfig::from_vars([("API_TOKEN", "  ")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired(_)));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(ApiConfig::from_vars([("API_TOKEN", "t"), ("ORDER_TARGETING", "all")]).is_err());
        assert!(ApiConfig::from_vars([("API_TOKEN", "t"), ("PORT", "not-a-port")]).is_err());
    }

    #[test]
    fn test_client_config() {
        let config =
            ClientConfig::from_vars([("APP_URL", "http://localhost:8080/"), ("API_TOKEN", "t")])
                .unwrap();
        assert_eq!(config.app_url, "http://localhost:8080");

        assert!(ClientConfig::from_vars([("API_TOKEN", "t")]).is_err());
    }
}
