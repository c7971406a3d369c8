use anyhow::{Context, Result};
use clap::Args;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_COUNTRIES_URL: &str =
    "https://restcountries.com/v2/all?fields=name,capital,region,population,flag,currencies";
pub const DEFAULT_RATES_URL: &str = "https://open.er-api.com/v6/latest/USD";
pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_PORT: u16 = 3000;

/// Runtime settings. Each one can be passed as a flag, read from the
/// environment (a `.env` file is loaded first) or left at its default.
#[derive(Args, Debug, Clone)]
pub struct Config {
    /// Country metadata endpoint
    #[arg(long, env = "COUNTRIES_API_URL", default_value = DEFAULT_COUNTRIES_URL)]
    pub countries_url: String,

    /// Exchange rate endpoint (must answer with a `rates` mapping)
    #[arg(long, env = "EXCHANGE_API_URL", default_value = DEFAULT_RATES_URL)]
    pub rates_url: String,

    /// Per-request timeout for external calls, in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value_t = DEFAULT_TIMEOUT_MS)]
    pub request_timeout_ms: u64,

    /// Interface to listen on
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// SQLite database file
    #[arg(long, env = "DB_PATH", default_value = "countries.db")]
    pub db_path: PathBuf,

    /// Where the summary PNG is written on every refresh
    #[arg(long, env = "SUMMARY_IMAGE_PATH", default_value = "cache/summary.png")]
    pub image_path: PathBuf,

    /// Seed for the GDP multiplier; unset draws a fresh one per refresh
    #[arg(long, env = "GDP_SEED")]
    pub gdp_seed: Option<u64>,
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.host, self.port))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            countries_url: DEFAULT_COUNTRIES_URL.to_string(),
            rates_url: DEFAULT_RATES_URL.to_string(),
            request_timeout_ms: DEFAULT_TIMEOUT_MS,
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            db_path: PathBuf::from("countries.db"),
            image_path: PathBuf::from("cache/summary.png"),
            gdp_seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listen_addr() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.listen_addr().unwrap().to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn test_listen_addr_rejects_garbage_host() {
        let config = Config {
            host: "not a host".to_string(),
            ..Config::default()
        };
        assert!(config.listen_addr().is_err());
    }

    #[test]
    fn test_request_timeout() {
        let config = Config {
            request_timeout_ms: 2500,
            ..Config::default()
        };
        assert_eq!(config.request_timeout(), Duration::from_millis(2500));
    }
}
