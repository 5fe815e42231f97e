use std::{num::NonZeroU32, time::Duration};

use crate::error::Result;
pub use clap::Parser;
use lingo_app::state::AppConfig;
use lingo_types::{config::BackendConfig, paging::MAX_TAKE};

#[derive(Debug, Clone, clap::Parser)]
pub struct ServerConfig {
    #[arg(
        short,
        long,
        default_value_t = 3000,
        env = "LINGO_LISTEN_PORT",
        help = "Port to listen on"
    )]
    pub port: u16,
    #[arg(
        short,
        long,
        default_value = "127.0.0.1",
        env = "LINGO_LISTEN_ADDRESS",
        help = "Address to listen on"
    )]
    pub listen_address: String,

    #[command(flatten)]
    pub backend: BackendConfig,

    #[arg(
        long,
        env = "LINGO_TOKEN_VALIDITY",
        default_value = "1 day",
        help = "Access token validity in human friendly format (e.g. 1d, 1h, 30m or combined)",
        value_parser = humantime::parse_duration
    )]
    pub token_validity: Duration,

    #[arg(
        long,
        env = "LINGO_DEFAULT_PAGE_SIZE",
        default_value = "10",
        help = "Page size used when listing request has no take parameter, at most 50",
        value_parser = parse_page_size
    )]
    pub default_page_size: NonZeroU32,

    #[arg(long, env = "LINGO_CORS", help = "Enable permissive CORS")]
    pub cors: bool,
}

fn parse_page_size(value: &str) -> Result<NonZeroU32, String> {
    let size: NonZeroU32 = value.parse().map_err(|e| format!("{e}"))?;
    if size.get() > MAX_TAKE {
        return Err(format!("must be at most {MAX_TAKE}"));
    }
    Ok(size)
}

impl ServerConfig {
    pub fn load() -> Result<Self> {
        ServerConfig::try_parse().map_err(|e| e.into())
    }

    pub fn database_url(&self) -> String {
        self.backend.database_url()
    }
}

impl From<&ServerConfig> for AppConfig {
    fn from(config: &ServerConfig) -> Self {
        AppConfig {
            default_page_size: config.default_page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::try_parse_from(["lingo-server", "--data-dir", "/tmp/lingo"]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.token_validity, Duration::from_secs(24 * 3600));
        assert_eq!(config.default_page_size.get(), 10);
        assert!(!config.cors);
        assert_eq!(config.database_url(), "sqlite:///tmp/lingo/lingo.db");
    }

    fn with_page_size(size: &str) -> Result<ServerConfig, clap::Error> {
        ServerConfig::try_parse_from([
            "lingo-server",
            "--data-dir",
            "/tmp/lingo",
            "--default-page-size",
            size,
        ])
    }

    #[test]
    fn test_page_size_bounds() {
        assert!(with_page_size("0").is_err());
        assert!(with_page_size("51").is_err());
        assert!(with_page_size("1000").is_err());
        assert_eq!(with_page_size("50").unwrap().default_page_size.get(), MAX_TAKE);
    }
}
