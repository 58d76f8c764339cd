//! Server configuration from environment variables.

use std::env;
use std::net::SocketAddr;

use crate::error::{Result, ServerError};

/// Pool size when `DATABASE_MAX_CONNECTIONS` is not set.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Listen address when `BIND_ADDR` is not set.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub bind_addr: SocketAddr,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| ServerError::Config("DATABASE_URL not set".into()))?;

        let max_connections = match env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(raw) => raw.parse::<u32>().ok().filter(|n| *n > 0).ok_or_else(|| {
                ServerError::Config(format!(
                    "DATABASE_MAX_CONNECTIONS must be a positive integer, got '{raw}'"
                ))
            })?,
            Err(_) => DEFAULT_MAX_CONNECTIONS,
        };

        let raw_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = parse_bind_addr(&raw_addr)?;

        Ok(Self {
            database_url,
            max_connections,
            bind_addr,
        })
    }
}

fn parse_bind_addr(raw: &str) -> Result<SocketAddr> {
    raw.parse()
        .map_err(|_| ServerError::Config(format!("BIND_ADDR is not a socket address: '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bind_addr() {
        assert_eq!(parse_bind_addr(DEFAULT_BIND_ADDR).unwrap().port(), 8000);
        assert!(parse_bind_addr("localhost").is_err());
    }
}
