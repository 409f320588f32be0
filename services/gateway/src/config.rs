//! Configuration loading
//!
//! The gateway's entire configuration surface is env-style variables; pool
//! sizing values must be positive integers and loading fails fast on
//! anything invalid.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use account_pool::PoolConfig;
use common::{Error, Result};

/// Root configuration
#[derive(Debug)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub max_connections: usize,
    /// Endpoint the fabrication worker receives requests on.
    pub worker_url: String,
    /// Base URL of the DNS-intelligence provider API.
    pub provider_base_url: String,
    pub pool: PoolConfig,
}

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn parsed<T: FromStr>(name: &str, default: T) -> Result<T> {
    match var(name) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| Error::Config(format!("{name} is not valid: {raw}"))),
    }
}

fn positive(name: &str, default: u32) -> Result<u32> {
    let value: u32 = parsed(name, default)?;
    if value == 0 {
        return Err(Error::Config(format!("{name} must be positive")));
    }
    Ok(value)
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for everything except `WORKER_URL`.
    pub fn from_env() -> Result<Self> {
        let listen_addr = parsed("LISTEN_ADDR", SocketAddr::from(([127, 0, 0, 1], 8080)))?;

        let max_connections: usize = parsed("MAX_CONNECTIONS", 1000)?;
        if max_connections == 0 {
            return Err(Error::Config("MAX_CONNECTIONS must be positive".into()));
        }

        let worker_url =
            var("WORKER_URL").ok_or_else(|| Error::Config("WORKER_URL must be set".into()))?;
        if !worker_url.starts_with("http://") && !worker_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "WORKER_URL must start with http:// or https://, got: {worker_url}"
            )));
        }

        let provider_base_url = var("PROVIDER_BASE_URL")
            .unwrap_or_else(|| "https://api.securitytrails.com/v1".to_owned());

        let pool = PoolConfig {
            requests_capacity: positive("REQUESTS_CAPACITY", 100)?,
            requests_per_account: positive("REQUESTS_PER_ACCOUNT", 50)?,
            max_pending_requests: positive("MAX_PENDING_REQUESTS", 5)?,
            sync_inaccuracy: positive("SYNC_INACCURACY", 70)?,
            pending_token_ttl: Duration::from_secs(u64::from(positive(
                "STORAGE_UUID_EXPIRE_TIME",
                800,
            )?)),
        };

        Ok(Self {
            listen_addr,
            max_connections,
            worker_url,
            provider_base_url,
            pool,
        })
    }
}
