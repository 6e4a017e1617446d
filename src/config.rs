//! Configuration loaded from environment variables with defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, Context};
use rust_decimal::Decimal;

use crate::pricing::PricingPolicy;

/// Which inventory store backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Postgres,
    /// In-process arena tables seeded with a demo catalog
    Memory,
}

impl FromStr for StorageKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageKind::Postgres),
            "memory" => Ok(StorageKind::Memory),
            other => Err(anyhow!("unknown storage kind '{}'", other)),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub storage: StorageKind,
    /// Required for `StorageKind::Postgres`
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    /// Directory served under `/media` (room images)
    pub media_dir: PathBuf,
    pub pricing: PricingPolicy,
}

impl Config {
    /// Load configuration from the process environment (after `.env`)
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = PricingPolicy::default();

        let bind_addr = var_or("BIND_ADDR", "0.0.0.0:8080")
            .parse()
            .context("BIND_ADDR must be a socket address")?;
        let storage = var_or("STORAGE", "postgres").parse()?;
        let database_url = env::var("DATABASE_URL").ok();
        if storage == StorageKind::Postgres && database_url.is_none() {
            return Err(anyhow!("DATABASE_URL must be set when STORAGE=postgres"));
        }

        let db_max_connections = var_or("DB_MAX_CONNECTIONS", "10")
            .parse()
            .context("DB_MAX_CONNECTIONS must be a positive integer")?;

        let free_adults_per_room = match env::var("FREE_ADULTS_PER_ROOM") {
            Ok(v) => v.parse().context("FREE_ADULTS_PER_ROOM must be an integer")?,
            Err(_) => defaults.free_adults_per_room,
        };
        let extra_adult_fee = match env::var("EXTRA_ADULT_FEE") {
            Ok(v) => Decimal::from_str(&v).context("EXTRA_ADULT_FEE must be a decimal")?,
            Err(_) => defaults.extra_adult_fee,
        };

        Ok(Self {
            bind_addr,
            storage,
            database_url,
            db_max_connections,
            media_dir: PathBuf::from(var_or("MEDIA_DIR", "media")),
            pricing: PricingPolicy {
                free_adults_per_room,
                extra_adult_fee,
                currency: var_or("CURRENCY", &defaults.currency),
            },
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
