//! # Application State
//!
//! Shared state for the Axum application.
//! Contains the shop services and configuration.

use shop_core::{CatalogSeed, Currency, Shop};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Places searched for the seed catalog when `CATALOG_PATH` is unset
const CATALOG_SEARCH_PATHS: [&str; 3] = [
    "config/products.toml",
    "../config/products.toml",
    "../../config/products.toml",
];

/// Invalid configuration values
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid PORT: {0}")]
    InvalidPort(String),

    #[error("invalid SHOP_CURRENCY: {0}")]
    InvalidCurrency(String),

    #[error("invalid bind address: {0}")]
    InvalidAddress(String),
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Currency of the catalog
    pub currency: Currency,
    /// Explicit seed catalog location
    pub catalog_path: Option<PathBuf>,
}

impl AppConfig {
    /// Load from environment variables (and `.env`, if present)
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys fall back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => 8080,
        };
        let currency = match lookup("SHOP_CURRENCY") {
            Some(raw) => raw.parse().map_err(ConfigError::InvalidCurrency)?,
            None => Currency::default(),
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            currency,
            catalog_path: lookup("CATALOG_PATH").map(PathBuf::from),
        })
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse().map_err(|_| ConfigError::InvalidAddress(addr))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Catalog, carts, checkout and orders
    pub shop: Shop,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Configure from the environment and seed an in-memory shop
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        let shop = Shop::in_memory(config.currency);

        if let Some(seed) = load_catalog_seed(config.catalog_path.as_deref())? {
            let added = shop
                .catalog()
                .load_seed(seed)
                .map_err(|e| anyhow::anyhow!("Failed to seed catalog: {}", e))?;
            info!("Seeded {} products", added);
        }

        Ok(Self::with_shop(shop, config))
    }

    pub fn with_shop(shop: Shop, config: AppConfig) -> Self {
        Self { shop, config }
    }
}

/// Read the seed catalog. An explicit path must exist; otherwise the
/// search paths are tried and a missing file yields `None`.
fn load_catalog_seed(explicit: Option<&Path>) -> anyhow::Result<Option<CatalogSeed>> {
    if let Some(path) = explicit {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
        return parse_seed(&content, &path.display().to_string()).map(Some);
    }

    for path in CATALOG_SEARCH_PATHS {
        if let Ok(content) = std::fs::read_to_string(path) {
            return parse_seed(&content, path).map(Some);
        }
    }

    warn!("No product catalog found, starting with an empty catalog");
    Ok(None)
}

fn parse_seed(content: &str, origin: &str) -> anyhow::Result<CatalogSeed> {
    let seed = CatalogSeed::from_toml(content)
        .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", origin, e))?;
    info!("Loaded {} products from {}", seed.products.len(), origin);
    Ok(seed)
}
