//! Configuration module for FolioGuard.
//!
//! Settings are loaded from environment variables (a `.env` file is honoured
//! by the binary through `dotenvy`).

mod database_config;

pub use database_config::{DEFAULT_DATABASE_URL, DatabaseEnvConfig};

use crate::domain::money::Currency;
use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseEnvConfig,
    /// Currency used for totals of empty portfolios.
    pub default_currency: Currency,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let database = DatabaseEnvConfig::from_env()?;

        let currency_str = env::var("DEFAULT_CURRENCY").unwrap_or_else(|_| "JPY".to_string());
        let default_currency = Currency::from_str(currency_str.trim())
            .with_context(|| format!("Invalid DEFAULT_CURRENCY: {}", currency_str))?;

        Ok(Self {
            database,
            default_currency,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::OnceLock;

    // Global lock to prevent race conditions when modifying environment variables in tests
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn get_env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    const VARS: [&str; 3] = ["DATABASE_URL", "DATABASE_MAX_CONNECTIONS", "DEFAULT_CURRENCY"];

    fn clear_env() {
        for var in VARS {
            unsafe { env::remove_var(var) };
        }
    }

    #[test]
    fn test_defaults() {
        let _guard = get_env_lock().lock().unwrap();
        clear_env();

        let config = Config::from_env().unwrap();
        assert_eq!(config.database.url, DEFAULT_DATABASE_URL);
        assert_eq!(config.database.max_connections, 5);
        assert!(!config.database.is_in_memory());
        assert_eq!(config.default_currency, Currency::Jpy);
    }

    #[test]
    fn test_overrides() {
        let _guard = get_env_lock().lock().unwrap();
        clear_env();
        unsafe {
            env::set_var("DATABASE_URL", "sqlite::memory:");
            env::set_var("DATABASE_MAX_CONNECTIONS", "2");
            env::set_var("DEFAULT_CURRENCY", "USD");
        }

        let config = Config::from_env().unwrap();
        assert!(config.database.is_in_memory());
        assert_eq!(config.database.max_connections, 2);
        assert_eq!(config.default_currency, Currency::Usd);

        clear_env();
    }

    #[test]
    fn test_invalid_values() {
        let _guard = get_env_lock().lock().unwrap();
        clear_env();

        unsafe { env::set_var("DEFAULT_CURRENCY", "GBP") };
        assert!(Config::from_env().is_err());
        clear_env();

        unsafe { env::set_var("DATABASE_MAX_CONNECTIONS", "many") };
        assert!(Config::from_env().is_err());
        clear_env();

        unsafe { env::set_var("DATABASE_MAX_CONNECTIONS", "0") };
        assert!(Config::from_env().is_err());
        clear_env();
    }
}
