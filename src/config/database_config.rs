//! Database configuration parsing from environment variables.

use anyhow::{Context, Result};
use std::env;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://folioguard.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Database environment configuration
#[derive(Debug, Clone)]
pub struct DatabaseEnvConfig {
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseEnvConfig {
    pub fn from_env() -> Result<Self> {
        let url = env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        let max_connections = match env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .context("Failed to parse DATABASE_MAX_CONNECTIONS")?,
            Err(_) => DEFAULT_MAX_CONNECTIONS,
        };
        if max_connections == 0 {
            anyhow::bail!("DATABASE_MAX_CONNECTIONS must be at least 1");
        }

        Ok(Self {
            url,
            max_connections,
        })
    }

    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:")
    }
}
