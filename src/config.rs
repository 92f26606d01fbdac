// src/config.rs
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://10.0.2.2:5001";
pub const DEFAULT_DB_URL: &str = "sqlite://shadowguard.db";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_PLATFORM: &str = "android";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub timeout: Duration,
    pub database_url: String,
    pub platform: String,
    pub app_version: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.into(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            database_url: DEFAULT_DB_URL.into(),
            platform: DEFAULT_PLATFORM.into(),
            app_version: env!("CARGO_PKG_VERSION").into(),
        }
    }
}

impl ClientConfig {
    /// Reads `SHADOWGUARD_*` variables, loading `.env` first if present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let timeout_ms: u64 = non_empty("SHADOWGUARD_TIMEOUT_MS")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_MS);

        Self {
            api_base_url: non_empty("SHADOWGUARD_API_URL")
                .map(|u| u.trim().trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base_url),
            timeout: Duration::from_millis(timeout_ms),
            database_url: non_empty("SHADOWGUARD_DB").unwrap_or(defaults.database_url),
            platform: non_empty("SHADOWGUARD_PLATFORM").unwrap_or(defaults.platform),
            app_version: non_empty("SHADOWGUARD_APP_VERSION").unwrap_or(defaults.app_version),
        }
    }
}
