//! TOML configuration parsing.
//!
//! The configuration file carries the database location, the server bind
//! address, the admin credentials for profile writes, pagination defaults and
//! the write rate limit. Only `[db]` and `[server]` are required.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable that overrides `[auth].username`.
pub const ADMIN_USER_ENV: &str = "PORTFOLIO_ADMIN_USER";
/// Environment variable that overrides `[auth].password`.
pub const ADMIN_PASSWORD_ENV: &str = "PORTFOLIO_ADMIN_PASSWORD";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
    /// Upper bound on pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// How long a statement waits on a locked database before failing.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_max_connections() -> u32 {
    5
}
fn default_busy_timeout_ms() -> u64 {
    5_000
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: default_username(),
            password: None,
        }
    }
}

fn default_username() -> String {
    "admin".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaginationConfig {
    #[serde(default = "default_per_page")]
    pub default_per_page: u32,
    #[serde(default = "default_max_per_page")]
    pub max_per_page: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_per_page: default_per_page(),
            max_per_page: default_max_per_page(),
        }
    }
}

fn default_per_page() -> u32 {
    5
}
fn default_max_per_page() -> u32 {
    100
}

/// Per-client quotas. Any value of `0` disables that quota.
#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitConfig {
    /// Profile writes allowed per minute for one client.
    #[serde(default = "default_writes_per_minute")]
    pub writes_per_minute: u32,
    /// Requests to any route allowed per minute for one client.
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,
    /// Requests to any route allowed per second for one client.
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            writes_per_minute: default_writes_per_minute(),
            requests_per_minute: default_requests_per_minute(),
            requests_per_second: default_requests_per_second(),
        }
    }
}

fn default_writes_per_minute() -> u32 {
    5
}
fn default_requests_per_minute() -> u32 {
    200
}
fn default_requests_per_second() -> u32 {
    50
}

/// Resolved admin credentials used by the Basic auth gate.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl AuthConfig {
    /// Resolve the admin credentials, letting the environment override the file.
    ///
    /// Fails when no non-empty password is available from either source.
    pub fn credentials(&self) -> Result<Credentials> {
        self.resolve(
            std::env::var(ADMIN_USER_ENV).ok(),
            std::env::var(ADMIN_PASSWORD_ENV).ok(),
        )
    }

    /// Empty environment values count as unset.
    fn resolve(
        &self,
        env_username: Option<String>,
        env_password: Option<String>,
    ) -> Result<Credentials> {
        let username = env_username
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| self.username.clone());
        let password = env_password
            .filter(|p| !p.is_empty())
            .or_else(|| self.password.clone())
            .filter(|p| !p.is_empty())
            .with_context(|| {
                format!(
                    "auth.password must be set in config or via {}",
                    ADMIN_PASSWORD_ENV
                )
            })?;

        if username.is_empty() {
            anyhow::bail!("auth.username must not be empty");
        }

        Ok(Credentials { username, password })
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config(&content)
}

/// Parse and validate configuration from a TOML string.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    if config.db.max_connections == 0 {
        anyhow::bail!("db.max_connections must be >= 1");
    }

    // Validate pagination
    if config.pagination.default_per_page == 0 {
        anyhow::bail!("pagination.default_per_page must be >= 1");
    }
    if config.pagination.max_per_page == 0 {
        anyhow::bail!("pagination.max_per_page must be >= 1");
    }
    if config.pagination.default_per_page > config.pagination.max_per_page {
        anyhow::bail!(
            "pagination.default_per_page ({}) must not exceed pagination.max_per_page ({})",
            config.pagination.default_per_page,
            config.pagination.max_per_page
        );
    }

    Ok(config)
}
