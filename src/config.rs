//! Server configuration read from the environment (optionally via `.env`).

use std::str::FromStr;

use crate::domain::EXPIRING_SOON_DAYS;

/// Parse `key` from the environment, falling back to `default` when it is
/// unset or does not parse.
pub fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Non-empty value of `key`, if any.
pub fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub environment: String,
    pub host: String,
    pub port: u16,
    /// Days ahead of expiry that count as "expiring soon" for reminders
    pub reminder_window_days: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            environment: env_opt("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            host: env_opt("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: env_or("PORT", 8001),
            reminder_window_days: env_or("REMINDER_WINDOW_DAYS", EXPIRING_SOON_DAYS).max(0),
        }
    }
}

impl ServerConfig {
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
