//! Authorizer configuration
//!
//! The signing secret and TTL defaults are fixed at construction and
//! shared read-only; nothing in the core mutates configuration after
//! startup.

use std::fmt;
use thiserror::Error;

/// Default user-token lifetime: one day
pub const DEFAULT_USER_TOKEN_TTL: i64 = 60 * 60 * 24;

/// Default service-token lifetime: 90 days
pub const DEFAULT_SERVICE_TOKEN_TTL: i64 = 60 * 60 * 24 * 90;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("token secret cannot be empty")]
    EmptySecret,
}

/// Immutable authorizer settings
#[derive(Clone)]
pub struct AuthConfig {
    secret: Vec<u8>,
    user_token_ttl: i64,
    service_token_ttl: i64,
}

impl AuthConfig {
    /// Create a configuration with the given signing secret
    pub fn new(secret: impl Into<Vec<u8>>) -> Result<Self, ConfigError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(ConfigError::EmptySecret);
        }

        Ok(Self {
            secret,
            user_token_ttl: DEFAULT_USER_TOKEN_TTL,
            service_token_ttl: DEFAULT_SERVICE_TOKEN_TTL,
        })
    }

    /// Set the user-token lifetime in seconds
    pub fn user_token_ttl(mut self, ttl: i64) -> Self {
        self.user_token_ttl = ttl;
        self
    }

    /// Set the service-token lifetime in seconds
    pub fn service_token_ttl(mut self, ttl: i64) -> Self {
        self.service_token_ttl = ttl;
        self
    }

    pub fn user_token_ttl_secs(&self) -> i64 {
        self.user_token_ttl
    }

    pub fn service_token_ttl_secs(&self) -> i64 {
        self.service_token_ttl
    }

    pub(crate) fn secret(&self) -> &[u8] {
        &self.secret
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"[REDACTED]")
            .field("user_token_ttl", &self.user_token_ttl)
            .field("service_token_ttl", &self.service_token_ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_rejects_empty_secret() {
        assert!(matches!(AuthConfig::new(""), Err(ConfigError::EmptySecret)));
        assert!(matches!(
            AuthConfig::new(Vec::new()),
            Err(ConfigError::EmptySecret)
        ));
    }

    #[test]
    fn test_config_defaults() {
        let config = AuthConfig::new("secret").unwrap();
        assert_eq!(config.user_token_ttl_secs(), DEFAULT_USER_TOKEN_TTL);
        assert_eq!(config.service_token_ttl_secs(), DEFAULT_SERVICE_TOKEN_TTL);
    }

    #[test]
    fn test_config_builder_chain() {
        let config = AuthConfig::new("secret")
            .unwrap()
            .user_token_ttl(60)
            .service_token_ttl(120);

        assert_eq!(config.user_token_ttl_secs(), 60);
        assert_eq!(config.service_token_ttl_secs(), 120);
    }

    #[test]
    fn test_config_debug_redacts_secret() {
        let config = AuthConfig::new("super-secret").unwrap();
        let debug = format!("{config:?}");

        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("super-secret"));
    }
}
