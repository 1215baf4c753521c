use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub profile: Profile,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
}

/// Deployment profile. Permissive mirrors the dev/test setup (wider public
/// whitelist, long-lived tokens); Strict is the production setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Profile {
    Permissive,
    Strict,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Symmetric HS256 signing key. Rotating it invalidates every
    /// outstanding token.
    pub token_key: String,
    pub token_ttl_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let profile = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Profile::Strict,
            _ => Profile::Permissive,
        };

        // Profile presets first, then specific env vars override
        match profile {
            Profile::Strict => Self::strict(),
            Profile::Permissive => Self::permissive(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout_secs =
                v.parse().unwrap_or(self.database.connection_timeout_secs);
        }
        if let Ok(v) = env::var("SECURITY_TOKEN_KEY") {
            self.security.token_key = v;
        }
        if let Ok(v) = env::var("SECURITY_TOKEN_TTL_SECS") {
            self.security.token_ttl_secs = v.parse().unwrap_or(self.security.token_ttl_secs);
        }

        self
    }

    pub fn permissive() -> Self {
        Self {
            profile: Profile::Permissive,
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout_secs: 30,
            },
            security: SecurityConfig {
                token_key: "insecure-dev-signing-key-0123456789abcdef".to_string(),
                token_ttl_secs: 60 * 60,
            },
        }
    }

    pub fn strict() -> Self {
        Self {
            profile: Profile::Strict,
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout_secs: 5,
            },
            security: SecurityConfig {
                // Must come from SECURITY_TOKEN_KEY in production
                token_key: String::new(),
                token_ttl_secs: 15 * 60,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permissive_preset_has_dev_signing_key() {
        let config = AppConfig::permissive();
        assert_eq!(config.profile, Profile::Permissive);
        assert!(!config.security.token_key.is_empty());
        assert_eq!(config.security.token_ttl_secs, 3600);
    }

    #[test]
    fn strict_preset_requires_external_key() {
        let config = AppConfig::strict();
        assert_eq!(config.profile, Profile::Strict);
        assert!(config.security.token_key.is_empty());
        assert!(config.security.token_ttl_secs < AppConfig::permissive().security.token_ttl_secs);
    }
}
