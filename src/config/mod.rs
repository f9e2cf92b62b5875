//! Application settings: per-environment presets, then environment variables

use std::env;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub gamification: GamificationConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres connection string; without it development falls back to the
    /// in-memory store
    #[serde(skip_serializing)]
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub run_migrations: bool,
    /// Attempts per mutation before a transaction conflict is reported
    pub max_transaction_attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
    /// Public base URL of this backend, reported to clients
    pub public_base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub cors_origins: Vec<String>,
    /// Expected `iss` of session tokens
    pub auth_issuer: Option<String>,
    /// Expected `aud` of session tokens
    pub auth_audience: Option<String>,
    /// JWKS endpoint; derived from the issuer when unset
    pub jwks_url: Option<String>,
    /// HS256 secret for locally minted session tokens
    #[serde(skip_serializing)]
    pub jwt_secret: Option<String>,
    /// Signing secret for `/clerk-webhook` deliveries (`whsec_...`)
    #[serde(skip_serializing)]
    pub webhook_secret: Option<String>,
    pub webhook_tolerance_secs: i64,
    /// Auth provider publishable key, handed to the frontend
    pub publishable_key: Option<String>,
    pub dev_token_expiry_hours: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GamificationConfig {
    pub student_starting_points: i64,
    pub teacher_starting_points: i64,
    pub leaderboard_size: usize,
    pub announcement_limit: usize,
}

impl Default for GamificationConfig {
    fn default() -> Self {
        Self {
            student_starting_points: 150,
            teacher_starting_points: 0,
            leaderboard_size: 50,
            announcement_limit: 50,
        }
    }
}

/// Overwrite `target` with the parsed value of `name`, if set. Values that do
/// not parse keep the preset.
fn parse_var<T: FromStr>(name: &str, target: &mut T) {
    if let Some(raw) = string_var(name) {
        match raw.parse() {
            Ok(value) => *target = value,
            Err(_) => tracing::warn!("Ignoring unparsable {}={:?}", name, raw),
        }
    }
}

fn string_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match string_var("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        let mut config = Self::for_environment(environment);
        config.apply_env();
        config
    }

    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Development => Self::development(),
            Environment::Staging => Self::staging(),
            Environment::Production => Self::production(),
        }
    }

    fn apply_env(&mut self) {
        let database = &mut self.database;
        if let Some(url) = string_var("DATABASE_URL") {
            database.url = Some(url);
        }
        parse_var("DATABASE_MAX_CONNECTIONS", &mut database.max_connections);
        parse_var("DATABASE_CONNECTION_TIMEOUT", &mut database.connection_timeout);
        parse_var("DATABASE_RUN_MIGRATIONS", &mut database.run_migrations);
        parse_var("DATABASE_MAX_TRANSACTION_ATTEMPTS", &mut database.max_transaction_attempts);

        // API_PORT wins over the platform-provided PORT
        let api = &mut self.api;
        parse_var("PORT", &mut api.port);
        parse_var("API_PORT", &mut api.port);
        parse_var("API_ENABLE_REQUEST_LOGGING", &mut api.enable_request_logging);
        parse_var("API_MAX_REQUEST_SIZE_BYTES", &mut api.max_request_size_bytes);
        if let Some(url) = string_var("API_BASE_URL") {
            api.public_base_url = Some(url);
        }

        let security = &mut self.security;
        if let Some(origins) = string_var("SECURITY_CORS_ORIGINS") {
            security.cors_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        for (name, slot) in [
            ("AUTH_ISSUER", &mut security.auth_issuer),
            ("AUTH_AUDIENCE", &mut security.auth_audience),
            ("AUTH_JWKS_URL", &mut security.jwks_url),
            ("AUTH_JWT_SECRET", &mut security.jwt_secret),
            ("CLERK_WEBHOOK_SECRET", &mut security.webhook_secret),
            ("CLERK_PUBLISHABLE_KEY", &mut security.publishable_key),
        ] {
            if let Some(value) = string_var(name) {
                *slot = Some(value);
            }
        }
        parse_var("WEBHOOK_TOLERANCE_SECS", &mut security.webhook_tolerance_secs);
        parse_var("DEV_TOKEN_EXPIRY_HOURS", &mut security.dev_token_expiry_hours);

        let game = &mut self.gamification;
        parse_var("GAME_STUDENT_STARTING_POINTS", &mut game.student_starting_points);
        parse_var("GAME_TEACHER_STARTING_POINTS", &mut game.teacher_starting_points);
        parse_var("GAME_LEADERBOARD_SIZE", &mut game.leaderboard_size);
        parse_var("GAME_ANNOUNCEMENT_LIMIT", &mut game.announcement_limit);
    }

    /// Local defaults: in-memory store unless DATABASE_URL is set, long-lived
    /// dev tokens, Vite and local frontend origins
    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
                run_migrations: true,
                max_transaction_attempts: 5,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 1024 * 1024,
                public_base_url: None,
            },
            security: SecurityConfig {
                cors_origins: vec!["http://localhost:5173".to_string(), "http://localhost:3000".to_string()],
                auth_issuer: None,
                auth_audience: None,
                jwks_url: None,
                jwt_secret: None,
                webhook_secret: None,
                webhook_tolerance_secs: 300,
                publishable_key: None,
                dev_token_expiry_hours: 24 * 7,
            },
            gamification: GamificationConfig::default(),
        }
    }

    pub fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.database.max_connections = 20;
        config.database.connection_timeout = 10;
        config.api.max_request_size_bytes = 512 * 1024;
        config.security.cors_origins = vec!["https://staging.skolepoeng.no".to_string()];
        config.security.dev_token_expiry_hours = 24;
        config
    }

    /// Production never auto-migrates; run `skolepoeng-admin db migrate`
    pub fn production() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Production;
        config.database.max_connections = 50;
        config.database.connection_timeout = 5;
        config.database.run_migrations = false;
        config.api.enable_request_logging = false;
        config.api.max_request_size_bytes = 256 * 1024;
        config.security.cors_origins = vec!["https://skolepoeng.no".to_string()];
        config.security.dev_token_expiry_hours = 1;
        config
    }
}

static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

/// Process-wide settings, read from the environment on first use
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_uses_memory_store_and_school_defaults() {
        let config = AppConfig::development();
        assert!(config.database.url.is_none());
        assert!(config.database.run_migrations);
        assert_eq!(config.gamification.student_starting_points, 150);
        assert_eq!(config.gamification.teacher_starting_points, 0);
    }

    #[test]
    fn production_tightens_the_presets() {
        let config = AppConfig::for_environment(Environment::Production);
        assert_eq!(config.environment, Environment::Production);
        assert!(!config.database.run_migrations);
        assert!(!config.api.enable_request_logging);
        assert!(config.api.max_request_size_bytes < AppConfig::staging().api.max_request_size_bytes);
    }

    #[test]
    fn secrets_are_not_serialized() {
        let mut config = AppConfig::development();
        config.security.jwt_secret = Some("hunter2".to_string());
        config.security.webhook_secret = Some("whsec_abc".to_string());
        config.database.url = Some("postgres://u:p@localhost/db".to_string());

        let rendered = serde_json::to_string(&config).unwrap();
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("whsec_abc"));
        assert!(!rendered.contains("postgres://"));
    }
}
