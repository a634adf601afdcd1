use crate::core::{AppError, BusinessCalendar, Result};
use serde::Deserialize;
use std::env;

pub mod database;
pub mod server;

pub use database::DatabaseConfig;
pub use server::ServerConfig;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub log_level: String,
    /// `json` or `pretty`
    pub log_format: String,
    /// Offset used to compute business dates (Bogotá is -5)
    pub business_utc_offset_hours: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub rate_limit_per_minute: u32,
    /// Empty list allows any origin (development only)
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = Config {
            app: AppConfig {
                env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
                log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
                business_utc_offset_hours: env::var("BUSINESS_UTC_OFFSET_HOURS")
                    .unwrap_or_else(|_| "-5".to_string())
                    .parse()
                    .map_err(|_| {
                        AppError::Configuration("Invalid BUSINESS_UTC_OFFSET_HOURS".to_string())
                    })?,
            },
            database: DatabaseConfig::from_env()?,
            server: ServerConfig::from_env()?,
            security: SecurityConfig {
                rate_limit_per_minute: env::var("RATE_LIMIT_PER_MINUTE")
                    .unwrap_or_else(|_| "600".to_string())
                    .parse()
                    .map_err(|_| {
                        AppError::Configuration("Invalid RATE_LIMIT_PER_MINUTE".to_string())
                    })?,
                cors_allowed_origins: parse_list(
                    &env::var("CORS_ALLOWED_ORIGINS").unwrap_or_default(),
                ),
            },
        };

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.security.rate_limit_per_minute == 0 {
            return Err(AppError::Configuration(
                "Rate limit must be greater than 0".to_string(),
            ));
        }

        if !matches!(self.app.log_format.as_str(), "json" | "pretty") {
            return Err(AppError::Configuration(format!(
                "LOG_FORMAT must be 'json' or 'pretty', got '{}'",
                self.app.log_format
            )));
        }

        if self.app.env == "production" && self.security.cors_allowed_origins.is_empty() {
            return Err(AppError::Configuration(
                "CORS_ALLOWED_ORIGINS must be set in production".to_string(),
            ));
        }

        self.database.validate()?;
        self.business_calendar()?;

        Ok(())
    }

    pub fn business_calendar(&self) -> Result<BusinessCalendar> {
        BusinessCalendar::from_utc_offset_hours(self.app.business_utc_offset_hours)
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
