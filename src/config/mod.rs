use crate::core::{AppError, Currency, Result};
use crate::modules::redsys::models::MerchantKey;
use serde::Deserialize;
use std::env;

pub mod database;
pub mod server;

pub use database::DatabaseConfig;
pub use server::ServerConfig;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub redsys: RedsysConfig,
    pub mailer: MailerConfig,
    pub tokens: AccessTokenConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub log_level: String,
    /// Public base URL of the end-user portal, used to build receipt
    /// and entry-pass links embedded in confirmation emails
    pub portal_base_url: String,
    /// Whole-hour UTC offset of the facility (display only)
    pub facility_utc_offset_hours: i32,
    /// IANA timezone name passed through to calendar links
    pub facility_timezone: String,
}

/// Redsys gateway configuration
///
/// The merchant secret is validated (Base64 of exactly 24 raw bytes)
/// when the config is loaded, so a bad key aborts startup instead of
/// failing on the first signature
#[derive(Debug, Clone)]
pub struct RedsysConfig {
    pub merchant_code: String,
    pub terminal: String,
    pub merchant_name: Option<String>,
    pub currency: Currency,
    pub merchant_key: MerchantKey,
    pub environment: RedsysEnvironment,
    /// Server-to-server notification callback URL
    pub merchant_url: String,
    pub url_ok: String,
    pub url_ko: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedsysEnvironment {
    Test,
    Production,
}

impl RedsysEnvironment {
    /// The realizarPago endpoint the browser form must POST to
    pub fn action_url(&self) -> &'static str {
        match self {
            RedsysEnvironment::Test => "https://sis-t.redsys.es:25443/sis/realizarPago",
            RedsysEnvironment::Production => "https://sis.redsys.es/sis/realizarPago",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailerConfig {
    pub api_url: String,
    pub api_key: String,
    pub from_address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccessTokenConfig {
    pub secret: String,
    pub receipt_ttl_hours: i64,
    pub pass_ttl_hours: i64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let environment = match env::var("REDSYS_ENVIRONMENT")
            .unwrap_or_else(|_| "test".to_string())
            .as_str()
        {
            "production" => RedsysEnvironment::Production,
            "test" => RedsysEnvironment::Test,
            other => {
                return Err(AppError::Configuration(format!(
                    "Invalid REDSYS_ENVIRONMENT: {}",
                    other
                )))
            }
        };

        let config = Config {
            app: AppConfig {
                env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
                portal_base_url: env::var("PORTAL_BASE_URL")
                    .unwrap_or_else(|_| "http://localhost:3000".to_string()),
                facility_utc_offset_hours: env::var("FACILITY_UTC_OFFSET_HOURS")
                    .unwrap_or_else(|_| "1".to_string())
                    .parse()
                    .map_err(|_| {
                        AppError::Configuration("Invalid FACILITY_UTC_OFFSET_HOURS".to_string())
                    })?,
                facility_timezone: env::var("FACILITY_TIMEZONE")
                    .unwrap_or_else(|_| "Europe/Madrid".to_string()),
            },
            database: DatabaseConfig::from_env()?,
            server: ServerConfig::from_env()?,
            redsys: RedsysConfig {
                merchant_code: env::var("REDSYS_MERCHANT_CODE").map_err(|_| {
                    AppError::Configuration("REDSYS_MERCHANT_CODE not set".to_string())
                })?,
                terminal: env::var("REDSYS_TERMINAL").unwrap_or_else(|_| "1".to_string()),
                merchant_name: env::var("REDSYS_MERCHANT_NAME").ok(),
                currency: env::var("REDSYS_CURRENCY")
                    .unwrap_or_else(|_| "EUR".to_string())
                    .parse()
                    .map_err(AppError::Configuration)?,
                // Fail fast: the key must decode to exactly 24 raw bytes
                merchant_key: MerchantKey::from_base64(&env::var("REDSYS_SECRET_KEY").map_err(
                    |_| AppError::Configuration("REDSYS_SECRET_KEY not set".to_string()),
                )?)?,
                environment,
                merchant_url: env::var("REDSYS_MERCHANT_URL").map_err(|_| {
                    AppError::Configuration("REDSYS_MERCHANT_URL not set".to_string())
                })?,
                url_ok: env::var("REDSYS_URL_OK")
                    .map_err(|_| AppError::Configuration("REDSYS_URL_OK not set".to_string()))?,
                url_ko: env::var("REDSYS_URL_KO")
                    .map_err(|_| AppError::Configuration("REDSYS_URL_KO not set".to_string()))?,
            },
            mailer: MailerConfig {
                api_url: env::var("MAILER_API_URL")
                    .map_err(|_| AppError::Configuration("MAILER_API_URL not set".to_string()))?,
                api_key: env::var("MAILER_API_KEY")
                    .map_err(|_| AppError::Configuration("MAILER_API_KEY not set".to_string()))?,
                from_address: env::var("MAILER_FROM_ADDRESS")
                    .unwrap_or_else(|_| "noreply@courtpay.local".to_string()),
            },
            tokens: AccessTokenConfig {
                secret: env::var("ACCESS_TOKEN_SECRET").map_err(|_| {
                    AppError::Configuration("ACCESS_TOKEN_SECRET not set".to_string())
                })?,
                receipt_ttl_hours: env::var("RECEIPT_TOKEN_TTL_HOURS")
                    .unwrap_or_else(|_| "720".to_string())
                    .parse()
                    .map_err(|_| {
                        AppError::Configuration("Invalid RECEIPT_TOKEN_TTL_HOURS".to_string())
                    })?,
                pass_ttl_hours: env::var("PASS_TOKEN_TTL_HOURS")
                    .unwrap_or_else(|_| "48".to_string())
                    .parse()
                    .map_err(|_| {
                        AppError::Configuration("Invalid PASS_TOKEN_TTL_HOURS".to_string())
                    })?,
            },
        };

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.tokens.secret.len() < 16 {
            return Err(AppError::Configuration(
                "ACCESS_TOKEN_SECRET must be at least 16 characters".to_string(),
            ));
        }

        if self.tokens.receipt_ttl_hours <= 0 || self.tokens.pass_ttl_hours <= 0 {
            return Err(AppError::Configuration(
                "Token TTLs must be greater than 0".to_string(),
            ));
        }

        if self.redsys.merchant_code.trim().is_empty() {
            return Err(AppError::Configuration(
                "REDSYS_MERCHANT_CODE cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}
