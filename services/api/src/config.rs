//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use axum::http::HeaderValue;
use std::net::SocketAddr;
use tracing::Level;

/// Gemini's OpenAI-compatible endpoint.
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub cors_origin: HeaderValue,
    pub gemini_api_key: String,
    pub gemini_api_base: String,
    pub gemini_model: String,
    /// Selects the quota-consuming health check.
    pub full_health_check: bool,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // --- Server Settings ---
        let bind_address = match var("BIND_ADDRESS") {
            Some(address) => address.parse::<SocketAddr>().map_err(|e| {
                ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
            })?,
            None => {
                let port_str = var("PORT").unwrap_or_else(|| "3000".to_string());
                let port = port_str.parse::<u16>().map_err(|_| {
                    ConfigError::InvalidValue(
                        "PORT".to_string(),
                        format!("'{}' is not a valid port", port_str),
                    )
                })?;
                SocketAddr::from(([0, 0, 0, 0], port))
            }
        };

        let log_level_str = var("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin_str =
            var("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:5173".to_string());
        let cors_origin = cors_origin_str.parse::<HeaderValue>().map_err(|e| {
            ConfigError::InvalidValue("CORS_ORIGIN".to_string(), e.to_string())
        })?;

        // --- Generation Service Settings ---
        let gemini_api_key = var("GEMINI_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingVar("GEMINI_API_KEY".to_string()))?;
        let gemini_api_base =
            var("GEMINI_API_BASE").unwrap_or_else(|| DEFAULT_GEMINI_API_BASE.to_string());
        let gemini_model = var("GEMINI_MODEL").unwrap_or_else(|| "gemini-2.5-pro".to_string());

        let full_health_check = match var("ENABLE_GEMINI_HEALTH") {
            None => false,
            Some(flag) => flag.parse::<bool>().map_err(|_| {
                ConfigError::InvalidValue(
                    "ENABLE_GEMINI_HEALTH".to_string(),
                    format!("'{}' is not true or false", flag),
                )
            })?,
        };

        Ok(Self {
            bind_address,
            log_level,
            cors_origin,
            gemini_api_key,
            gemini_api_base,
            gemini_model,
            full_health_check,
        })
    }
}
