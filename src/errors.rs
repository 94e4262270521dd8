//! Errors for the boat monitor
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Serialization error")]
    SerdeError(#[from] serde_json::Error),

    #[error("Configuration error")]
    ConfigError(#[from] config::ConfigError),

    #[error("Invalid configuration: {message}")]
    ConfigurationError { message: String },

    #[error("Invalid boat identifier")]
    InvalidBoatId(String),

    #[error("Invalid calendar day: {0}")]
    InvalidDate(String),

    #[error("Geolocation unavailable: {0}")]
    GeolocationUnavailable(String),

    #[error("Weather request failed")]
    WeatherRequest(#[from] reqwest::Error),

    #[error("Malformed weather payload: {0}")]
    WeatherPayload(String),

    #[error("Database connection error: {0}")]
    DatabaseConnectionError(String),

    #[error("Database migration error")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Database error")]
    DatabaseError(#[from] sqlx::Error),
}
