//! Application configuration

use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_with::serde_as;

use crate::distress::NotificationPolicy;
use crate::errors::MonitorError;
use crate::models::{parse_calendar_day, BoatId, Coordinates, DayBoundary};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub poller: PollerConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub alerts: AlertConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default)]
    pub run_migrations: bool,
}

fn default_max_connections() -> u32 {
    5
}

#[serde_as]
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PollerConfig {
    /// Fixed wall-clock interval between boat-state fetches
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    pub interval_ms: Duration,
    /// Drop fetch results that complete after a later-issued fetch has been applied
    pub discard_stale: bool,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_ms: Duration::from_millis(5000),
            discard_stale: true,
        }
    }
}

#[serde_as]
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DisplayConfig {
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    pub clock_interval_ms: Duration,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            clock_interval_ms: Duration::from_millis(1000),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AlertConfig {
    pub notification: NotificationPolicy,
    /// Radius of the highlighted overlay around a distressed boat, meters
    pub zone_radius_m: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            notification: NotificationPolicy::default(),
            zone_radius_m: 1000.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct WeatherConfig {
    pub enabled: bool,
    pub base_url: String,
    /// Viewer position; leaving either unset means geolocation is unavailable
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.open-meteo.com".to_string(),
            latitude: None,
            longitude: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct TrackingConfig {
    pub day_boundary: DayBoundary,
    /// Boat whose track is loaded at start-up
    pub boat_id: Option<String>,
    /// Calendar day (`YYYY-MM-DD`) applied to the start-up track
    pub day: Option<String>,
}

impl AppConfig {
    /// Load from `config/default` (optional) and `BOATMON__*` environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(
                Environment::with_prefix("BOATMON")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Load from a single configuration file, format inferred from the extension
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize()
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), MonitorError> {
        self.database.validate()?;
        self.poller.validate()?;
        self.display.validate()?;
        self.alerts.validate()?;
        self.weather.location()?;
        self.tracking.day_boundary.validate()?;
        self.tracking.selection()?;
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> MonitorError {
    MonitorError::ConfigurationError {
        message: message.into(),
    }
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.url.trim().is_empty() {
            return Err(invalid("Database URL cannot be empty"));
        }
        if self.max_connections == 0 {
            return Err(invalid("Database pool needs at least one connection"));
        }
        Ok(())
    }
}

impl PollerConfig {
    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.interval_ms.is_zero() {
            return Err(invalid("Poll interval must be greater than zero"));
        }
        Ok(())
    }
}

impl DisplayConfig {
    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.clock_interval_ms.is_zero() {
            return Err(invalid("Clock interval must be greater than zero"));
        }
        Ok(())
    }
}

impl AlertConfig {
    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.zone_radius_m.is_nan() || self.zone_radius_m <= 0.0 {
            return Err(invalid("Distress zone radius must be positive"));
        }
        Ok(())
    }
}

impl WeatherConfig {
    /// Configured viewer position, None when not (fully) set
    pub fn location(&self) -> Result<Option<Coordinates>, MonitorError> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Coordinates::try_from((lat, lon)).map(Some),
            (None, None) => Ok(None),
            _ => Err(invalid(
                "Weather latitude and longitude must be set together",
            )),
        }
    }
}

impl TrackingConfig {
    /// Start-up track selection: boat and optional day
    pub fn selection(&self) -> Result<Option<(BoatId, Option<chrono::NaiveDate>)>, MonitorError> {
        let Some(boat_id) = &self.boat_id else {
            if self.day.is_some() {
                return Err(invalid("Tracking day requires a tracking boat_id"));
            }
            return Ok(None);
        };
        let boat_id = BoatId::try_from(boat_id.as_str())?;
        let day = self.day.as_deref().map(parse_calendar_day).transpose()?;
        Ok(Some((boat_id, day)))
    }
}
