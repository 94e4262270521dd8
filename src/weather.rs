//! One-shot weather lookup for the viewer's position

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::{
    errors::MonitorError,
    models::{Coordinates, WeatherSnapshot},
};

/// Source of the viewer's current position
#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn current_position(&self) -> Result<Coordinates, MonitorError>;
}

/// Position taken from configuration; `None` behaves like denied geolocation
#[derive(Debug, Clone, Copy)]
pub struct ConfiguredLocation(pub Option<Coordinates>);

#[async_trait]
impl Geolocator for ConfiguredLocation {
    async fn current_position(&self) -> Result<Coordinates, MonitorError> {
        self.0.ok_or_else(|| {
            MonitorError::GeolocationUnavailable("no position configured".to_string())
        })
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current_weather: Option<WeatherSnapshot>,
}

/// Client for an Open-Meteo compatible forecast endpoint
pub struct WeatherClient {
    client: Client,
    base_url: String,
}

impl WeatherClient {
    pub fn new(base_url: &str) -> Result<Self, MonitorError> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn forecast_url(&self) -> String {
        format!("{}/v1/forecast", self.base_url)
    }

    /// Fetch current weather at `position`
    pub async fn fetch(&self, position: Coordinates) -> Result<WeatherSnapshot, MonitorError> {
        let response = self
            .client
            .get(self.forecast_url())
            .query(&[
                ("latitude", position.latitude.to_string()),
                ("longitude", position.longitude.to_string()),
                ("current_weather", "true".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MonitorError::WeatherPayload(format!(
                "weather service answered {status}"
            )));
        }

        let body = response.text().await?;
        parse_forecast(&body)
    }

    /// Resolve the position and fetch its weather once
    ///
    /// Every failure is logged and yields `None`; nothing is retried.
    pub async fn current_weather(&self, locator: &dyn Geolocator) -> Option<WeatherSnapshot> {
        let position = match locator.current_position().await {
            Ok(position) => position,
            Err(e) => {
                warn!(error = %e, "Geolocation unavailable, skipping weather");
                return None;
            }
        };

        match self.fetch(position).await {
            Ok(weather) => {
                info!(
                    temperature = weather.temperature,
                    windspeed = weather.windspeed,
                    weathercode = weather.weathercode,
                    "Fetched current weather"
                );
                Some(weather)
            }
            Err(e) => {
                error!(error = %e, "Error fetching weather");
                None
            }
        }
    }
}

fn parse_forecast(body: &str) -> Result<WeatherSnapshot, MonitorError> {
    let forecast: ForecastResponse = serde_json::from_str(body)?;
    forecast
        .current_weather
        .ok_or_else(|| MonitorError::WeatherPayload("missing current_weather".to_string()))
}
