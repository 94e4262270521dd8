//! Data models.

use std::fmt;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::MonitorError;
use serde_helpers::*;

/// Boat identifier as issued by the boat registry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BoatId(String);

impl TryFrom<String> for BoatId {
    type Error = MonitorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(MonitorError::InvalidBoatId(value));
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl TryFrom<&str> for BoatId {
    type Error = MonitorError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::try_from(value.to_string())
    }
}

impl From<BoatId> for String {
    fn from(value: BoatId) -> Self {
        value.0
    }
}

impl BoatId {
    /// Get the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BoatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// WGS84 position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl TryFrom<(f64, f64)> for Coordinates {
    type Error = MonitorError;

    fn try_from((latitude, longitude): (f64, f64)) -> Result<Self, Self::Error> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(MonitorError::ConfigurationError {
                message: format!("Coordinates out of range: ({latitude}, {longitude})"),
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// Current known state of one boat
///
/// Rows are replaced wholesale on every poll, never merged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoatSummary {
    pub id: BoatId,
    /// Display label joined from the boat registry, empty if the boat is not registered
    pub registration_number: String,
    pub last_updated: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    /// Boat requires emergency attention
    pub is_distress: bool,
}

impl BoatSummary {
    pub fn position(&self) -> Coordinates {
        Coordinates {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// One historical position sample of a boat
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoatTrackPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub recorded_at: DateTime<Utc>,
}

/// Static registry entry of a boat
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoatIdentity {
    pub id: BoatId,
    pub name: String,
    pub registration_number: String,
}

/// Current weather at the viewer's location
///
/// See: https://open-meteo.com/en/docs, `current_weather` object
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WeatherSnapshot {
    /// Air temperature at 2 m, degrees Celsius
    pub temperature: f64,
    /// Wind speed at 10 m, km/h
    pub windspeed: f64,
    /// WMO weather interpretation code
    pub weathercode: u16,
    /// Observation time in the provider's ISO minute format
    #[serde(deserialize_with = "deserialize_observation_time")]
    pub time: NaiveDateTime,
}

/// Full set of current boat states as of one poll
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Issue sequence number of the fetch that produced this snapshot, 0 before the first poll
    pub sequence: u64,
    pub boats: Vec<BoatSummary>,
}

impl Snapshot {
    pub fn new(sequence: u64, boats: Vec<BoatSummary>) -> Self {
        Self { sequence, boats }
    }

    /// True if any boat in the snapshot has its distress flag set
    pub fn is_distressed(&self) -> bool {
        self.boats.iter().any(|boat| boat.is_distress)
    }

    /// Distressed boats, in snapshot order
    pub fn distressed(&self) -> impl Iterator<Item = &BoatSummary> {
        self.boats.iter().filter(|boat| boat.is_distress)
    }
}

/// Time zone in which a timestamp is converted to a calendar day
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayBoundary {
    /// Viewer-local time zone of the running process
    #[default]
    Local,
    Utc,
    /// Fixed offset east of UTC, in seconds
    FixedOffset(i32),
}

impl DayBoundary {
    pub fn calendar_day(&self, timestamp: &DateTime<Utc>) -> NaiveDate {
        match self {
            DayBoundary::Local => calendar_day_in(timestamp, &Local),
            DayBoundary::Utc => calendar_day_in(timestamp, &Utc),
            DayBoundary::FixedOffset(seconds) => match FixedOffset::east_opt(*seconds) {
                Some(offset) => calendar_day_in(timestamp, &offset),
                None => calendar_day_in(timestamp, &Utc),
            },
        }
    }

    pub fn validate(&self) -> Result<(), MonitorError> {
        if let DayBoundary::FixedOffset(seconds) = self {
            if FixedOffset::east_opt(*seconds).is_none() {
                return Err(MonitorError::ConfigurationError {
                    message: format!("Day boundary offset out of range: {seconds} s"),
                });
            }
        }
        Ok(())
    }
}

fn calendar_day_in<Tz: TimeZone>(timestamp: &DateTime<Utc>, tz: &Tz) -> NaiveDate {
    timestamp.with_timezone(tz).date_naive()
}

/// Parse a calendar day in `YYYY-MM-DD` form
pub fn parse_calendar_day(value: &str) -> Result<NaiveDate, MonitorError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| MonitorError::InvalidDate(value.to_string()))
}

/// Custom deserializers
mod serde_helpers {
    use chrono::NaiveDateTime;
    use serde::{self, de::Error, Deserialize, Deserializer};

    pub fn deserialize_observation_time<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M")
            .or_else(|_| NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S"))
            .map_err(|_| D::Error::custom(format!("invalid observation time: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    fn boat(id: &str, is_distress: bool) -> BoatSummary {
        BoatSummary {
            id: BoatId::try_from(id).unwrap(),
            registration_number: format!("REG-{id}"),
            last_updated: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
            latitude: 13.7563,
            longitude: 121.0583,
            is_distress,
        }
    }

    #[test]
    fn boat_id_rejects_blank() {
        assert!(BoatId::try_from("   ").is_err());
        assert_eq!(BoatId::try_from(" boat-7 ").unwrap().as_str(), "boat-7");
    }

    #[test]
    fn coordinates_range() {
        assert!(Coordinates::try_from((60.19, 24.94)).is_ok());
        assert!(Coordinates::try_from((91.0, 0.0)).is_err());
        assert!(Coordinates::try_from((0.0, -180.5)).is_err());
    }

    #[test]
    fn snapshot_distress() {
        let calm = Snapshot::new(1, vec![boat("1", false), boat("2", false)]);
        assert!(!calm.is_distressed());
        assert_eq!(calm.distressed().count(), 0);

        let alarm = Snapshot::new(2, vec![boat("1", false), boat("2", true), boat("3", true)]);
        assert!(alarm.is_distressed());
        let ids: Vec<&str> = alarm.distressed().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3"]);

        assert!(!Snapshot::default().is_distressed());
    }

    #[test]
    fn parse_weather() {
        let s = r#"{
            "temperature": 28.4,
            "windspeed": 11.2,
            "winddirection": 95,
            "weathercode": 3,
            "is_day": 1,
            "time": "2024-01-01T12:15"
        }"#;
        let weather: WeatherSnapshot = serde_json::from_str(s).unwrap();
        assert_eq!(weather.temperature, 28.4);
        assert_eq!(weather.windspeed, 11.2);
        assert_eq!(weather.weathercode, 3);
        assert_eq!(weather.time.hour(), 12);
        assert_eq!(weather.time.minute(), 15);
    }

    #[test]
    fn parse_weather_bad_time() {
        let s = r#"{"temperature": 1.0, "windspeed": 2.0, "weathercode": 0, "time": "noon"}"#;
        assert!(serde_json::from_str::<WeatherSnapshot>(s).is_err());
    }

    #[test]
    fn calendar_day_depends_on_boundary() {
        let late = Utc.with_ymd_and_hms(2024, 1, 1, 23, 30, 0).unwrap();
        assert_eq!(
            DayBoundary::Utc.calendar_day(&late),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
        // UTC+02:00
        assert_eq!(
            DayBoundary::FixedOffset(7200).calendar_day(&late),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
        );

        let early = Utc.with_ymd_and_hms(2024, 1, 2, 0, 30, 0).unwrap();
        // UTC-05:00
        assert_eq!(
            DayBoundary::FixedOffset(-5 * 3600).calendar_day(&early),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
    }

    #[test]
    fn day_boundary_offset_range() {
        assert!(DayBoundary::FixedOffset(8 * 3600).validate().is_ok());
        assert!(DayBoundary::FixedOffset(86_400).validate().is_err());
        assert!(DayBoundary::Local.validate().is_ok());
    }

    #[test]
    fn parse_day_boundary() {
        let boundary: DayBoundary = serde_json::from_str(r#"{"fixed_offset": -18000}"#).unwrap();
        assert_eq!(boundary, DayBoundary::FixedOffset(-18000));
        let boundary: DayBoundary = serde_json::from_str(r#""utc""#).unwrap();
        assert_eq!(boundary, DayBoundary::Utc);
    }

    #[test]
    fn parse_day() {
        assert_eq!(
            parse_calendar_day("2024-01-02").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
        );
        assert!(parse_calendar_day("01/02/2024").is_err());
        assert!(parse_calendar_day("").is_err());
    }
}
