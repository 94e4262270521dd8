// src/database/models.rs
use chrono::{DateTime, Utc};
use tracing::warn;

use crate::{
    errors::MonitorError,
    models::{BoatId, BoatIdentity, BoatSummary, BoatTrackPoint},
};

/// Convert fetched rows into domain models.
///
/// A row that fails validation is logged and skipped so the rest of the
/// result set still reaches the caller.
pub(crate) fn convert_rows<R, T>(rows: Vec<R>) -> Vec<T>
where
    T: TryFrom<R, Error = MonitorError>,
{
    rows.into_iter()
        .filter_map(|row| match T::try_from(row) {
            Ok(model) => Some(model),
            Err(e) => {
                warn!(error = ?e, "Skipping malformed row");
                None
            }
        })
        .collect()
}

/// `boat_current_location` joined with `boats_info`
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct CurrentLocationRow {
    pub boat_id: String,
    pub registration_number: Option<String>, // NULL when the registry has no row
    pub last_updated: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub is_distress: bool,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct TrackPointRow {
    pub latitude: f64,
    pub longitude: f64,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct BoatInfoRow {
    pub boat_id: String,
    pub boat_name: String,
    pub registration_number: String,
}

impl TryFrom<CurrentLocationRow> for BoatSummary {
    type Error = MonitorError;

    fn try_from(row: CurrentLocationRow) -> Result<Self, Self::Error> {
        Ok(BoatSummary {
            id: BoatId::try_from(row.boat_id)?,
            registration_number: row.registration_number.unwrap_or_default(),
            last_updated: row.last_updated,
            latitude: row.latitude,
            longitude: row.longitude,
            is_distress: row.is_distress,
        })
    }
}

impl From<TrackPointRow> for BoatTrackPoint {
    fn from(row: TrackPointRow) -> Self {
        BoatTrackPoint {
            latitude: row.latitude,
            longitude: row.longitude,
            recorded_at: row.recorded_at,
        }
    }
}

impl TryFrom<BoatInfoRow> for BoatIdentity {
    type Error = MonitorError;

    fn try_from(row: BoatInfoRow) -> Result<Self, Self::Error> {
        Ok(BoatIdentity {
            id: BoatId::try_from(row.boat_id)?,
            name: row.boat_name,
            registration_number: row.registration_number,
        })
    }
}
