//! Historical track of a single boat, with calendar-day filtering

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, error, info, warn};

use crate::{
    database::LocationStore,
    errors::MonitorError,
    models::{parse_calendar_day, BoatId, BoatIdentity, BoatTrackPoint, DayBoundary},
};

/// Bounding box of a set of track points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

/// Full log of the selected boat and the subset currently displayed
///
/// The displayed subset keeps the order of the fetched log; nothing is re-sorted.
pub struct TrackFilter {
    store: Arc<dyn LocationStore>,
    day_boundary: DayBoundary,
    boat: Option<BoatIdentity>,
    logs: Vec<BoatTrackPoint>,
    filtered: Vec<BoatTrackPoint>,
    selected_day: Option<NaiveDate>,
}

impl TrackFilter {
    pub fn new(store: Arc<dyn LocationStore>, day_boundary: DayBoundary) -> Self {
        Self {
            store,
            day_boundary,
            boat: None,
            logs: Vec::new(),
            filtered: Vec::new(),
            selected_day: None,
        }
    }

    /// Load the full history of `boat`, replacing whatever was selected before
    ///
    /// A failed query leaves an empty track. Returns the number of points loaded.
    pub async fn select_boat(&mut self, boat: BoatIdentity) -> usize {
        self.logs.clear();
        self.filtered.clear();
        self.selected_day = None;

        let logs = match self.store.fetch_logs_for_boat(&boat.id).await {
            Ok(logs) => logs,
            Err(e) => {
                error!(boat_id = %boat.id, error = %e, "Error fetching logs");
                Vec::new()
            }
        };

        if logs.is_empty() {
            info!("No logs found for boat {}", boat.id);
        } else {
            debug!("Fetched {} logs for boat {}", logs.len(), boat.id);
        }

        self.filtered = logs.clone();
        self.logs = logs;
        self.boat = Some(boat);
        self.logs.len()
    }

    /// Look `id` up in the boat registry and load its history
    ///
    /// Returns None, leaving the current selection untouched, when the registry
    /// cannot be read or has no such boat.
    pub async fn select_by_id(&mut self, id: &BoatId) -> Option<usize> {
        let registry = match self.store.fetch_boat_registry().await {
            Ok(registry) => registry,
            Err(e) => {
                error!(error = %e, "Error fetching boats");
                return None;
            }
        };
        let Some(boat) = registry.into_iter().find(|boat| &boat.id == id) else {
            warn!("Boat {} is not in the registry", id);
            return None;
        };

        info!("Tracking {} ({})", boat.name, boat.registration_number);
        Some(self.select_boat(boat).await)
    }

    /// Show only the points recorded on `day`
    pub fn filter_by_date(&mut self, day: NaiveDate) -> &[BoatTrackPoint] {
        let boundary = self.day_boundary;
        self.filtered = self
            .logs
            .iter()
            .filter(|point| boundary.calendar_day(&point.recorded_at) == day)
            .cloned()
            .collect();
        self.selected_day = Some(day);
        &self.filtered
    }

    /// Filter by a `YYYY-MM-DD` string; an empty string shows every day
    pub fn filter_by_date_str(&mut self, day: &str) -> Result<&[BoatTrackPoint], MonitorError> {
        if day.trim().is_empty() {
            return Ok(self.clear_filter());
        }
        let day = parse_calendar_day(day)?;
        Ok(self.filter_by_date(day))
    }

    pub fn clear_filter(&mut self) -> &[BoatTrackPoint] {
        self.selected_day = None;
        self.filtered = self.logs.clone();
        &self.filtered
    }

    pub fn boat(&self) -> Option<&BoatIdentity> {
        self.boat.as_ref()
    }

    pub fn logs(&self) -> &[BoatTrackPoint] {
        &self.logs
    }

    pub fn filtered(&self) -> &[BoatTrackPoint] {
        &self.filtered
    }

    pub fn selected_day(&self) -> Option<NaiveDate> {
        self.selected_day
    }

    /// Distinct calendar days present in the full log, ascending
    pub fn available_dates(&self) -> Vec<NaiveDate> {
        self.logs
            .iter()
            .map(|point| self.day_boundary.calendar_day(&point.recorded_at))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// First and last calendar day of the full log
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.logs.iter().map(|p| p.recorded_at).min()?;
        let last = self.logs.iter().map(|p| p.recorded_at).max()?;
        Some((
            self.day_boundary.calendar_day(&first),
            self.day_boundary.calendar_day(&last),
        ))
    }

    /// Bounding box of the displayed points, for fitting the map view
    pub fn bounds(&self) -> Option<TrackBounds> {
        let (first, rest) = self.filtered.split_first()?;
        let init = TrackBounds {
            south: first.latitude,
            west: first.longitude,
            north: first.latitude,
            east: first.longitude,
        };
        Some(rest.iter().fold(init, |b, p| TrackBounds {
            south: b.south.min(p.latitude),
            west: b.west.min(p.longitude),
            north: b.north.max(p.latitude),
            east: b.east.max(p.longitude),
        }))
    }
}
