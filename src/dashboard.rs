//! Dashboard state and its projection into map, table and summary cards

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::error;

use crate::{
    database::LocationStore,
    distress::{distress_zones, DistressZone},
    models::{BoatId, BoatSummary, Coordinates, Snapshot, WeatherSnapshot},
};

/// Everything the dashboard shows, owned in one place
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub registered_boats: u64,
    pub snapshot: Arc<Snapshot>,
    pub weather: Option<WeatherSnapshot>,
    pub now: DateTime<Utc>,
}

/// Input that changes the dashboard state
#[derive(Debug, Clone)]
pub enum DashboardEvent {
    Snapshot(Arc<Snapshot>),
    RegisteredCount(u64),
    Weather(WeatherSnapshot),
    Tick(DateTime<Utc>),
}

impl DashboardState {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            registered_boats: 0,
            snapshot: Arc::new(Snapshot::default()),
            weather: None,
            now,
        }
    }

    pub fn apply(&mut self, event: DashboardEvent) {
        match event {
            DashboardEvent::Snapshot(snapshot) => self.snapshot = snapshot,
            DashboardEvent::RegisteredCount(count) => self.registered_boats = count,
            DashboardEvent::Weather(weather) => self.weather = Some(weather),
            DashboardEvent::Tick(now) => self.now = now,
        }
    }

    /// No poll result has landed yet
    pub fn is_loading(&self) -> bool {
        self.snapshot.sequence == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoatStatus {
    Normal,
    Emergency,
}

impl From<&BoatSummary> for BoatStatus {
    fn from(boat: &BoatSummary) -> Self {
        if boat.is_distress {
            BoatStatus::Emergency
        } else {
            BoatStatus::Normal
        }
    }
}

impl fmt::Display for BoatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoatStatus::Normal => f.write_str("NORMAL"),
            BoatStatus::Emergency => f.write_str("EMERGENCY"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryCards {
    pub registered_boats: u64,
    pub active_boats: usize,
    pub distressed_boats: usize,
    pub clock: DateTime<Utc>,
    pub weather: Option<WeatherSnapshot>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapMarker {
    pub boat_id: BoatId,
    pub label: String,
    pub position: Coordinates,
    pub status: BoatStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub registration_number: String,
    pub last_updated: DateTime<Utc>,
    pub position: Coordinates,
    pub status: BoatStatus,
}

/// Derived view of a [`DashboardState`]; holds no state of its own
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub cards: SummaryCards,
    pub markers: Vec<MapMarker>,
    pub zones: Vec<DistressZone>,
    pub rows: Vec<TableRow>,
    pub banner: bool,
    pub loading: bool,
}

impl DashboardView {
    pub fn project(state: &DashboardState, zone_radius_m: f64) -> Self {
        let boats = &state.snapshot.boats;

        let markers = boats
            .iter()
            .map(|boat| MapMarker {
                boat_id: boat.id.clone(),
                label: boat.registration_number.clone(),
                position: boat.position(),
                status: boat.into(),
            })
            .collect();

        let rows = boats
            .iter()
            .map(|boat| TableRow {
                registration_number: boat.registration_number.clone(),
                last_updated: boat.last_updated,
                position: boat.position(),
                status: boat.into(),
            })
            .collect();

        let zones = distress_zones(&state.snapshot, zone_radius_m);

        Self {
            cards: SummaryCards {
                registered_boats: state.registered_boats,
                active_boats: boats.len(),
                distressed_boats: zones.len(),
                clock: state.now,
                weather: state.weather.clone(),
            },
            markers,
            banner: !zones.is_empty(),
            zones,
            rows,
            loading: state.is_loading(),
        }
    }

    /// The table shows "no data found" instead of rows
    pub fn is_empty(&self) -> bool {
        !self.loading && self.rows.is_empty()
    }
}

/// Registered-boat count for the summary card, 0 when the query fails
pub async fn load_registered_count(store: &dyn LocationStore) -> u64 {
    match store.fetch_boat_count().await {
        Ok(count) => count,
        Err(e) => {
            error!(error = %e, "Error fetching registered boats");
            0
        }
    }
}
