//! Boat fleet monitor

use std::sync::Arc;

use boat_monitor::{
    config::AppConfig,
    dashboard::{load_registered_count, DashboardEvent, DashboardState, DashboardView},
    database::{Database, LocationStore},
    distress::{AlertSink, DistressMonitor, LogAlertSink},
    errors::MonitorError,
    models::{BoatId, Snapshot},
    poller::Poller,
    tracking::TrackFilter,
    weather::{ConfiguredLocation, WeatherClient},
};
use chrono::{Local, NaiveDate, Utc};
use tokio::{signal, sync::mpsc};
use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<(), MonitorError> {
    #[cfg(feature = "dotenv")]
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = AppConfig::load()?;
    config.validate()?;

    let store: Arc<dyn LocationStore> = Arc::new(Database::from_config(&config.database).await?);

    let poller = Poller::new(store.clone(), config.poller.discard_stale);
    let snapshots = poller.updates();
    let polling = poller.start(config.poller.interval_ms);

    let (events_tx, events_rx) = mpsc::channel(16);
    spawn_registered_count(store.clone(), events_tx.clone());
    if config.weather.enabled {
        spawn_weather(&config, events_tx)?;
    }
    if let Some((boat_id, day)) = config.tracking.selection()? {
        let mut track = TrackFilter::new(store, config.tracking.day_boundary);
        tokio::spawn(async move {
            load_track(&mut track, boat_id, day).await;
        });
    }

    tokio::select! {
        _ = run_dashboard(snapshots, events_rx, &config) => {
            info!("Dashboard loop completed");
        }
        _ = signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    polling.stop().await;
    Ok(())
}

fn spawn_registered_count(store: Arc<dyn LocationStore>, events: mpsc::Sender<DashboardEvent>) {
    tokio::spawn(async move {
        let count = load_registered_count(store.as_ref()).await;
        let _ = events.send(DashboardEvent::RegisteredCount(count)).await;
    });
}

fn spawn_weather(
    config: &AppConfig,
    events: mpsc::Sender<DashboardEvent>,
) -> Result<(), MonitorError> {
    let client = WeatherClient::new(&config.weather.base_url)?;
    let locator = ConfiguredLocation(config.weather.location()?);
    tokio::spawn(async move {
        if let Some(weather) = client.current_weather(&locator).await {
            let _ = events.send(DashboardEvent::Weather(weather)).await;
        }
    });
    Ok(())
}

async fn load_track(track: &mut TrackFilter, boat_id: BoatId, day: Option<NaiveDate>) {
    if track.select_by_id(&boat_id).await.is_none() {
        return;
    }
    if let Some((first, last)) = track.date_range() {
        info!(
            "Track covers {} to {}, available days: {:?}",
            first,
            last,
            track.available_dates()
        );
    }

    if let Some(day) = day {
        let points = track.filter_by_date(day).len();
        info!("Showing {} of {} points for {}", points, track.logs().len(), day);
    }
    if let Some(bounds) = track.bounds() {
        debug!(
            "Track bounds: south={}, west={}, north={}, east={}",
            bounds.south, bounds.west, bounds.north, bounds.east
        );
    }
    for point in track.filtered() {
        debug!(
            "{} lat={} lon={}",
            point.recorded_at.with_timezone(&Local),
            point.latitude,
            point.longitude
        );
    }
}

async fn run_dashboard(
    mut snapshots: mpsc::UnboundedReceiver<Arc<Snapshot>>,
    mut events: mpsc::Receiver<DashboardEvent>,
    config: &AppConfig,
) {
    let zone_radius_m = config.alerts.zone_radius_m;
    let mut monitor = DistressMonitor::new(config.alerts.notification, zone_radius_m);
    let mut sink = LogAlertSink::new();
    let mut state = DashboardState::new(Utc::now());
    let mut clock = tokio::time::interval(config.display.clock_interval_ms);

    loop {
        tokio::select! {
            snapshot = snapshots.recv() => {
                let Some(snapshot) = snapshot else {
                    break;
                };
                sink.apply_all(&monitor.observe(&snapshot));
                state.apply(DashboardEvent::Snapshot(snapshot));
                render(&DashboardView::project(&state, zone_radius_m));
            }
            Some(event) = events.recv() => {
                state.apply(event);
                render(&DashboardView::project(&state, zone_radius_m));
            }
            _ = clock.tick() => {
                state.apply(DashboardEvent::Tick(Utc::now()));
                debug!(
                    "{}",
                    state.now.with_timezone(&Local).format("%A, %B %e, %Y %H:%M:%S")
                );
            }
        }
    }
}

fn render(view: &DashboardView) {
    let cards = &view.cards;
    info!(
        registered = cards.registered_boats,
        active = cards.active_boats,
        distressed = cards.distressed_boats,
        banner = view.banner,
        "Dashboard updated"
    );
    if let Some(weather) = &cards.weather {
        info!(
            "Weather: {} °C, wind {} km/h, code {}, observed {}",
            weather.temperature, weather.windspeed, weather.weathercode, weather.time
        );
    }
    if view.is_empty() {
        info!("No boat locations found");
    }
    for row in &view.rows {
        debug!(
            "{:<12} {} ({}, {}) {}",
            row.registration_number,
            row.last_updated.with_timezone(&Local),
            row.position.latitude,
            row.position.longitude,
            row.status
        );
    }
    for zone in &view.zones {
        debug!(
            "Distress zone around {}: {} m",
            zone.registration_number, zone.radius_m
        );
    }
}
