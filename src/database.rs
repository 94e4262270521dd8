// src/database.rs
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{debug, error, info};

use crate::{
    config::DatabaseConfig,
    errors::MonitorError,
    models::{BoatId, BoatIdentity, BoatSummary, BoatTrackPoint},
};

mod models;

#[cfg(test)]
pub(crate) mod fake;

use models::{convert_rows, BoatInfoRow, CurrentLocationRow, TrackPointRow};

/// Read-only queries against the boat-state store
#[async_trait]
pub trait LocationStore: Send + Sync {
    /// Current state of every boat, most recently updated first
    async fn fetch_current_locations(&self) -> Result<Vec<BoatSummary>, MonitorError>;

    /// Number of boats in the registry
    async fn fetch_boat_count(&self) -> Result<u64, MonitorError>;

    /// All registered boats
    async fn fetch_boat_registry(&self) -> Result<Vec<BoatIdentity>, MonitorError>;

    /// Full location history of one boat, ascending by `recorded_at`
    async fn fetch_logs_for_boat(&self, id: &BoatId) -> Result<Vec<BoatTrackPoint>, MonitorError>;
}

/// PostgreSQL-backed location store
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a store on top of an existing pool
    pub async fn new(pool: PgPool) -> Result<Self, MonitorError> {
        Ok(Self { pool })
    }

    /// Connect a new pool according to configuration
    pub async fn from_config(config: &DatabaseConfig) -> Result<Self, MonitorError> {
        config.validate()?;
        info!(
            "Connecting to database: max_connections={}",
            config.max_connections
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await
            .map_err(|e| {
                error!("Failed to connect to database: {}", e);
                MonitorError::DatabaseConnectionError(e.to_string())
            })?;

        let db = Self::new(pool).await?;
        if config.run_migrations {
            db.migrate().await?;
        }
        Ok(db)
    }

    /// Apply the bundled schema migrations
    pub async fn migrate(&self) -> Result<(), MonitorError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl LocationStore for Database {
    async fn fetch_current_locations(&self) -> Result<Vec<BoatSummary>, MonitorError> {
        let rows: Vec<CurrentLocationRow> = sqlx::query_as(
            "SELECT l.boat_id, b.registration_number, l.last_updated,
                    l.latitude, l.longitude, l.is_distress
             FROM boat_current_location l
             LEFT JOIN boats_info b ON b.boat_id = l.boat_id
             ORDER BY l.last_updated DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        debug!("Fetched {} current locations", rows.len());
        Ok(convert_rows(rows))
    }

    async fn fetch_boat_count(&self) -> Result<u64, MonitorError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM boats_info")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn fetch_boat_registry(&self) -> Result<Vec<BoatIdentity>, MonitorError> {
        let rows: Vec<BoatInfoRow> = sqlx::query_as(
            "SELECT boat_id, boat_name, registration_number
             FROM boats_info
             ORDER BY boat_name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(convert_rows(rows))
    }

    async fn fetch_logs_for_boat(&self, id: &BoatId) -> Result<Vec<BoatTrackPoint>, MonitorError> {
        let rows: Vec<TrackPointRow> = sqlx::query_as(
            "SELECT latitude, longitude, recorded_at
             FROM boat_location_logs
             WHERE boat_id = $1
             ORDER BY recorded_at ASC",
        )
        .bind(id.as_str())
        .fetch_all(&self.pool)
        .await?;

        debug!("Fetched {} log rows for boat {}", rows.len(), id);
        Ok(rows.into_iter().map(BoatTrackPoint::from).collect())
    }
}
