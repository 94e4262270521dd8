// src/database/fake.rs
//! In-memory location store for unit tests
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::LocationStore;
use crate::{
    errors::MonitorError,
    models::{BoatId, BoatIdentity, BoatSummary, BoatTrackPoint},
};

/// One scripted answer to `fetch_current_locations`
pub(crate) struct Scripted {
    pub delay: Duration,
    pub result: Option<Vec<BoatSummary>>,
}

#[derive(Default)]
pub(crate) struct FakeStore {
    scripted: Mutex<VecDeque<Scripted>>,
    fallback: Vec<BoatSummary>,
    logs: HashMap<BoatId, Vec<BoatTrackPoint>>,
    failing_logs: bool,
    count: Option<u64>,
    registry: Vec<BoatIdentity>,
    location_calls: AtomicUsize,
    log_calls: AtomicUsize,
}

fn unreachable_store() -> MonitorError {
    MonitorError::DatabaseConnectionError("store unreachable".to_string())
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an answer; `None` makes that fetch fail
    pub fn script(self, delay: Duration, result: Option<Vec<BoatSummary>>) -> Self {
        self.scripted
            .lock()
            .unwrap()
            .push_back(Scripted { delay, result });
        self
    }

    /// Answer given once the script runs out
    pub fn fallback(mut self, boats: Vec<BoatSummary>) -> Self {
        self.fallback = boats;
        self
    }

    pub fn logs(mut self, id: &str, points: Vec<BoatTrackPoint>) -> Self {
        self.logs.insert(BoatId::try_from(id).unwrap(), points);
        self
    }

    pub fn failing_logs(mut self) -> Self {
        self.failing_logs = true;
        self
    }

    pub fn count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    pub fn registry(mut self, boats: Vec<BoatIdentity>) -> Self {
        self.registry = boats;
        self
    }

    pub fn location_calls(&self) -> usize {
        self.location_calls.load(Ordering::SeqCst)
    }

    pub fn log_calls(&self) -> usize {
        self.log_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocationStore for FakeStore {
    async fn fetch_current_locations(&self) -> Result<Vec<BoatSummary>, MonitorError> {
        self.location_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.scripted.lock().unwrap().pop_front();
        match next {
            Some(Scripted { delay, result }) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                result.ok_or_else(unreachable_store)
            }
            None => Ok(self.fallback.clone()),
        }
    }

    async fn fetch_boat_count(&self) -> Result<u64, MonitorError> {
        self.count.ok_or_else(unreachable_store)
    }

    async fn fetch_boat_registry(&self) -> Result<Vec<BoatIdentity>, MonitorError> {
        Ok(self.registry.clone())
    }

    async fn fetch_logs_for_boat(&self, id: &BoatId) -> Result<Vec<BoatTrackPoint>, MonitorError> {
        self.log_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_logs {
            return Err(unreachable_store());
        }
        Ok(self.logs.get(id).cloned().unwrap_or_default())
    }
}
