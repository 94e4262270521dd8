//! Fixed-interval boat-state poller

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::{database::LocationStore, models::Snapshot};

/// Single-slot holder of the current snapshot
///
/// Every replacement is published to subscribers as one value, so readers
/// never observe a partially written snapshot. `subscribe` yields only the
/// latest value; `updates` yields every replacement in the order applied.
pub struct SnapshotCell {
    tx: watch::Sender<Arc<Snapshot>>,
    observers: Mutex<Vec<mpsc::UnboundedSender<Arc<Snapshot>>>>,
    discard_stale: bool,
}

impl SnapshotCell {
    pub fn new(discard_stale: bool) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(Snapshot::default()));
        Self {
            tx,
            observers: Mutex::new(Vec::new()),
            discard_stale,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.tx.subscribe()
    }

    /// Receive every accepted replacement, none are merged
    pub fn updates(&self) -> mpsc::UnboundedReceiver<Arc<Snapshot>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    pub fn current(&self) -> Arc<Snapshot> {
        self.tx.borrow().clone()
    }

    /// Replace the current snapshot, returns false if the result was stale and dropped
    ///
    /// With `discard_stale` off the last completed fetch wins regardless of
    /// the order in which fetches were issued.
    pub fn apply(&self, snapshot: Snapshot) -> bool {
        let discard_stale = self.discard_stale;
        self.tx.send_if_modified(|current| {
            if discard_stale && snapshot.sequence < current.sequence {
                return false;
            }
            let snapshot = Arc::new(snapshot);
            *current = snapshot.clone();
            // still under the cell's write lock, so observers see apply order
            self.observers
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|observer| observer.send(snapshot.clone()).is_ok());
            true
        })
    }
}

/// Periodically refreshes the boat-state snapshot from the store
pub struct Poller {
    store: Arc<dyn LocationStore>,
    cell: Arc<SnapshotCell>,
    issued: Arc<AtomicU64>,
}

/// Running poll loop; dropping it leaves the loop running until the runtime stops
pub struct PollerHandle {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Poller {
    pub fn new(store: Arc<dyn LocationStore>, discard_stale: bool) -> Self {
        Self {
            store,
            cell: Arc::new(SnapshotCell::new(discard_stale)),
            issued: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Observe the latest snapshot
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.cell.subscribe()
    }

    /// Observe every snapshot replacement in order
    pub fn updates(&self) -> mpsc::UnboundedReceiver<Arc<Snapshot>> {
        self.cell.updates()
    }

    pub fn current(&self) -> Arc<Snapshot> {
        self.cell.current()
    }

    /// Issue one fetch without waiting for it
    ///
    /// The returned task resolves to whether the result replaced the snapshot.
    pub fn issue(&self) -> JoinHandle<bool> {
        let sequence = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::spawn(Self::poll_once(
            self.store.clone(),
            self.cell.clone(),
            sequence,
        ))
    }

    /// Fetch immediately, then every `interval` until stopped
    ///
    /// Ticks are fixed to the wall clock: a slow fetch never delays the next one.
    pub fn start(&self, interval: Duration) -> PollerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let poller = Poller {
            store: self.store.clone(),
            cell: self.cell.clone(),
            issued: self.issued.clone(),
        };

        info!("Starting boat-state polling every {:?}", interval);
        let handle = tokio::spawn(async move {
            poller.poll_loop(interval, shutdown_rx).await;
        });

        PollerHandle {
            shutdown_tx,
            handle,
        }
    }

    async fn poll_loop(self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    // In-flight fetches are never awaited or cancelled here
                    let _ = self.issue();
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        debug!("Poll loop shutdown");
                        break;
                    }
                }
            }
        }
    }

    async fn poll_once(
        store: Arc<dyn LocationStore>,
        cell: Arc<SnapshotCell>,
        sequence: u64,
    ) -> bool {
        let boats = match store.fetch_current_locations().await {
            Ok(boats) => boats,
            Err(e) => {
                error!(sequence, error = %e, "Error fetching boat locations");
                Vec::new()
            }
        };

        let applied = cell.apply(Snapshot::new(sequence, boats));
        if !applied {
            debug!(sequence, "Discarding stale poll result");
        }
        applied
    }
}

impl PollerHandle {
    /// Stop issuing new fetches and wait for the loop to exit
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.handle.await {
            error!("Poll loop terminated abnormally: {}", e);
        }
    }
}
