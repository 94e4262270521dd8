//! Distress detection and alert side effects

use std::fmt;

use serde::Deserialize;
use tracing::{error, info, warn};

use crate::models::{BoatId, BoatSummary, Coordinates, Snapshot};

/// When the one-time emergency notification is raised
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPolicy {
    /// Once, when the fleet goes from no distress to distress
    #[default]
    OnTransition,
    /// On every snapshot that contains a distressed boat
    EveryUpdate,
}

/// Highlighted radius overlay around a distressed boat
#[derive(Debug, Clone, PartialEq)]
pub struct DistressZone {
    pub boat_id: BoatId,
    pub registration_number: String,
    pub center: Coordinates,
    pub radius_m: f64,
}

/// Emergency notification naming a distressed boat
#[derive(Debug, Clone, PartialEq)]
pub struct DistressNotice {
    pub boat_id: BoatId,
    pub registration_number: String,
    pub position: Coordinates,
}

impl From<&BoatSummary> for DistressNotice {
    fn from(boat: &BoatSummary) -> Self {
        Self {
            boat_id: boat.id.clone(),
            registration_number: boat.registration_number.clone(),
            position: boat.position(),
        }
    }
}

impl fmt::Display for DistressNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EMERGENCY! Boat {} reported distress at ({}, {})",
            self.registration_number, self.position.latitude, self.position.longitude
        )
    }
}

/// Side effect requested by the monitor
#[derive(Debug, Clone, PartialEq)]
pub enum AlertEffect {
    /// Start the looping audible alarm
    StartAlarm,
    /// Stop the alarm and rewind it to the start
    StopAlarm,
    Notify(DistressNotice),
    ShowBanner,
    HideBanner,
    HighlightZones(Vec<DistressZone>),
    ClearZones,
}

/// Zones around every distressed boat, in snapshot order
pub fn distress_zones(snapshot: &Snapshot, radius_m: f64) -> Vec<DistressZone> {
    snapshot
        .distressed()
        .map(|boat| DistressZone {
            boat_id: boat.id.clone(),
            registration_number: boat.registration_number.clone(),
            center: boat.position(),
            radius_m,
        })
        .collect()
}

/// Turns snapshot changes into alert effects
///
/// Whether the fleet is distressed is recomputed from each snapshot; the
/// previous value is kept only to detect transitions.
#[derive(Debug)]
pub struct DistressMonitor {
    policy: NotificationPolicy,
    zone_radius_m: f64,
    distressed: bool,
    zones: Vec<DistressZone>,
}

impl DistressMonitor {
    pub fn new(policy: NotificationPolicy, zone_radius_m: f64) -> Self {
        Self {
            policy,
            zone_radius_m,
            distressed: false,
            zones: Vec::new(),
        }
    }

    pub fn is_distressed(&self) -> bool {
        self.distressed
    }

    pub fn zones(&self) -> &[DistressZone] {
        &self.zones
    }

    /// Process the latest snapshot and return the effects to perform, in order
    pub fn observe(&mut self, snapshot: &Snapshot) -> Vec<AlertEffect> {
        let distressed = snapshot.is_distressed();
        let zones = distress_zones(snapshot, self.zone_radius_m);
        // first distressed boat in snapshot order, not the most severe
        let first = snapshot.distressed().next().map(DistressNotice::from);

        let mut effects = Vec::new();
        match (self.distressed, distressed) {
            (false, true) => {
                effects.push(AlertEffect::StartAlarm);
                effects.extend(first.map(AlertEffect::Notify));
                effects.push(AlertEffect::ShowBanner);
                effects.push(AlertEffect::HighlightZones(zones.clone()));
            }
            (true, true) => {
                if self.policy == NotificationPolicy::EveryUpdate {
                    effects.extend(first.map(AlertEffect::Notify));
                }
                if zones != self.zones {
                    effects.push(AlertEffect::HighlightZones(zones.clone()));
                }
            }
            (true, false) => {
                effects.push(AlertEffect::StopAlarm);
                effects.push(AlertEffect::HideBanner);
                effects.push(AlertEffect::ClearZones);
            }
            (false, false) => {}
        }

        self.distressed = distressed;
        self.zones = zones;
        effects
    }
}

/// Performs alert effects
pub trait AlertSink {
    fn apply(&mut self, effect: &AlertEffect);

    fn apply_all(&mut self, effects: &[AlertEffect]) {
        for effect in effects {
            self.apply(effect);
        }
    }
}

/// Alert sink for headless operation, reports alerts through the log
#[derive(Debug, Default)]
pub struct LogAlertSink {
    alarm_playing: bool,
    banner_visible: bool,
    highlighted: usize,
}

impl LogAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alarm_playing(&self) -> bool {
        self.alarm_playing
    }

    pub fn banner_visible(&self) -> bool {
        self.banner_visible
    }

    pub fn highlighted(&self) -> usize {
        self.highlighted
    }
}

impl AlertSink for LogAlertSink {
    fn apply(&mut self, effect: &AlertEffect) {
        match effect {
            AlertEffect::StartAlarm => {
                if !self.alarm_playing {
                    warn!("Distress alarm started");
                }
                self.alarm_playing = true;
            }
            AlertEffect::StopAlarm => {
                if self.alarm_playing {
                    info!("Distress alarm stopped");
                }
                self.alarm_playing = false;
            }
            AlertEffect::Notify(notice) => {
                error!(boat_id = %notice.boat_id, "{}", notice);
            }
            AlertEffect::ShowBanner => {
                self.banner_visible = true;
                warn!("Emergency Alert: A boat is in distress!");
            }
            AlertEffect::HideBanner => {
                self.banner_visible = false;
            }
            AlertEffect::HighlightZones(zones) => {
                self.highlighted = zones.len();
                for zone in zones {
                    warn!(
                        boat_id = %zone.boat_id,
                        lat = zone.center.latitude,
                        lon = zone.center.longitude,
                        radius_m = zone.radius_m,
                        "Distress zone"
                    );
                }
            }
            AlertEffect::ClearZones => {
                self.highlighted = 0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn boat(id: &str, is_distress: bool) -> BoatSummary {
        BoatSummary {
            id: BoatId::try_from(id).unwrap(),
            registration_number: format!("REG-{id}"),
            last_updated: Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap(),
            latitude: 13.5,
            longitude: 121.25,
            is_distress,
        }
    }

    fn snapshot(sequence: u64, boats: &[(&str, bool)]) -> Snapshot {
        Snapshot::new(
            sequence,
            boats.iter().map(|(id, flag)| boat(id, *flag)).collect(),
        )
    }

    fn notices(effects: &[AlertEffect]) -> Vec<&DistressNotice> {
        effects
            .iter()
            .filter_map(|e| match e {
                AlertEffect::Notify(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn calm_fleet_raises_nothing() {
        let mut monitor = DistressMonitor::new(NotificationPolicy::OnTransition, 1000.0);
        let effects = monitor.observe(&snapshot(1, &[("1", false)]));
        assert!(effects.is_empty());
        assert!(!monitor.is_distressed());
    }

    #[test]
    fn transition_to_distress_alerts_once() {
        let mut monitor = DistressMonitor::new(NotificationPolicy::OnTransition, 1000.0);
        monitor.observe(&snapshot(1, &[("1", false)]));

        let effects = monitor.observe(&snapshot(2, &[("1", true)]));
        assert_eq!(effects[0], AlertEffect::StartAlarm);
        assert!(effects.contains(&AlertEffect::ShowBanner));
        let notified = notices(&effects);
        assert_eq!(notified.len(), 1);
        assert_eq!(notified[0].boat_id.as_str(), "1");
        assert_eq!(
            notified[0].to_string(),
            "EMERGENCY! Boat REG-1 reported distress at (13.5, 121.25)"
        );
        assert_eq!(monitor.zones().len(), 1);
        assert_eq!(monitor.zones()[0].radius_m, 1000.0);

        // still distressed: no new notification, no change in zones
        let effects = monitor.observe(&snapshot(3, &[("1", true)]));
        assert!(effects.is_empty());
    }

    #[test]
    fn notice_names_first_in_snapshot_order() {
        let mut monitor = DistressMonitor::new(NotificationPolicy::OnTransition, 500.0);
        let effects = monitor.observe(&snapshot(1, &[("a", false), ("c", true), ("b", true)]));
        assert_eq!(notices(&effects)[0].boat_id.as_str(), "c");

        let zones: Vec<&str> = monitor.zones().iter().map(|z| z.boat_id.as_str()).collect();
        assert_eq!(zones, vec!["c", "b"]);
    }

    #[test]
    fn more_boats_in_distress_updates_zones_only() {
        let mut monitor = DistressMonitor::new(NotificationPolicy::OnTransition, 1000.0);
        monitor.observe(&snapshot(1, &[("1", true), ("2", false)]));

        let effects = monitor.observe(&snapshot(2, &[("1", true), ("2", true)]));
        assert_eq!(effects.len(), 1);
        match &effects[0] {
            AlertEffect::HighlightZones(zones) => assert_eq!(zones.len(), 2),
            other => panic!("unexpected effect {other:?}"),
        }
    }

    #[test]
    fn every_update_policy_renotifies() {
        let mut monitor = DistressMonitor::new(NotificationPolicy::EveryUpdate, 1000.0);
        monitor.observe(&snapshot(1, &[("1", true)]));
        let effects = monitor.observe(&snapshot(2, &[("1", true)]));
        assert_eq!(notices(&effects).len(), 1);
        assert!(!effects.contains(&AlertEffect::StartAlarm));
    }

    #[test]
    fn clearing_flags_stops_alarm() {
        let mut monitor = DistressMonitor::new(NotificationPolicy::OnTransition, 1000.0);
        monitor.observe(&snapshot(1, &[("1", true)]));

        let effects = monitor.observe(&snapshot(2, &[("1", false)]));
        assert_eq!(
            effects,
            vec![
                AlertEffect::StopAlarm,
                AlertEffect::HideBanner,
                AlertEffect::ClearZones
            ]
        );
        assert!(monitor.zones().is_empty());
    }

    #[test]
    fn distressed_tracks_latest_snapshot_only() {
        let sequence: [&[(&str, bool)]; 6] = [
            &[("1", false)],
            &[("1", true)],
            &[],
            &[("1", false), ("2", true)],
            &[("2", true)],
            &[("1", false), ("2", false)],
        ];
        let mut monitor = DistressMonitor::new(NotificationPolicy::OnTransition, 1000.0);
        for (n, boats) in sequence.iter().enumerate() {
            let snap = snapshot(n as u64 + 1, boats);
            monitor.observe(&snap);
            assert_eq!(
                monitor.is_distressed(),
                boats.iter().any(|(_, flag)| *flag)
            );
        }
    }

    #[test]
    fn log_sink_follows_effects() {
        let mut monitor = DistressMonitor::new(NotificationPolicy::OnTransition, 1000.0);
        let mut sink = LogAlertSink::new();

        sink.apply_all(&monitor.observe(&snapshot(1, &[("1", true), ("2", true)])));
        assert!(sink.alarm_playing());
        assert!(sink.banner_visible());
        assert_eq!(sink.highlighted(), 2);

        sink.apply_all(&monitor.observe(&snapshot(2, &[("1", false), ("2", false)])));
        assert!(!sink.alarm_playing());
        assert!(!sink.banner_visible());
        assert_eq!(sink.highlighted(), 0);
    }
}
