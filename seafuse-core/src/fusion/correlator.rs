//! Track Correlator
//!
//! Owns the live track table. Every detection is either matched to an
//! existing track (by AIS identity, then by nearest neighbor) or starts a
//! new one. Tracks only leave the table through [`TrackCorrelator::sweep`].
//!
//! All mutation goes through `&mut self`, so a correlator has exactly one
//! writer. Hosts with several producers funnel them through one queue.

use std::collections::{BTreeMap, VecDeque};

use super::types::*;
use crate::geo::LocalPosition;
use crate::reports::AisBatch;

/// How a detection was associated
#[derive(Debug, Clone, PartialEq)]
pub enum Association {
    /// No match; a new track was created
    Created,
    /// Matched an existing track by AIS identity
    Identity,
    /// Matched the nearest compatible track
    Correlated { distance: f64 },
    /// Matched the nearest compatible track, which was then re-keyed to
    /// the detection's identity
    Claimed { previous_id: String, distance: f64 },
}

/// Result of processing one detection
#[derive(Debug, Clone, PartialEq)]
pub struct Processed {
    pub track_id: String,
    pub handle: TrackHandle,
    pub association: Association,
}

/// Track correlation / fusion engine
#[derive(Debug)]
pub struct TrackCorrelator {
    settings: FusionSettings,
    /// Live tracks by id
    tracks: BTreeMap<String, Track>,
    /// Lifecycle events waiting for a consumer
    events: VecDeque<TrackEvent>,
    /// Serial for generated track ids
    next_serial: u64,
    next_handle: u64,
}

impl TrackCorrelator {
    pub fn new(settings: FusionSettings) -> Self {
        TrackCorrelator {
            settings,
            tracks: BTreeMap::new(),
            events: VecDeque::new(),
            next_serial: 1,
            next_handle: 1,
        }
    }

    pub fn settings(&self) -> &FusionSettings {
        &self.settings
    }

    /// Replace the settings. The origin is not changed for existing tracks,
    /// so hosts should only move it while the table is empty.
    pub fn update_settings(&mut self, settings: FusionSettings) {
        self.settings = settings;
    }

    // -------------------------------------------------------------------------
    // Ingest
    // -------------------------------------------------------------------------

    /// Associate one detection with the track table
    pub fn process_detection(&mut self, detection: Detection) -> Processed {
        let position = self.local_position(&detection);
        let identity_key = detection.identity_key();

        if let Some(key) = &identity_key {
            if self.tracks.contains_key(key) {
                let handle = self.merge(key, &detection, position);
                return Processed {
                    track_id: key.clone(),
                    handle,
                    association: Association::Identity,
                };
            }
        }

        if let Some((candidate, distance)) = self.find_correlated(&detection, &position) {
            return match identity_key {
                Some(key) => {
                    self.rekey(&candidate, &key);
                    let handle = self.merge(&key, &detection, position);
                    Processed {
                        track_id: key,
                        handle,
                        association: Association::Claimed {
                            previous_id: candidate,
                            distance,
                        },
                    }
                }
                None => {
                    let handle = self.merge(&candidate, &detection, position);
                    Processed {
                        track_id: candidate,
                        handle,
                        association: Association::Correlated { distance },
                    }
                }
            };
        }

        let id = identity_key.unwrap_or_else(|| self.generate_id(detection.kind));
        let handle = self.create(&id, detection, position);
        Processed {
            track_id: id,
            handle,
            association: Association::Created,
        }
    }

    /// Apply detections one after the other; later ones win
    pub fn process_detections<I>(&mut self, detections: I) -> Vec<Processed>
    where
        I: IntoIterator<Item = Detection>,
    {
        detections
            .into_iter()
            .map(|d| self.process_detection(d))
            .collect()
    }

    /// Apply every ship of an AIS batch, all stamped with `timestamp`
    pub fn process_ais_batch(&mut self, batch: &AisBatch, timestamp: u64) -> Vec<Processed> {
        let detections: Vec<Detection> = batch
            .ships
            .iter()
            .map(|ship| ship.to_detection(timestamp))
            .collect();
        self.process_detections(detections)
    }

    // -------------------------------------------------------------------------
    // Maintenance
    // -------------------------------------------------------------------------

    /// Remove tracks without updates for longer than the inactivity timeout
    ///
    /// Emits one `Removed` event per track and returns the removed ids.
    /// Running it twice with the same `now` removes nothing the second time.
    pub fn sweep(&mut self, now: u64) -> Vec<String> {
        let timeout_ms = seconds_to_ms(self.settings.inactivity_timeout);

        let stale: Vec<String> = self
            .tracks
            .iter()
            .filter(|(_, track)| now.saturating_sub(track.last_update) > timeout_ms)
            .map(|(id, _)| id.clone())
            .collect();

        for id in &stale {
            if let Some(track) = self.tracks.remove(id) {
                self.events.push_back(TrackEvent::Removed {
                    id: track.id,
                    handle: track.handle,
                });
            }
        }
        stale
    }

    /// Drop every track, emitting a `Removed` for each
    pub fn clear(&mut self) {
        let tracks = std::mem::take(&mut self.tracks);
        for (_, track) in tracks {
            self.events.push_back(TrackEvent::Removed {
                id: track.id,
                handle: track.handle,
            });
        }
    }

    /// Take all pending lifecycle events, oldest first
    pub fn drain_events(&mut self) -> Vec<TrackEvent> {
        self.events.drain(..).collect()
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    pub fn track(&self, id: &str) -> Option<&Track> {
        self.tracks.get(id)
    }

    pub fn tracks_by_sensor(&self, kind: SensorKind) -> Vec<&Track> {
        self.tracks.values().filter(|t| t.sources.has(kind)).collect()
    }

    pub fn confirmed_tracks(&self) -> Vec<&Track> {
        self.tracks.values().filter(|t| t.is_confirmed()).collect()
    }

    pub fn tracks_with_confidence(&self, minimum: IdentityConfidence) -> Vec<&Track> {
        self.tracks
            .values()
            .filter(|t| t.identity_confidence >= minimum)
            .collect()
    }

    pub fn snapshot(&self) -> Vec<Track> {
        self.tracks.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn local_position(&self, detection: &Detection) -> LocalPosition {
        match detection.position {
            DetectionPosition::Geodetic(point) => point.local_from(&self.settings.origin),
            DetectionPosition::Local(local) => local,
        }
    }

    /// Nearest track that has not yet been seen by this sensor, is recent
    /// enough, and is within the correlation distance
    ///
    /// Geodetic detections are measured against the track's geodetic
    /// location, so the distance does not depend on the plane's origin.
    fn find_correlated(
        &self,
        detection: &Detection,
        position: &LocalPosition,
    ) -> Option<(String, f64)> {
        let max_age_ms = seconds_to_ms(self.settings.correlation_time);
        let max_distance = self.settings.correlation_distance;

        let mut best: Option<(&String, f64)> = None;
        for (id, track) in &self.tracks {
            if track.sources.has(detection.kind) {
                continue;
            }
            if detection.timestamp.saturating_sub(track.last_update) >= max_age_ms {
                continue;
            }
            let distance = match &detection.position {
                DetectionPosition::Geodetic(point) => point.distance_to(&track.location),
                DetectionPosition::Local(_) => track.position.distance_to(position),
            };
            if !(distance < max_distance) {
                continue;
            }
            // Strict comparison keeps the lowest id on ties
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((id, distance));
            }
        }
        best.map(|(id, d)| (id.clone(), d))
    }

    fn rekey(&mut self, from: &str, to: &str) {
        if let Some(mut track) = self.tracks.remove(from) {
            track.id = to.to_string();
            self.events.push_back(TrackEvent::Rekeyed {
                handle: track.handle,
                from: from.to_string(),
                to: to.to_string(),
            });
            self.tracks.insert(to.to_string(), track);
        }
    }

    fn merge(&mut self, id: &str, detection: &Detection, position: LocalPosition) -> TrackHandle {
        let origin = self.settings.origin;
        let threshold = self.settings.confirmation_threshold;
        let Some(track) = self.tracks.get_mut(id) else {
            return TrackHandle(0);
        };

        track.position = position;
        track.location = match detection.position {
            DetectionPosition::Geodetic(point) => point,
            DetectionPosition::Local(local) => local.to_geo(&origin),
        };
        // EO/IR carries no velocity; keep the last known one
        if let Some(velocity) = detection.velocity {
            track.velocity = velocity;
        }
        track.last_update = track.last_update.max(detection.timestamp);

        track.sources.add(detection.kind);
        track.identity_confidence = IdentityConfidence::from_sources(track.sources);

        track.observations = track.observations.saturating_add(1);
        if track.state == TrackState::Predicted {
            track.state = TrackState::Observed;
        }
        if track.observations >= threshold && track.state != TrackState::Confirmed {
            track.state = TrackState::Confirmed;
        }

        if let Some(identity) = &detection.identity {
            track.identity = Some(identity.clone());
        }

        let handle = track.handle;
        self.events.push_back(TrackEvent::Updated {
            track: track.clone(),
        });
        handle
    }

    fn create(&mut self, id: &str, detection: Detection, position: LocalPosition) -> TrackHandle {
        let handle = TrackHandle(self.next_handle);
        self.next_handle += 1;

        let sources = detection.kind.flag();
        let location = match detection.position {
            DetectionPosition::Geodetic(point) => point,
            DetectionPosition::Local(local) => local.to_geo(&self.settings.origin),
        };

        let track = Track {
            id: id.to_string(),
            handle,
            position,
            location,
            velocity: detection.velocity.unwrap_or_default(),
            sources,
            identity_confidence: IdentityConfidence::from_sources(sources),
            state: TrackState::Predicted,
            first_seen: detection.timestamp,
            last_update: detection.timestamp,
            observations: 1,
            identity: detection.identity,
        };

        self.events.push_back(TrackEvent::Created {
            track: track.clone(),
        });
        self.tracks.insert(id.to_string(), track);
        handle
    }

    // Identity keys use "AIS:<mmsi>", generated ids use "<SENSOR>-<serial>",
    // so the two never collide
    fn generate_id(&mut self, kind: SensorKind) -> String {
        let id = format!("{}-{:06}", kind.label(), self.next_serial);
        self.next_serial += 1;
        id
    }
}

fn seconds_to_ms(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;

    fn settings() -> FusionSettings {
        FusionSettings {
            correlation_distance: 500.0,
            correlation_time: 30.0,
            inactivity_timeout: 120.0,
            confirmation_threshold: 3,
            origin: GeoPoint::new(52.0, 4.0),
        }
    }

    fn local(east: f64, north: f64) -> DetectionPosition {
        DetectionPosition::Local(LocalPosition::new(east, north))
    }

    fn ship(mmsi: &str) -> ShipIdentity {
        ShipIdentity {
            name: format!("Vessel {}", mmsi),
            mmsi: mmsi.to_string(),
            imo: "IMO9000001".into(),
            course: 90.0,
            speed: 12.0,
        }
    }

    fn ais_at(correlator: &TrackCorrelator, east: f64, north: f64, mmsi: &str, t: u64) -> Detection {
        let origin = correlator.settings().origin;
        let point = LocalPosition::new(east, north).to_geo(&origin);
        Detection::ais(point, ship(mmsi), t)
    }

    #[test]
    fn test_first_detection_creates_track() {
        let mut c = TrackCorrelator::new(settings());
        let result = c.process_detection(Detection::radar(local(100.0, 200.0), None, 1_000));

        assert_eq!(result.association, Association::Created);
        assert_eq!(result.track_id, "RADAR-000001");
        let track = c.track(&result.track_id).unwrap();
        assert_eq!(track.state, TrackState::Predicted);
        assert_eq!(track.observations, 1);
        assert_eq!(track.sources, SensorSet::RADAR);
        assert_eq!(track.identity_confidence, IdentityConfidence::Low);

        let events = c.drain_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], TrackEvent::Created { .. }));
        assert_eq!(c.pending_events(), 0);
    }

    #[test]
    fn test_three_ais_reports_confirm() {
        let mut c = TrackCorrelator::new(settings());
        for i in 0..3u64 {
            let det = ais_at(&c, 10.0 * i as f64, 0.0, "244000001", i * 5_000);
            c.process_detection(det);
        }

        assert_eq!(c.len(), 1);
        let track = c.track("AIS:244000001").unwrap();
        assert_eq!(track.state, TrackState::Confirmed);
        assert_eq!(track.observations, 3);
        assert_eq!(track.identity_confidence, IdentityConfidence::Medium);
        assert_eq!(c.confirmed_tracks().len(), 1);
    }

    #[test]
    fn test_second_observation_is_observed() {
        let mut c = TrackCorrelator::new(settings());
        c.process_detection(ais_at(&c, 0.0, 0.0, "1", 0));
        c.process_detection(ais_at(&c, 0.0, 0.0, "1", 1_000));
        assert_eq!(c.track("AIS:1").unwrap().state, TrackState::Observed);
    }

    #[test]
    fn test_eoir_merges_into_radar_then_ais_claims() {
        let mut c = TrackCorrelator::new(settings());
        let radar = c.process_detection(Detection::radar(local(1000.0, 1000.0), None, 0));
        let eoir = c.process_detection(Detection::eoir(local(1100.0, 1050.0), 2_000));

        assert_eq!(c.len(), 1);
        assert_eq!(eoir.track_id, radar.track_id);
        assert!(matches!(eoir.association, Association::Correlated { .. }));
        let track = c.track(&radar.track_id).unwrap();
        assert_eq!(track.sources, SensorSet::RADAR | SensorSet::EOIR);
        assert_eq!(track.identity_confidence, IdentityConfidence::High);

        let ais = ais_at(&c, 1050.0, 1020.0, "366999000", 4_000);
        let claimed = c.process_detection(ais);

        assert_eq!(c.len(), 1);
        assert_eq!(claimed.track_id, "AIS:366999000");
        assert_eq!(claimed.handle, radar.handle);
        match &claimed.association {
            Association::Claimed { previous_id, .. } => assert_eq!(previous_id, &radar.track_id),
            other => panic!("Expected claim, got {:?}", other),
        }
        assert!(c.track(&radar.track_id).is_none());

        let track = c.track("AIS:366999000").unwrap();
        assert_eq!(track.identity_confidence, IdentityConfidence::Strong);
        assert_eq!(track.observations, 3);
        assert_eq!(track.state, TrackState::Confirmed);
        assert_eq!(track.identity.as_ref().unwrap().mmsi, "366999000");

        let events = c.drain_events();
        let rekeys: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, TrackEvent::Rekeyed { .. }))
            .collect();
        assert_eq!(rekeys.len(), 1);
        assert!(events.iter().all(|e| e.handle() == radar.handle));
    }

    #[test]
    fn test_same_sensor_never_correlates() {
        let mut c = TrackCorrelator::new(settings());
        c.process_detection(Detection::radar(local(0.0, 0.0), None, 0));
        let second = c.process_detection(Detection::radar(local(10.0, 0.0), None, 1_000));
        assert_eq!(second.association, Association::Created);
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn test_distance_threshold() {
        let mut c = TrackCorrelator::new(settings());
        c.process_detection(Detection::radar(local(0.0, 0.0), None, 0));
        let far = c.process_detection(Detection::eoir(local(600.0, 0.0), 1_000));
        assert_eq!(far.association, Association::Created);
        assert_eq!(far.track_id, "EOIR-000002");
    }

    #[test]
    fn test_geodetic_distance_ignores_default_origin() {
        // Origin left at 0°N 0°E, sensors operating at 52°N
        let mut c = TrackCorrelator::new(FusionSettings::default());
        let radar_at = GeoPoint::new(52.0, 4.0);
        let radar = c.process_detection(Detection::radar(
            DetectionPosition::Geodetic(radar_at),
            None,
            0,
        ));

        let east_400 = LocalPosition::new(400.0, 0.0).to_geo(&radar_at);
        let eoir =
            c.process_detection(Detection::eoir(DetectionPosition::Geodetic(east_400), 1_000));
        assert_eq!(c.len(), 1);
        assert_eq!(eoir.track_id, radar.track_id);
        match eoir.association {
            Association::Correlated { distance } => assert!((distance - 400.0).abs() < 0.5),
            other => panic!("Expected correlation, got {:?}", other),
        }

        // 600 m past the merged EO/IR fix
        let east_1000 = LocalPosition::new(1000.0, 0.0).to_geo(&radar_at);
        let ais = Detection::ais(east_1000, ship("244000002"), 2_000);
        assert_eq!(c.process_detection(ais).association, Association::Created);
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn test_ais_without_mmsi_correlates_like_radar() {
        let mut c = TrackCorrelator::new(settings());
        let anonymous = |c: &TrackCorrelator, east: f64, t: u64| {
            let mut det = ais_at(c, east, 0.0, "", t);
            if let Some(identity) = det.identity.as_mut() {
                identity.name = "Unnamed".into();
            }
            det
        };

        let first = c.process_detection(anonymous(&c, 0.0, 0));
        assert_eq!(first.association, Association::Created);
        assert_eq!(first.track_id, "AIS-000001");
        let track = c.track("AIS-000001").unwrap();
        assert_eq!(track.identity_confidence, IdentityConfidence::Medium);
        assert_eq!(track.identity.as_ref().unwrap().mmsi, "");
        assert_eq!(track.label(), "Unnamed");

        // Same sensor, no identity key: a new generated track, not a merge
        let second = c.process_detection(anonymous(&c, 20.0, 1_000));
        assert_eq!(second.track_id, "AIS-000002");
        assert_eq!(c.len(), 2);

        // Radar near the first one merges and keeps the generated id
        let radar = c.process_detection(Detection::radar(local(-30.0, 0.0), None, 2_000));
        assert_eq!(radar.track_id, "AIS-000001");
        let track = c.track("AIS-000001").unwrap();
        assert_eq!(track.sources, SensorSet::AIS | SensorSet::RADAR);
        assert_eq!(track.identity.as_ref().unwrap().name, "Unnamed");
        assert!(c.tracks().all(|t| !t.id.starts_with("AIS:")));
    }

    #[test]
    fn test_time_threshold() {
        let mut c = TrackCorrelator::new(settings());
        c.process_detection(Detection::radar(local(0.0, 0.0), None, 0));
        let late = c.process_detection(Detection::eoir(local(10.0, 0.0), 31_000));
        assert_eq!(late.association, Association::Created);
    }

    #[test]
    fn test_nearest_neighbor_wins() {
        let mut c = TrackCorrelator::new(settings());
        let far = c.process_detection(Detection::radar(local(300.0, 0.0), None, 0));
        let near = c.process_detection(Detection::radar(local(-100.0, 0.0), None, 0));
        let eoir = c.process_detection(Detection::eoir(local(0.0, 0.0), 1_000));
        assert_eq!(eoir.track_id, near.track_id);
        assert_ne!(eoir.track_id, far.track_id);
        match eoir.association {
            Association::Correlated { distance } => assert!((distance - 100.0).abs() < 1e-9),
            other => panic!("Expected correlation, got {:?}", other),
        }
    }

    #[test]
    fn test_distinct_mmsi_do_not_merge() {
        let mut c = TrackCorrelator::new(settings());
        c.process_detection(ais_at(&c, 0.0, 0.0, "1", 0));
        c.process_detection(ais_at(&c, 5.0, 0.0, "2", 0));
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn test_identity_replaced_on_update() {
        let mut c = TrackCorrelator::new(settings());
        c.process_detection(ais_at(&c, 0.0, 0.0, "1", 0));
        let mut det = ais_at(&c, 0.0, 0.0, "1", 1_000);
        if let Some(identity) = det.identity.as_mut() {
            identity.name = "Renamed".into();
        }
        c.process_detection(det);
        assert_eq!(c.track("AIS:1").unwrap().label(), "Renamed");
    }

    #[test]
    fn test_last_update_never_decreases() {
        let mut c = TrackCorrelator::new(settings());
        c.process_detection(ais_at(&c, 0.0, 0.0, "1", 10_000));
        c.process_detection(ais_at(&c, 50.0, 0.0, "1", 5_000));
        let track = c.track("AIS:1").unwrap();
        assert_eq!(track.last_update, 10_000);
        assert!((track.position.east - 50.0).abs() < 1e-6);
    }

    #[test]
    fn test_sweep_removes_stale_once() {
        let mut c = TrackCorrelator::new(settings());
        c.process_detection(Detection::radar(local(0.0, 0.0), None, 0));
        c.process_detection(ais_at(&c, 5_000.0, 0.0, "9", 100_000));
        c.drain_events();

        let removed = c.sweep(121_000);
        assert_eq!(removed, vec!["RADAR-000001".to_string()]);
        assert_eq!(c.len(), 1);

        let events = c.drain_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], TrackEvent::Removed { id, .. } if id == "RADAR-000001"));

        assert!(c.sweep(121_000).is_empty());
        assert!(c.drain_events().is_empty());
    }

    #[test]
    fn test_sweep_keeps_track_at_timeout() {
        let mut c = TrackCorrelator::new(settings());
        c.process_detection(Detection::radar(local(0.0, 0.0), None, 0));
        assert!(c.sweep(120_000).is_empty());
        assert_eq!(c.sweep(120_001).len(), 1);
    }

    #[test]
    fn test_clear_emits_removals() {
        let mut c = TrackCorrelator::new(settings());
        c.process_detection(Detection::radar(local(0.0, 0.0), None, 0));
        c.process_detection(Detection::radar(local(9_000.0, 0.0), None, 0));
        c.drain_events();
        c.clear();
        assert!(c.is_empty());
        assert_eq!(c.drain_events().len(), 2);
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let mut c = TrackCorrelator::new(settings());
        assert!(c.process_detections(Vec::new()).is_empty());
        assert!(c.process_ais_batch(&AisBatch::default(), 0).is_empty());
        assert!(c.is_empty());
        assert_eq!(c.pending_events(), 0);
    }

    #[test]
    fn test_same_identity_in_batch_last_wins() {
        let mut c = TrackCorrelator::new(settings());
        let a = ais_at(&c, 0.0, 0.0, "5", 0);
        let b = ais_at(&c, 40.0, 0.0, "5", 0);
        c.process_detections(vec![a, b]);
        assert_eq!(c.len(), 1);
        let track = c.track("AIS:5").unwrap();
        assert!((track.position.east - 40.0).abs() < 1e-6);
        assert_eq!(track.observations, 2);
    }

    #[test]
    fn test_queries() {
        let mut c = TrackCorrelator::new(settings());
        c.process_detection(Detection::radar(local(0.0, 0.0), None, 0));
        c.process_detection(Detection::eoir(local(20_000.0, 0.0), 0));
        c.process_detection(ais_at(&c, -20_000.0, 0.0, "3", 0));

        assert_eq!(c.tracks_by_sensor(SensorKind::Radar).len(), 1);
        assert_eq!(c.tracks_by_sensor(SensorKind::Ais).len(), 1);
        assert_eq!(c.tracks_with_confidence(IdentityConfidence::Medium).len(), 1);
        assert_eq!(c.tracks_with_confidence(IdentityConfidence::Low).len(), 3);
        assert_eq!(c.snapshot().len(), 3);
        assert_eq!(c.tracks().count(), 3);
    }

    #[test]
    fn test_local_detection_gets_location() {
        let mut c = TrackCorrelator::new(settings());
        let r = c.process_detection(Detection::radar(local(0.0, 1000.0), None, 0));
        let track = c.track(&r.track_id).unwrap();
        assert!(track.location.lat > 52.0);
        assert!((track.location.lon - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_ais_velocity_from_course() {
        let mut c = TrackCorrelator::new(settings());
        c.process_detection(ais_at(&c, 0.0, 0.0, "8", 0));
        let v = c.track("AIS:8").unwrap().velocity;
        assert!(v.east > 6.0);
        assert!(v.north.abs() < 1e-9);
    }
}
