//! Fusion Type Definitions
//!
//! Sensors, detections, tracks and the lifecycle events the correlator emits.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::geo::{GeoPoint, LocalPosition, Velocity};

/// Sensor that produced a detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    /// Self-reporting transponder; carries identity
    Ais,
    Radar,
    /// Electro-optical / infrared camera
    Eoir,
}

impl SensorKind {
    /// Bit for this sensor in a [`SensorSet`]
    pub fn flag(self) -> SensorSet {
        match self {
            SensorKind::Ais => SensorSet::AIS,
            SensorKind::Radar => SensorSet::RADAR,
            SensorKind::Eoir => SensorSet::EOIR,
        }
    }

    /// Prefix used in generated track ids
    pub fn label(self) -> &'static str {
        match self {
            SensorKind::Ais => "AIS",
            SensorKind::Radar => "RADAR",
            SensorKind::Eoir => "EOIR",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

bitflags! {
    /// Sensors that have contributed to a track
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct SensorSet: u8 {
        const AIS = 0b001;
        const RADAR = 0b010;
        const EOIR = 0b100;
    }
}

impl SensorSet {
    pub fn has(&self, kind: SensorKind) -> bool {
        self.contains(kind.flag())
    }

    pub fn add(&mut self, kind: SensorKind) {
        self.insert(kind.flag());
    }

    /// Number of distinct sensors
    pub fn count(&self) -> u32 {
        self.bits().count_ones()
    }
}

/// How sure we are about who a track is
///
/// Ordered: `None < Low < Medium < High < Strong`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityConfidence {
    None,
    Low,
    Medium,
    High,
    Strong,
}

impl Default for IdentityConfidence {
    fn default() -> Self {
        IdentityConfidence::None
    }
}

impl IdentityConfidence {
    /// Confidence as a function of the contributing sensors
    ///
    /// | Sources | AIS among them | Confidence |
    /// |---------|----------------|------------|
    /// | 1 | yes | Medium |
    /// | 1 | no | Low |
    /// | 2+ | yes | Strong |
    /// | 2+ | no | High |
    pub fn from_sources(sources: SensorSet) -> IdentityConfidence {
        let has_ais = sources.has(SensorKind::Ais);
        match sources.count() {
            0 => IdentityConfidence::None,
            1 if has_ais => IdentityConfidence::Medium,
            1 => IdentityConfidence::Low,
            _ if has_ais => IdentityConfidence::Strong,
            _ => IdentityConfidence::High,
        }
    }
}

/// Track lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackState {
    /// Created from a single detection
    Predicted,
    /// Seen more than once, not yet confirmed
    Observed,
    /// Observation count reached the confirmation threshold
    Confirmed,
}

impl Default for TrackState {
    fn default() -> Self {
        TrackState::Predicted
    }
}

/// Vessel identity as broadcast over AIS
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipIdentity {
    pub name: String,
    pub mmsi: String,
    #[serde(default)]
    pub imo: String,
    /// Course over ground in degrees
    #[serde(default)]
    pub course: f64,
    /// Speed over ground in knots
    #[serde(default)]
    pub speed: f64,
}

impl ShipIdentity {
    /// Deterministic track id for this vessel
    pub fn track_key(&self) -> String {
        format!("AIS:{}", self.mmsi)
    }

    /// Name for display, falling back to the MMSI
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.mmsi
        } else {
            &self.name
        }
    }
}

/// Where a detection was observed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "frame", rename_all = "lowercase")]
pub enum DetectionPosition {
    /// Latitude/longitude in degrees
    Geodetic(GeoPoint),
    /// Meters east/north of the correlator's origin
    Local(LocalPosition),
}

/// One sensor observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    pub kind: SensorKind,
    pub position: DetectionPosition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity: Option<Velocity>,
    /// Milliseconds since epoch
    pub timestamp: u64,
    /// Only AIS carries identity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<ShipIdentity>,
}

impl Detection {
    /// Anonymous radar return
    pub fn radar(position: DetectionPosition, velocity: Option<Velocity>, timestamp: u64) -> Self {
        Detection {
            kind: SensorKind::Radar,
            position,
            velocity,
            timestamp,
            identity: None,
        }
    }

    /// EO/IR detection; these carry no velocity
    pub fn eoir(position: DetectionPosition, timestamp: u64) -> Self {
        Detection {
            kind: SensorKind::Eoir,
            position,
            velocity: None,
            timestamp,
            identity: None,
        }
    }

    /// AIS report; velocity comes from the reported course and speed
    pub fn ais(position: GeoPoint, identity: ShipIdentity, timestamp: u64) -> Self {
        Detection {
            kind: SensorKind::Ais,
            position: DetectionPosition::Geodetic(position),
            velocity: Some(Velocity::from_course_speed(identity.course, identity.speed)),
            timestamp,
            identity: Some(identity),
        }
    }

    /// Deterministic track id, when the detection carries identity
    pub fn identity_key(&self) -> Option<String> {
        match (&self.kind, &self.identity) {
            (SensorKind::Ais, Some(identity)) if !identity.mmsi.is_empty() => {
                Some(identity.track_key())
            }
            _ => None,
        }
    }
}

/// Stable per-track number that survives re-keying
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackHandle(pub u64);

impl fmt::Display for TrackHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A fused vessel track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Unique key in the live table; may change once when AIS claims the track
    pub id: String,
    pub handle: TrackHandle,
    /// Meters from the correlator's origin
    pub position: LocalPosition,
    /// Same position as latitude/longitude
    pub location: GeoPoint,
    pub velocity: Velocity,
    pub sources: SensorSet,
    pub identity_confidence: IdentityConfidence,
    pub state: TrackState,
    /// Milliseconds since epoch
    pub first_seen: u64,
    /// Milliseconds since epoch; never decreases
    pub last_update: u64,
    pub observations: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<ShipIdentity>,
}

impl Track {
    pub fn is_confirmed(&self) -> bool {
        self.state == TrackState::Confirmed
    }

    /// Label for overlays: vessel name when known, else the track id
    pub fn label(&self) -> &str {
        match &self.identity {
            Some(identity) => identity.display_name(),
            None => &self.id,
        }
    }
}

/// Track lifecycle notifications
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrackEvent {
    Created { track: Track },
    Updated { track: Track },
    /// An AIS report claimed an anonymous track
    Rekeyed {
        handle: TrackHandle,
        from: String,
        to: String,
    },
    Removed { id: String, handle: TrackHandle },
}

impl TrackEvent {
    /// Handle of the track this event is about
    pub fn handle(&self) -> TrackHandle {
        match self {
            TrackEvent::Created { track } | TrackEvent::Updated { track } => track.handle,
            TrackEvent::Rekeyed { handle, .. } | TrackEvent::Removed { handle, .. } => *handle,
        }
    }
}

/// Correlator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FusionSettings {
    /// Maximum distance in meters between a track and a detection to associate them
    pub correlation_distance: f64,
    /// Maximum age in seconds of a track for a detection to associate with it
    pub correlation_time: f64,
    /// Seconds without updates before the sweep removes a track
    pub inactivity_timeout: f64,
    /// Observations needed before a track is confirmed
    pub confirmation_threshold: u32,
    /// Reference point of the local plane used for distances
    pub origin: GeoPoint,
}

impl Default for FusionSettings {
    fn default() -> Self {
        FusionSettings {
            correlation_distance: 500.0, // 500 meters
            correlation_time: 30.0,      // 30 seconds
            inactivity_timeout: 120.0,   // 2 minutes
            confirmation_threshold: 3,
            origin: GeoPoint::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(kinds: &[SensorKind]) -> SensorSet {
        let mut s = SensorSet::empty();
        for k in kinds {
            s.add(*k);
        }
        s
    }

    #[test]
    fn test_confidence_table() {
        use IdentityConfidence::*;
        use SensorKind::*;
        assert_eq!(IdentityConfidence::from_sources(set(&[])), None);
        assert_eq!(IdentityConfidence::from_sources(set(&[Ais])), Medium);
        assert_eq!(IdentityConfidence::from_sources(set(&[Radar])), Low);
        assert_eq!(IdentityConfidence::from_sources(set(&[Eoir])), Low);
        assert_eq!(IdentityConfidence::from_sources(set(&[Radar, Eoir])), High);
        assert_eq!(IdentityConfidence::from_sources(set(&[Ais, Radar])), Strong);
        assert_eq!(
            IdentityConfidence::from_sources(set(&[Ais, Radar, Eoir])),
            Strong
        );
    }

    #[test]
    fn test_confidence_order() {
        assert!(IdentityConfidence::Low < IdentityConfidence::Medium);
        assert!(IdentityConfidence::High < IdentityConfidence::Strong);
        assert!(IdentityConfidence::None < IdentityConfidence::Low);
    }

    #[test]
    fn test_sensor_set() {
        let mut s = SensorSet::empty();
        s.add(SensorKind::Radar);
        s.add(SensorKind::Radar);
        assert_eq!(s.count(), 1);
        assert!(s.has(SensorKind::Radar));
        assert!(!s.has(SensorKind::Ais));
        s.add(SensorKind::Eoir);
        assert_eq!(s, SensorSet::RADAR | SensorSet::EOIR);
    }

    #[test]
    fn test_identity_key() {
        let identity = ShipIdentity {
            name: "Nordic Star".into(),
            mmsi: "244123456".into(),
            ..Default::default()
        };
        let det = Detection::ais(GeoPoint::new(52.0, 4.0), identity, 0);
        assert_eq!(det.identity_key().as_deref(), Some("AIS:244123456"));

        let radar = Detection::radar(
            DetectionPosition::Local(LocalPosition::new(0.0, 0.0)),
            None,
            0,
        );
        assert_eq!(radar.identity_key(), None);
    }

    #[test]
    fn test_display_name_falls_back_to_mmsi() {
        let identity = ShipIdentity {
            mmsi: "111".into(),
            ..Default::default()
        };
        assert_eq!(identity.display_name(), "111");
    }

    #[test]
    fn test_event_serialization() {
        let event = TrackEvent::Removed {
            id: "RADAR-000001".into(),
            handle: TrackHandle(7),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "removed");
        assert_eq!(json["id"], "RADAR-000001");
        assert_eq!(json["handle"], 7);
    }

    #[test]
    fn test_settings_defaults_from_partial_json() {
        let settings: FusionSettings =
            serde_json::from_str(r#"{"correlationDistance": 250.0}"#).unwrap();
        assert_eq!(settings.correlation_distance, 250.0);
        assert_eq!(settings.confirmation_threshold, 3);
    }
}
