//! Upstream report formats
//!
//! AIS batches and EO/IR camera metadata arrive as JSON documents. These
//! types mirror that layout and convert into detections and poses.
//!
//! ```json
//! {"timestamp": "2024-05-01T12:00:00Z",
//!  "ships": [{"name": "Nordic Star", "imo": "9321483", "mmsi": "244123456",
//!             "lat": 51.95, "lon": 4.05, "course": 270.0, "speed": 11.5}]}
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fusion::{Detection, ShipIdentity};
use crate::geo::GeoPoint;
use crate::projection::SensorPose;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("invalid AIS batch: {0}")]
    AisBatch(#[source] serde_json::Error),

    #[error("invalid EO/IR metadata: {0}")]
    EoirMetadata(#[source] serde_json::Error),
}

// =============================================================================
// AIS
// =============================================================================

/// One AIS snapshot: every ship in range at a point in time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AisBatch {
    /// Producer timestamp, as sent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub ships: Vec<AisShip>,
}

/// One vessel from an AIS batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AisShip {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub imo: String,
    pub mmsi: String,
    pub lat: f64,
    pub lon: f64,
    /// Course over ground, degrees
    #[serde(default)]
    pub course: f64,
    /// Speed over ground, knots
    #[serde(default)]
    pub speed: f64,
}

impl AisShip {
    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }

    pub fn identity(&self) -> ShipIdentity {
        ShipIdentity {
            name: self.name.clone(),
            mmsi: self.mmsi.clone(),
            imo: self.imo.clone(),
            course: self.course,
            speed: self.speed,
        }
    }

    pub fn to_detection(&self, timestamp: u64) -> Detection {
        Detection::ais(self.position(), self.identity(), timestamp)
    }
}

pub fn parse_ais_batch(json: &str) -> Result<AisBatch, ReportError> {
    serde_json::from_str(json).map_err(ReportError::AisBatch)
}

// =============================================================================
// EO/IR
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraOrientation {
    pub azimuth: f64,
    pub elevation: f64,
    #[serde(default)]
    pub roll: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldOfView {
    pub horizontal: f64,
    pub vertical: f64,
}

/// Camera metadata published alongside EO/IR video
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EoirMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    pub camera_position: GeoPoint,
    pub camera_orientation: CameraOrientation,
    pub fov: FieldOfView,
}

impl EoirMetadata {
    /// Camera pose; the metadata carries no altitude so the caller supplies it
    pub fn to_pose(&self, altitude: f64) -> SensorPose {
        SensorPose {
            latitude: self.camera_position.lat,
            longitude: self.camera_position.lon,
            altitude,
            azimuth: self.camera_orientation.azimuth,
            elevation: self.camera_orientation.elevation,
            roll: self.camera_orientation.roll,
            horizontal_fov: self.fov.horizontal,
            vertical_fov: self.fov.vertical,
            frame_center: None,
        }
    }
}

pub fn parse_eoir_metadata(json: &str) -> Result<EoirMetadata, ReportError> {
    serde_json::from_str(json).map_err(ReportError::EoirMetadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fusion::SensorKind;

    const BATCH: &str = r#"{
        "timestamp": "2024-05-01T12:00:00Z",
        "ships": [
            {"name": "Nordic Star", "imo": "9321483", "mmsi": "244123456",
             "lat": 51.95, "lon": 4.05, "course": 90.0, "speed": 10.0},
            {"mmsi": "244000002", "lat": 51.96, "lon": 4.06}
        ]
    }"#;

    #[test]
    fn test_parse_batch() {
        let batch = parse_ais_batch(BATCH).unwrap();
        assert_eq!(batch.timestamp.as_deref(), Some("2024-05-01T12:00:00Z"));
        assert_eq!(batch.ships.len(), 2);
        assert_eq!(batch.ships[0].name, "Nordic Star");
        assert_eq!(batch.ships[1].name, "");
        assert_eq!(batch.ships[1].speed, 0.0);
    }

    #[test]
    fn test_empty_batch() {
        let batch = parse_ais_batch("{}").unwrap();
        assert!(batch.ships.is_empty());
        assert!(batch.timestamp.is_none());
    }

    #[test]
    fn test_ship_to_detection() {
        let batch = parse_ais_batch(BATCH).unwrap();
        let det = batch.ships[0].to_detection(5_000);
        assert_eq!(det.kind, SensorKind::Ais);
        assert_eq!(det.timestamp, 5_000);
        assert_eq!(det.identity_key().as_deref(), Some("AIS:244123456"));
        let v = det.velocity.unwrap();
        assert!(v.north.abs() < 1e-9);
        assert!((v.speed_knots() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_bad_batch() {
        let err = parse_ais_batch(r#"{"ships": [{"lat": 1.0}]}"#).unwrap_err();
        assert!(matches!(err, ReportError::AisBatch(_)));
        assert!(err.to_string().starts_with("invalid AIS batch"));
    }

    #[test]
    fn test_parse_eoir() {
        let json = r#"{
            "timestamp": "2024-05-01T12:00:01Z",
            "cameraPosition": {"lat": 51.9, "lon": 4.0},
            "cameraOrientation": {"azimuth": 45.0, "elevation": 80.0, "roll": 1.5},
            "fov": {"horizontal": 30.0, "vertical": 17.0}
        }"#;
        let meta = parse_eoir_metadata(json).unwrap();
        let pose = meta.to_pose(25.0);
        assert_eq!(pose.latitude, 51.9);
        assert_eq!(pose.altitude, 25.0);
        assert_eq!(pose.azimuth, 45.0);
        assert_eq!(pose.roll, 1.5);
        assert_eq!(pose.vertical_fov, 17.0);
        assert!(pose.frame_center.is_none());
    }

    #[test]
    fn test_bad_eoir() {
        let err = parse_eoir_metadata("not json").unwrap_err();
        assert!(matches!(err, ReportError::EoirMetadata(_)));
    }
}
