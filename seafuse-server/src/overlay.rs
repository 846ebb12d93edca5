//! Overlay frames
//!
//! Keeps the running camera pose from KLV telemetry or EO/IR metadata and
//! turns the current track table into one labelled pixel list per frame.

use serde::{Deserialize, Serialize};

use seafuse_core::fusion::Track;
use seafuse_core::klv::{self, DecodeError, MetadataRecord};
use seafuse_core::overlay::{overlay_tracks, Overlay};
use seafuse_core::projection::SensorPose;
use seafuse_core::reports::EoirMetadata;

use crate::config::ProjectionSettings;

/// Where a frame's pose came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoseSource {
    Klv,
    Camera,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayFrame {
    pub time: u64,
    pub source: PoseSource,
    pub pose: SensorPose,
    pub overlays: Vec<Overlay>,
}

impl OverlayFrame {
    pub fn visible(&self) -> usize {
        self.overlays.iter().filter(|o| o.is_visible()).count()
    }
}

pub struct FrameBuilder {
    settings: ProjectionSettings,
    /// Telemetry accumulated over all packets so far
    telemetry: MetadataRecord,
    pose: Option<(PoseSource, SensorPose)>,
}

impl FrameBuilder {
    pub fn new(settings: ProjectionSettings) -> Self {
        FrameBuilder {
            settings,
            telemetry: MetadataRecord::default(),
            pose: None,
        }
    }

    pub fn pose(&self) -> Option<&SensorPose> {
        self.pose.as_ref().map(|(_, pose)| pose)
    }

    pub fn telemetry(&self) -> &MetadataRecord {
        &self.telemetry
    }

    /// Fold a KLV packet into the running telemetry
    ///
    /// Returns the packet's own timestamp in milliseconds, if it had one.
    /// Packets without recognized data leave the pose untouched.
    pub fn apply_klv(&mut self, bytes: &[u8]) -> Result<Option<u64>, DecodeError> {
        log::trace!("KLV packet: {:02X?}", bytes);
        let decoded = klv::decode(bytes)?;
        if let Some(truncation) = &decoded.truncation {
            log::warn!(
                "KLV packet truncated after {} items: {}",
                decoded.items,
                truncation
            );
        }
        if decoded.unknown_items > 0 {
            log::debug!("Skipped {} unknown KLV items", decoded.unknown_items);
        }

        self.telemetry.merge(&decoded.record);
        match self.settings.pose_from(&self.telemetry) {
            Some(pose) => self.pose = Some((PoseSource::Klv, pose)),
            None => log::debug!("Telemetry does not yet describe a full pose"),
        }
        // Origin timestamps are in microseconds
        Ok(decoded.record.timestamp.map(|us| us / 1000))
    }

    pub fn apply_camera(&mut self, metadata: &EoirMetadata) {
        let pose = metadata.to_pose(self.settings.camera_altitude);
        self.pose = Some((PoseSource::Camera, pose));
    }

    /// Project the tracks with the current pose
    pub fn frame(&self, time: u64, tracks: &[Track]) -> Option<OverlayFrame> {
        let (source, pose) = self.pose.as_ref()?;
        let overlays = if self.settings.confirmed_only {
            let confirmed: Vec<Track> =
                tracks.iter().filter(|t| t.is_confirmed()).cloned().collect();
            overlay_tracks(
                pose,
                self.settings.image_width,
                self.settings.image_height,
                &confirmed,
            )
        } else {
            overlay_tracks(
                pose,
                self.settings.image_width,
                self.settings.image_height,
                tracks,
            )
        };
        Some(OverlayFrame {
            time,
            source: *source,
            pose: *pose,
            overlays,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seafuse_core::fusion::{Detection, DetectionPosition, FusionSettings, TrackCorrelator};
    use seafuse_core::geo::GeoPoint;
    use seafuse_core::klv::{KlvWriter, Tag};
    use seafuse_core::reports::{CameraOrientation, FieldOfView};

    fn telemetry() -> Vec<u8> {
        KlvWriter::new()
            .timestamp(1_700_000_000_000_000)
            .scaled(Tag::SensorLatitude, 52.0, 4)
            .scaled(Tag::SensorLongitude, 4.0, 4)
            .scaled(Tag::SensorAltitude, 300.0, 2)
            .scaled(Tag::HorizontalFov, 40.0, 2)
            .scaled(Tag::VerticalFov, 24.0, 2)
            .scaled(Tag::SensorElevation, 80.0, 2)
            .finish_with_envelope()
    }

    fn tracks() -> Vec<Track> {
        let origin = GeoPoint::new(52.0, 4.0);
        let mut correlator = TrackCorrelator::new(FusionSettings {
            origin,
            ..Default::default()
        });
        let ahead = GeoPoint::new(52.01, 4.0);
        for t in 0..3 {
            correlator.process_detection(Detection::radar(
                DetectionPosition::Geodetic(ahead),
                None,
                t,
            ));
        }
        correlator.snapshot()
    }

    #[test]
    fn test_no_pose_no_frame() {
        let builder = FrameBuilder::new(ProjectionSettings::default());
        assert!(builder.frame(0, &tracks()).is_none());
    }

    #[test]
    fn test_klv_pose() {
        let mut builder = FrameBuilder::new(ProjectionSettings::default());
        let time = builder.apply_klv(&telemetry()).unwrap();
        assert_eq!(time, Some(1_700_000_000_000));

        let pose = builder.pose().unwrap();
        assert!((pose.latitude - 52.0).abs() < 1e-6);
        assert!((pose.altitude - 300.0).abs() < 0.5);

        let frame = builder.frame(5, &tracks()).unwrap();
        assert_eq!(frame.source, PoseSource::Klv);
        assert_eq!(frame.overlays.len(), 3);
        assert_eq!(frame.time, 5);
    }

    #[test]
    fn test_partial_klv_keeps_pose() {
        let mut builder = FrameBuilder::new(ProjectionSettings::default());
        builder.apply_klv(&telemetry()).unwrap();
        let update = KlvWriter::new()
            .scaled(Tag::SensorAzimuth, 90.0, 2)
            .finish();
        assert_eq!(builder.apply_klv(&update).unwrap(), None);
        let pose = builder.pose().unwrap();
        assert!((pose.azimuth - 90.0).abs() < 0.01);
        assert!((pose.latitude - 52.0).abs() < 1e-6);
    }

    #[test]
    fn test_bad_klv() {
        let mut builder = FrameBuilder::new(ProjectionSettings::default());
        assert!(builder.apply_klv(&[0xFF]).is_err());
        assert!(builder.pose().is_none());
    }

    #[test]
    fn test_camera_pose_and_confirmed_filter() {
        let mut builder = FrameBuilder::new(ProjectionSettings {
            confirmed_only: true,
            camera_altitude: 30.0,
            ..Default::default()
        });
        builder.apply_camera(&EoirMetadata {
            timestamp: None,
            camera_position: GeoPoint::new(52.0, 4.0),
            camera_orientation: CameraOrientation {
                azimuth: 0.0,
                elevation: 89.0,
                roll: 0.0,
            },
            fov: FieldOfView {
                horizontal: 40.0,
                vertical: 24.0,
            },
        });

        // Three radar returns at one spot: one track per return, none confirmed
        let frame = builder.frame(0, &tracks()).unwrap();
        assert_eq!(frame.source, PoseSource::Camera);
        assert_eq!(frame.pose.altitude, 30.0);
        assert!(frame.overlays.is_empty());
        assert_eq!(frame.visible(), 0);
    }
}
