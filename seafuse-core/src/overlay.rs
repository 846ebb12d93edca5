//! Overlay lists for the renderer
//!
//! Pairs each vessel with its pixel position for one camera frame. Lists are
//! index-aligned with their input; vessels out of view keep their slot with
//! an [`ImagePoint::CULLED`] point.

use serde::{Deserialize, Serialize};

use crate::fusion::Track;
use crate::projection::{ImagePoint, Projector, SensorPose};
use crate::reports::AisShip;

/// One labelled marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    /// MMSI for AIS ships, track id for tracks
    pub id: String,
    pub label: String,
    pub point: ImagePoint,
}

impl Overlay {
    pub fn is_visible(&self) -> bool {
        !self.point.is_culled()
    }
}

pub fn overlay_ships(
    pose: &SensorPose,
    image_width: u32,
    image_height: u32,
    ships: &[AisShip],
) -> Vec<Overlay> {
    if ships.is_empty() {
        return Vec::new();
    }
    let projector = Projector::new(pose, image_width, image_height);
    ships
        .iter()
        .map(|ship| Overlay {
            id: ship.mmsi.clone(),
            label: ship.identity().display_name().to_string(),
            point: projector.project_point(&ship.position()),
        })
        .collect()
}

pub fn overlay_tracks(
    pose: &SensorPose,
    image_width: u32,
    image_height: u32,
    tracks: &[Track],
) -> Vec<Overlay> {
    if tracks.is_empty() {
        return Vec::new();
    }
    let projector = Projector::new(pose, image_width, image_height);
    tracks
        .iter()
        .map(|track| Overlay {
            id: track.id.clone(),
            label: track.label().to_string(),
            point: projector.project_point(&track.location),
        })
        .collect()
}
