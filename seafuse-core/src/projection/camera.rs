//! Camera basis construction
//!
//! Two ways to orient the camera in the ENU frame:
//!
//! | Source | Forward axis | Notes |
//! |--------|--------------|-------|
//! | Frame center | Sensor → frame-center ground point | Preferred; absorbs gimbal and attitude errors |
//! | Orientation | From azimuth and elevation | Roll is applied about forward |
//!
//! Both build `right = world_up × forward` and `up = forward × right`, and
//! store the three axes as the rows of the rotation.

use nalgebra::{Matrix3, Vector3};

use super::{rotation_from_axes, SensorPose};

// Below this length a vector is treated as zero
const MIN_NORM: f64 = 1e-9;

/// Which pose fields produced the basis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasisSource {
    FrameCenter,
    Orientation,
}

/// ENU → camera rotation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraBasis {
    rotation: Matrix3<f64>,
    source: BasisSource,
}

impl CameraBasis {
    /// Pick the frame-center basis when possible, else the orientation basis
    pub fn for_pose(pose: &SensorPose) -> Option<CameraBasis> {
        CameraBasis::from_frame_center(pose).or_else(|| CameraBasis::from_orientation(pose))
    }

    /// Forward axis aimed at the declared frame center
    pub fn from_frame_center(pose: &SensorPose) -> Option<CameraBasis> {
        let center = pose.frame_center?;
        if !center.lat.is_finite() || !center.lon.is_finite() {
            return None;
        }
        let forward = pose.enu_to(&center).try_normalize(MIN_NORM)?;
        let rotation = look_along(&forward, &heading(pose.azimuth))?;
        Some(CameraBasis {
            rotation,
            source: BasisSource::FrameCenter,
        })
    }

    /// Forward axis from azimuth and elevation, then rolled
    pub fn from_orientation(pose: &SensorPose) -> Option<CameraBasis> {
        let azimuth = pose.azimuth.to_radians();
        let pitch = pose.pitch().to_radians();
        let forward = Vector3::new(
            azimuth.sin() * pitch.cos(),
            azimuth.cos() * pitch.cos(),
            pitch.sin(),
        )
        .try_normalize(MIN_NORM)?;

        let level = look_along(&forward, &heading(pose.azimuth))?;
        let right: Vector3<f64> = level.row(0).transpose();
        let up: Vector3<f64> = level.row(1).transpose();

        let roll = pose.roll.to_radians();
        let (sin_r, cos_r) = roll.sin_cos();
        let rolled_right = right * cos_r + up * sin_r;
        let rolled_up = up * cos_r - right * sin_r;

        let rotation = rotation_from_axes(&rolled_right, &rolled_up, &forward);
        if rotation.iter().all(|v| v.is_finite()) {
            Some(CameraBasis {
                rotation,
                source: BasisSource::Orientation,
            })
        } else {
            None
        }
    }

    pub fn source(&self) -> BasisSource {
        self.source
    }

    pub fn right(&self) -> Vector3<f64> {
        self.rotation.row(0).transpose()
    }

    pub fn up(&self) -> Vector3<f64> {
        self.rotation.row(1).transpose()
    }

    pub fn forward(&self) -> Vector3<f64> {
        self.rotation.row(2).transpose()
    }

    /// Rotate an ENU vector into camera space (x right, y up, z forward)
    pub fn to_camera(&self, enu: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * enu
    }
}

fn heading(azimuth_deg: f64) -> Vector3<f64> {
    let a = azimuth_deg.to_radians();
    Vector3::new(a.sin(), a.cos(), 0.0)
}

// When forward is vertical, world_up × forward vanishes; the horizontal
// heading stands in for forward when picking the right axis.
fn look_along(forward: &Vector3<f64>, heading: &Vector3<f64>) -> Option<Matrix3<f64>> {
    let world_up = Vector3::z();
    let right = world_up
        .cross(forward)
        .try_normalize(MIN_NORM)
        .or_else(|| world_up.cross(heading).try_normalize(MIN_NORM))?;
    let up = forward.cross(&right).try_normalize(MIN_NORM)?;
    Some(rotation_from_axes(&right, &up, forward))
}
