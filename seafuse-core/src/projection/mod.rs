//! Geodetic to image-plane projection
//!
//! Places targets given as latitude/longitude on the image of a camera whose
//! pose comes from the telemetry decoder. The model is a pinhole camera over
//! a local East-North-Up plane centered on the sensor, with targets assumed
//! to sit at sea level.
//!
//! All intermediate math is `f64`; only the final pixel is narrowed to `f32`.
//!
//! # Example
//!
//! ```
//! use seafuse_core::geo::GeoPoint;
//! use seafuse_core::projection::{project, SensorPose};
//!
//! let pose = SensorPose {
//!     latitude: 0.0,
//!     longitude: 0.0,
//!     altitude: 1000.0,
//!     azimuth: 0.0,
//!     elevation: 45.0,
//!     roll: 0.0,
//!     horizontal_fov: 30.0,
//!     vertical_fov: 20.0,
//!     frame_center: Some(GeoPoint::new(0.01, 0.0)),
//! };
//! let points = project(&pose, 1920, 1080, &[GeoPoint::new(0.01, 0.0)]);
//! assert!((points[0].x - 960.0).abs() < 0.5);
//! assert!((points[0].y - 540.0).abs() < 0.5);
//! ```

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::geo::{enu_offset, GeoPoint};

mod camera;

pub use camera::{BasisSource, CameraBasis};

/// Camera pose for one telemetry frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorPose {
    /// Sensor latitude in degrees
    pub latitude: f64,
    /// Sensor longitude in degrees
    pub longitude: f64,
    /// Sensor altitude above sea level in meters
    pub altitude: f64,
    /// Line-of-sight bearing, degrees clockwise from true north
    pub azimuth: f64,
    /// Line-of-sight elevation in degrees: 90 is level, 0 looks straight down
    pub elevation: f64,
    /// Roll about the line of sight in degrees
    pub roll: f64,
    /// Horizontal field of view in degrees
    pub horizontal_fov: f64,
    /// Vertical field of view in degrees
    pub vertical_fov: f64,
    /// Ground point at the image center, if the telemetry carries it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_center: Option<GeoPoint>,
}

impl SensorPose {
    /// Sensor position on the ground
    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }

    /// Depression of the line of sight below the horizon, as a signed pitch
    pub fn pitch(&self) -> f64 {
        self.elevation - 90.0
    }

    /// ENU vector in meters from the sensor to a sea-level target
    pub fn enu_to(&self, target: &GeoPoint) -> Vector3<f64> {
        let (east, north) = enu_offset(&self.position(), target);
        Vector3::new(east, north, -self.altitude)
    }

    fn fov_is_valid(&self) -> bool {
        let ok = |fov: f64| fov.is_finite() && fov > 0.0 && fov < 180.0;
        ok(self.horizontal_fov) && ok(self.vertical_fov)
    }
}

/// Pixel position on the image, origin at the top-left corner
///
/// Off-frame targets are reported as [`ImagePoint::CULLED`] so that output
/// lists stay index-aligned with their inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImagePoint {
    pub x: f32,
    pub y: f32,
}

impl ImagePoint {
    /// Sentinel for culled or off-frame targets
    pub const CULLED: ImagePoint = ImagePoint {
        x: -10000.0,
        y: -10000.0,
    };

    pub fn new(x: f32, y: f32) -> Self {
        ImagePoint { x, y }
    }

    pub fn is_culled(&self) -> bool {
        *self == ImagePoint::CULLED
    }
}

/// A pose bound to an image size, with the camera basis computed once
#[derive(Debug, Clone)]
pub struct Projector {
    pose: SensorPose,
    basis: Option<CameraBasis>,
    tan_half_h: f64,
    tan_half_v: f64,
    width: f64,
    height: f64,
}

impl Projector {
    pub fn new(pose: &SensorPose, image_width: u32, image_height: u32) -> Self {
        let usable = pose.fov_is_valid()
            && image_width > 0
            && image_height > 0
            && pose.latitude.is_finite()
            && pose.longitude.is_finite()
            && pose.altitude.is_finite();

        let basis = if usable {
            CameraBasis::for_pose(pose)
        } else {
            None
        };

        Projector {
            pose: *pose,
            basis,
            tan_half_h: (0.5 * pose.horizontal_fov).to_radians().tan(),
            tan_half_v: (0.5 * pose.vertical_fov).to_radians().tan(),
            width: image_width as f64,
            height: image_height as f64,
        }
    }

    /// The camera basis in use, `None` when the geometry is degenerate
    pub fn basis(&self) -> Option<&CameraBasis> {
        self.basis.as_ref()
    }

    /// Project one target
    pub fn project_point(&self, target: &GeoPoint) -> ImagePoint {
        let Some(basis) = &self.basis else {
            return ImagePoint::CULLED;
        };

        let cam = basis.to_camera(&self.pose.enu_to(target));
        if !(cam.z > 0.0) {
            return ImagePoint::CULLED;
        }

        let x_norm = cam.x / (cam.z * self.tan_half_h);
        let y_norm = cam.y / (cam.z * self.tan_half_v);
        if !x_norm.is_finite() || !y_norm.is_finite() || x_norm.abs() > 1.0 || y_norm.abs() > 1.0
        {
            return ImagePoint::CULLED;
        }

        let u = (x_norm * 0.5 + 0.5) * self.width;
        let v = (1.0 - (y_norm * 0.5 + 0.5)) * self.height;
        ImagePoint::new(u as f32, v as f32)
    }

    /// Project every target, index-aligned with the input
    pub fn project(&self, targets: &[GeoPoint]) -> Vec<ImagePoint> {
        targets.iter().map(|t| self.project_point(t)).collect()
    }
}

/// Project targets onto the image of a camera at `pose`
///
/// Pure and deterministic. The result has one entry per target; targets
/// behind the camera, outside the field of view, or under degenerate
/// geometry come back as [`ImagePoint::CULLED`].
pub fn project(
    pose: &SensorPose,
    image_width: u32,
    image_height: u32,
    targets: &[GeoPoint],
) -> Vec<ImagePoint> {
    if targets.is_empty() {
        return Vec::new();
    }
    Projector::new(pose, image_width, image_height).project(targets)
}

/// Rotation whose rows are the camera's right, up and forward axes in ENU
pub fn rotation_from_axes(
    right: &Vector3<f64>,
    up: &Vector3<f64>,
    forward: &Vector3<f64>,
) -> Matrix3<f64> {
    Matrix3::from_rows(&[right.transpose(), up.transpose(), forward.transpose()])
}
