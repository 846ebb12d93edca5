use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use serde::{Deserialize, Serialize};

use seafuse_core::fusion::FusionSettings;
use seafuse_core::geo::GeoPoint;
use seafuse_core::klv::MetadataRecord;
use seafuse_core::projection::SensorPose;

use crate::fusion::Clock;

#[derive(Parser, Clone, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub verbose: Verbosity<InfoLevel>,

    /// Maximum distance in meters to associate a detection with a track
    #[arg(long, default_value_t = 500.0)]
    pub correlation_distance: f64,

    /// Maximum track age in seconds for association
    #[arg(long, default_value_t = 30.0)]
    pub correlation_time: f64,

    /// Seconds without updates before a track is dropped
    #[arg(long, default_value_t = 120.0)]
    pub inactivity_timeout: f64,

    /// Observations before a track is confirmed
    #[arg(long, default_value_t = 3)]
    pub confirmation_threshold: u32,

    /// Seconds between inactivity sweeps
    #[arg(long, default_value_t = 5.0)]
    pub sweep_interval: f64,

    /// Latitude of the local plane origin
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub origin_lat: f64,

    /// Longitude of the local plane origin
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub origin_lon: f64,

    #[arg(long, default_value_t = 1920)]
    pub image_width: u32,

    #[arg(long, default_value_t = 1080)]
    pub image_height: u32,

    /// Horizontal field of view used when telemetry omits it
    #[arg(long)]
    pub fov_horizontal: Option<f64>,

    /// Vertical field of view used when telemetry omits it
    #[arg(long)]
    pub fov_vertical: Option<f64>,

    /// Camera altitude in meters for EO/IR metadata, which carries none
    #[arg(long, default_value_t = 10.0)]
    pub camera_altitude: f64,

    /// Only overlay confirmed tracks
    #[arg(long)]
    pub confirmed_only: bool,

    /// Scenario file with one JSON record per line
    #[arg(long)]
    pub feed: Option<PathBuf>,

    /// Raw KLV telemetry packets, one per file
    #[arg(long)]
    pub klv: Vec<PathBuf>,

    /// Simulate sensors from a scenario file (JSON) instead of a feed
    #[arg(long, conflicts_with = "feed")]
    pub simulate: Option<PathBuf>,

    /// Also write the simulated records as a feed file
    #[arg(long, requires = "simulate")]
    pub save_feed: Option<PathBuf>,

    /// Drive the sweep from record timestamps instead of the wall clock.
    /// Implied by --feed and --simulate.
    #[arg(long)]
    pub replay: bool,

    /// Sweep on the wall clock even for recorded or simulated input
    #[arg(long, conflicts_with = "replay")]
    pub wall_clock: bool,

    /// Depth of the fusion command queue
    #[arg(long, default_value_t = 256)]
    pub queue_size: usize,
}

impl Cli {
    pub fn fusion_settings(&self) -> FusionSettings {
        FusionSettings {
            correlation_distance: self.correlation_distance,
            correlation_time: self.correlation_time,
            inactivity_timeout: self.inactivity_timeout,
            confirmation_threshold: self.confirmation_threshold,
            origin: GeoPoint::new(self.origin_lat, self.origin_lon),
        }
    }

    pub fn projection_settings(&self) -> ProjectionSettings {
        ProjectionSettings {
            image_width: self.image_width,
            image_height: self.image_height,
            horizontal_fov: self.fov_horizontal,
            vertical_fov: self.fov_vertical,
            camera_altitude: self.camera_altitude,
            confirmed_only: self.confirmed_only,
        }
    }

    /// Recorded and simulated input carries its own time; sweeping it
    /// against the wall clock would expire every track at once
    pub fn clock(&self) -> Clock {
        if self.wall_clock {
            Clock::Wall
        } else if self.replay || self.feed.is_some() || self.simulate.is_some() {
            Clock::Replay
        } else {
            Clock::Wall
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        if self.sweep_interval.is_finite() && self.sweep_interval > 0.0 {
            Duration::from_secs_f64(self.sweep_interval)
        } else {
            DEFAULT_SWEEP_INTERVAL
        }
    }
}

pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5);

/// How overlay frames are produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectionSettings {
    pub image_width: u32,
    pub image_height: u32,
    /// Fallback when telemetry has no horizontal FOV
    pub horizontal_fov: Option<f64>,
    /// Fallback when telemetry has no vertical FOV
    pub vertical_fov: Option<f64>,
    pub camera_altitude: f64,
    pub confirmed_only: bool,
}

impl Default for ProjectionSettings {
    fn default() -> Self {
        ProjectionSettings {
            image_width: 1920,
            image_height: 1080,
            horizontal_fov: None,
            vertical_fov: None,
            camera_altitude: 10.0,
            confirmed_only: false,
        }
    }
}

impl ProjectionSettings {
    /// Pose from accumulated telemetry, with the configured FOV fallbacks
    pub fn pose_from(&self, record: &MetadataRecord) -> Option<SensorPose> {
        let mut record = record.clone();
        record.horizontal_fov = record.horizontal_fov.or(self.horizontal_fov);
        record.vertical_fov = record.vertical_fov.or(self.vertical_fov);
        record.to_pose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_core() {
        let cli = Cli::parse_from(["seafuse-server"]);
        assert_eq!(cli.fusion_settings(), FusionSettings::default());
        assert_eq!(cli.projection_settings(), ProjectionSettings::default());
        assert_eq!(cli.sweep_interval(), DEFAULT_SWEEP_INTERVAL);
        assert!(!cli.replay);
        assert_eq!(cli.clock(), Clock::Wall);
    }

    #[test]
    fn test_recorded_input_uses_replay_clock() {
        let cli = Cli::parse_from(["seafuse-server", "--feed", "scenario.jsonl"]);
        assert_eq!(cli.clock(), Clock::Replay);

        let cli = Cli::parse_from(["seafuse-server", "--simulate", "ships.json"]);
        assert_eq!(cli.clock(), Clock::Replay);

        let cli = Cli::parse_from(["seafuse-server", "--feed", "live.pipe", "--wall-clock"]);
        assert_eq!(cli.clock(), Clock::Wall);

        assert!(Cli::try_parse_from(["seafuse-server", "--replay", "--wall-clock"]).is_err());
        assert!(Cli::try_parse_from(["seafuse-server", "--save-feed", "out.jsonl"]).is_err());
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::parse_from([
            "seafuse-server",
            "--correlation-distance",
            "250",
            "--origin-lat",
            "-33.9",
            "--origin-lon",
            "18.4",
            "--klv",
            "a.klv",
            "--klv",
            "b.klv",
            "--sweep-interval",
            "0",
            "--replay",
        ]);
        let settings = cli.fusion_settings();
        assert_eq!(settings.correlation_distance, 250.0);
        assert_eq!(settings.origin, GeoPoint::new(-33.9, 18.4));
        assert_eq!(cli.klv.len(), 2);
        assert_eq!(cli.sweep_interval(), DEFAULT_SWEEP_INTERVAL);
        assert!(cli.replay);
    }

    #[test]
    fn test_pose_uses_fov_fallback() {
        let record = MetadataRecord {
            sensor_latitude: Some(1.0),
            sensor_longitude: Some(2.0),
            sensor_altitude: Some(100.0),
            ..Default::default()
        };
        assert!(ProjectionSettings::default().pose_from(&record).is_none());

        let settings = ProjectionSettings {
            horizontal_fov: Some(30.0),
            vertical_fov: Some(20.0),
            ..Default::default()
        };
        let pose = settings.pose_from(&record).unwrap();
        assert_eq!(pose.horizontal_fov, 30.0);
        assert_eq!(pose.altitude, 100.0);
    }
}
