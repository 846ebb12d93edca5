//! Sensor simulator
//!
//! Generates a synthetic scenario feed: ships move on a fixed course and
//! speed, and an observing platform samples them with three sensors, each
//! on its own update interval:
//!
//! - AIS reports every transponder-equipped ship within range, one batch
//!   per update
//! - radar reports ships within range and inside its azimuth coverage
//!   around the platform heading
//! - EO/IR reports ships within range that fall inside the camera image,
//!   with an error that grows with distance
//!
//! Every reported position carries uniform noise of up to the sensor's
//! position error on each axis. Optionally the platform pose is published
//! as KLV telemetry, so overlay frames are produced too.
//!
//! The output is a list of [`FeedRecord`]s in time order, the same shape a
//! recorded feed has, so it runs through the regular replay path.

use std::path::Path;

use anyhow::Context;
use base64::Engine;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use seafuse_core::fusion::DetectionPosition;
use seafuse_core::geo::{enu_offset, GeoPoint, LocalPosition, Velocity};
use seafuse_core::klv::{KlvWriter, Tag};
use seafuse_core::projection::{Projector, SensorPose};
use seafuse_core::reports::{AisBatch, AisShip};

use crate::feed::FeedRecord;

/// Update rate, reach and accuracy of one sensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorSettings {
    #[serde(default = "enabled")]
    pub enabled: bool,
    /// Seconds between updates
    pub interval: f64,
    /// Maximum slant range in meters
    pub range: f64,
    /// Maximum position error per axis in meters
    pub position_error: f64,
    /// Azimuth coverage in degrees, centered on the platform heading.
    /// Only radar uses it.
    #[serde(default = "full_circle")]
    pub azimuth_coverage: f64,
}

fn enabled() -> bool {
    true
}

fn full_circle() -> f64 {
    360.0
}

impl SensorSettings {
    pub fn ais() -> Self {
        SensorSettings {
            enabled: true,
            interval: 5.0,
            range: 10_000.0,
            position_error: 10.0,
            azimuth_coverage: 360.0,
        }
    }

    pub fn radar() -> Self {
        SensorSettings {
            enabled: true,
            interval: 4.0,
            range: 80_000.0,
            position_error: 50.0,
            azimuth_coverage: 360.0,
        }
    }

    pub fn eoir() -> Self {
        SensorSettings {
            enabled: true,
            interval: 0.1,
            range: 15_000.0,
            position_error: 20.0,
            azimuth_coverage: 360.0,
        }
    }
}

/// The observing aircraft or mast carrying the sensors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Platform {
    pub lat: f64,
    pub lon: f64,
    /// Meters above sea level
    pub altitude: f64,
    /// Degrees from north; the radar coverage and camera point this way
    pub heading: f64,
    /// Camera elevation: 90 is level, 0 looks straight down
    pub elevation: f64,
    pub horizontal_fov: f64,
    pub vertical_fov: f64,
    /// Course over ground in degrees
    pub course: f64,
    /// Speed over ground in knots
    pub speed: f64,
}

impl Default for Platform {
    fn default() -> Self {
        Platform {
            lat: 0.0,
            lon: 0.0,
            altitude: 300.0,
            heading: 0.0,
            elevation: 85.0,
            horizontal_fov: 30.0,
            vertical_fov: 20.0,
            course: 0.0,
            speed: 0.0,
        }
    }
}

/// A ship moving at constant course and speed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatedShip {
    #[serde(default)]
    pub name: String,
    /// Random when absent; an empty string simulates a transponder
    /// without an MMSI
    #[serde(default)]
    pub mmsi: Option<String>,
    /// Random when absent
    #[serde(default)]
    pub imo: Option<String>,
    pub lat: f64,
    pub lon: f64,
    /// Degrees from north
    #[serde(default)]
    pub course: f64,
    /// Knots
    #[serde(default)]
    pub speed: f64,
    #[serde(default = "enabled")]
    pub ais_transponder: bool,
}

impl SimulatedShip {
    /// True position `elapsed` milliseconds into the scenario
    pub fn position_at(&self, elapsed: u64) -> GeoPoint {
        moved(
            GeoPoint::new(self.lat, self.lon),
            self.velocity(),
            elapsed,
        )
    }

    pub fn velocity(&self) -> Velocity {
        Velocity::from_course_speed(self.course, self.speed)
    }
}

/// Scenario file contents
///
/// A sensor block that is left out keeps that sensor's own defaults. One
/// that is given must name its interval, range and position error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Scenario {
    /// Fixed seed for a repeatable run
    pub seed: Option<u64>,
    /// Milliseconds since epoch of the first sample
    pub start_time: u64,
    /// Seconds to simulate
    pub duration: f64,
    pub platform: Platform,
    pub ais: SensorSettings,
    pub radar: SensorSettings,
    pub eoir: SensorSettings,
    /// Seconds between KLV telemetry packets; none when absent
    pub klv_interval: Option<f64>,
    pub ships: Vec<SimulatedShip>,
}

impl Default for Scenario {
    fn default() -> Self {
        Scenario {
            seed: None,
            start_time: 0,
            duration: 60.0,
            platform: Platform::default(),
            ais: SensorSettings::ais(),
            radar: SensorSettings::radar(),
            eoir: SensorSettings::eoir(),
            klv_interval: None,
            ships: Vec::new(),
        }
    }
}

pub async fn load_scenario(path: &Path) -> anyhow::Result<Scenario> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Cannot read scenario {}", path.display()))?;
    let scenario = serde_json::from_str(&text)
        .with_context(|| format!("Invalid scenario {}", path.display()))?;
    Ok(scenario)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Channel {
    Ais,
    Radar,
    Eoir,
    Klv,
}

/// One scheduled output stream
#[derive(Debug)]
struct Schedule {
    channel: Channel,
    interval: u64,
    next: u64,
}

impl Schedule {
    fn new(channel: Channel, interval: f64) -> Self {
        Schedule {
            channel,
            interval: seconds_to_ms(interval).max(1),
            next: 0,
        }
    }

    fn advance(&mut self) {
        self.next += self.interval;
    }
}

pub struct Simulator {
    scenario: Scenario,
    rng: StdRng,
    schedules: Vec<Schedule>,
}

impl Simulator {
    pub fn new(mut scenario: Scenario) -> Self {
        let mut rng = match scenario.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        for ship in &mut scenario.ships {
            if ship.mmsi.is_none() {
                ship.mmsi = Some(random_mmsi(&mut rng));
            }
            if ship.imo.is_none() {
                ship.imo = Some(format!("IMO{}", rng.random_range(1_000_000..10_000_000)));
            }
            log::debug!(
                "Simulated ship {} MMSI {:?} at {:.5},{:.5}, {:.0}° {:.1} kn",
                ship.name,
                ship.mmsi,
                ship.lat,
                ship.lon,
                ship.course,
                ship.speed
            );
        }

        let mut schedules = Vec::new();
        for (channel, sensor) in [
            (Channel::Ais, &scenario.ais),
            (Channel::Radar, &scenario.radar),
            (Channel::Eoir, &scenario.eoir),
        ] {
            if sensor.enabled {
                schedules.push(Schedule::new(channel, sensor.interval));
            }
        }
        if let Some(interval) = scenario.klv_interval {
            schedules.push(Schedule::new(Channel::Klv, interval));
        }

        Simulator {
            scenario,
            rng,
            schedules,
        }
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    /// Camera pose `elapsed` milliseconds into the scenario
    pub fn platform_pose(&self, elapsed: u64) -> SensorPose {
        let platform = &self.scenario.platform;
        let position = moved(
            GeoPoint::new(platform.lat, platform.lon),
            Velocity::from_course_speed(platform.course, platform.speed),
            elapsed,
        );
        SensorPose {
            latitude: position.lat,
            longitude: position.lon,
            altitude: platform.altitude,
            azimuth: platform.heading,
            elevation: platform.elevation,
            roll: 0.0,
            horizontal_fov: platform.horizontal_fov,
            vertical_fov: platform.vertical_fov,
            frame_center: None,
        }
    }

    /// Run the whole scenario
    ///
    /// Each sensor samples at the start and then once per interval, up to
    /// and including the end. Samples due at the same time come out in
    /// AIS, radar, EO/IR, KLV order.
    pub fn generate(&mut self) -> Vec<FeedRecord> {
        let end = seconds_to_ms(self.scenario.duration);
        let mut records = Vec::new();

        loop {
            let Some(index) = self
                .schedules
                .iter()
                .enumerate()
                .min_by_key(|(_, s)| s.next)
                .map(|(i, _)| i)
            else {
                break;
            };
            let elapsed = self.schedules[index].next;
            if elapsed > end {
                break;
            }
            let channel = self.schedules[index].channel;
            self.schedules[index].advance();

            match channel {
                Channel::Ais => records.extend(self.sample_ais(elapsed)),
                Channel::Radar => records.extend(self.sample_radar(elapsed)),
                Channel::Eoir => records.extend(self.sample_eoir(elapsed)),
                Channel::Klv => records.push(self.telemetry(elapsed)),
            }
        }

        log::info!(
            "Simulated {} s with {} ships: {} records",
            self.scenario.duration,
            self.scenario.ships.len(),
            records.len()
        );
        records
    }

    fn sample_ais(&mut self, elapsed: u64) -> Option<FeedRecord> {
        let pose = self.platform_pose(elapsed);
        let sensor = self.scenario.ais.clone();
        let mut ships = Vec::new();

        for i in 0..self.scenario.ships.len() {
            let ship = &self.scenario.ships[i];
            if !ship.ais_transponder {
                continue;
            }
            let truth = ship.position_at(elapsed);
            let range = slant_range(&pose, &truth);
            if range > sensor.range {
                continue;
            }
            let report = AisShip {
                name: ship.name.clone(),
                imo: ship.imo.clone().unwrap_or_default(),
                mmsi: ship.mmsi.clone().unwrap_or_default(),
                lat: 0.0,
                lon: 0.0,
                course: ship.course,
                speed: ship.speed,
            };
            log::trace!("[AIS] {} at {:.1} m", report.name, range);
            let reported = self.jitter(&truth, sensor.position_error);
            ships.push(AisShip {
                lat: reported.lat,
                lon: reported.lon,
                ..report
            });
        }

        if ships.is_empty() {
            return None;
        }
        Some(FeedRecord::Ais {
            time: Some(self.scenario.start_time + elapsed),
            batch: AisBatch {
                timestamp: None,
                ships,
            },
        })
    }

    fn sample_radar(&mut self, elapsed: u64) -> Vec<FeedRecord> {
        let pose = self.platform_pose(elapsed);
        let sensor = self.scenario.radar.clone();
        let time = self.scenario.start_time + elapsed;
        let mut records = Vec::new();

        for i in 0..self.scenario.ships.len() {
            let ship = &self.scenario.ships[i];
            let truth = ship.position_at(elapsed);
            let velocity = ship.velocity();
            let range = slant_range(&pose, &truth);
            if range > sensor.range {
                continue;
            }
            let off_axis = relative_bearing(&pose, &truth);
            if off_axis.abs() > sensor.azimuth_coverage / 2.0 {
                continue;
            }
            log::trace!("[Radar] {} at {:.1} m, {:.1}°", ship.name, range, off_axis);
            let reported = self.jitter(&truth, sensor.position_error);
            records.push(FeedRecord::Radar {
                time,
                position: DetectionPosition::Geodetic(reported),
                velocity: Some(velocity),
            });
        }
        records
    }

    fn sample_eoir(&mut self, elapsed: u64) -> Vec<FeedRecord> {
        let pose = self.platform_pose(elapsed);
        let projector = Projector::new(&pose, 1000, 1000);
        let sensor = self.scenario.eoir.clone();
        let time = self.scenario.start_time + elapsed;
        let mut records = Vec::new();

        for i in 0..self.scenario.ships.len() {
            let ship = &self.scenario.ships[i];
            let truth = ship.position_at(elapsed);
            let range = slant_range(&pose, &truth);
            if range > sensor.range || projector.project_point(&truth).is_culled() {
                continue;
            }
            log::trace!("[EOIR] {} at {:.1} m", ship.name, range);
            // Error grows with distance
            let error = sensor.position_error * range / sensor.range;
            let reported = self.jitter(&truth, error);
            records.push(FeedRecord::Eoir {
                time,
                position: DetectionPosition::Geodetic(reported),
            });
        }
        records
    }

    fn telemetry(&self, elapsed: u64) -> FeedRecord {
        let time = self.scenario.start_time + elapsed;
        let pose = self.platform_pose(elapsed);
        let bytes = KlvWriter::new()
            .timestamp(time * 1000)
            .scaled(Tag::SensorLatitude, pose.latitude, 4)
            .scaled(Tag::SensorLongitude, pose.longitude, 4)
            .scaled(Tag::SensorAltitude, pose.altitude, 2)
            .scaled(Tag::HorizontalFov, pose.horizontal_fov, 2)
            .scaled(Tag::VerticalFov, pose.vertical_fov, 2)
            .scaled(Tag::SensorAzimuth, pose.azimuth.rem_euclid(360.0), 2)
            .scaled(Tag::SensorElevation, pose.elevation, 2)
            .finish_with_envelope();
        FeedRecord::Klv {
            time: Some(time),
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }

    /// Uniform error of up to `magnitude` meters on each axis
    fn jitter(&mut self, truth: &GeoPoint, magnitude: f64) -> GeoPoint {
        if !(magnitude > 0.0) {
            return *truth;
        }
        let east = self.rng.random_range(-magnitude..=magnitude);
        let north = self.rng.random_range(-magnitude..=magnitude);
        LocalPosition::new(east, north).to_geo(truth)
    }
}

/// Nine digits, the first between 2 and 7
fn random_mmsi(rng: &mut StdRng) -> String {
    format!(
        "{}{:08}",
        rng.random_range(2..=7),
        rng.random_range(0..100_000_000)
    )
}

fn moved(start: GeoPoint, velocity: Velocity, elapsed: u64) -> GeoPoint {
    let seconds = elapsed as f64 / 1000.0;
    LocalPosition::new(velocity.east * seconds, velocity.north * seconds).to_geo(&start)
}

fn slant_range(pose: &SensorPose, target: &GeoPoint) -> f64 {
    pose.position().distance_to(target).hypot(pose.altitude)
}

/// Bearing of `target` relative to the platform heading, in (-180, 180]
fn relative_bearing(pose: &SensorPose, target: &GeoPoint) -> f64 {
    let (east, north) = enu_offset(&pose.position(), target);
    let bearing = east.atan2(north).to_degrees();
    let relative = (bearing - pose.azimuth).rem_euclid(360.0);
    if relative > 180.0 {
        relative - 360.0
    } else {
        relative
    }
}

fn seconds_to_ms(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    }
}
