//! SeaFuse Core
//!
//! Platform-independent building blocks for fusing vessel detections from
//! AIS, radar and EO/IR sensors, and for placing those vessels on the image
//! of a moving camera.
//!
//! This crate performs no I/O and carries no async runtime. Hosts feed it
//! bytes and reports; it hands back records, pixel coordinates and track
//! lifecycle events.
//!
//! # Modules
//!
//! - [`klv`]: binary telemetry (KLV local set) decoder producing the camera pose
//! - [`projection`]: geodetic to image-plane projector
//! - [`fusion`]: track correlator / fusion engine
//! - [`geo`]: geodetic points and the local East-North-Up plane
//! - [`reports`]: JSON AIS batches and EO/IR metadata
//! - [`overlay`]: index-aligned `(identity, pixel)` lists for the renderer
//!
//! # Example
//!
//! ```rust,ignore
//! use seafuse_core::fusion::{FusionSettings, TrackCorrelator};
//! use seafuse_core::reports::parse_ais_batch;
//!
//! let mut correlator = TrackCorrelator::new(FusionSettings::default());
//! let batch = parse_ais_batch(json)?;
//! correlator.process_ais_batch(&batch, now_ms);
//! for event in correlator.drain_events() {
//!     // hand to the renderer
//! }
//! ```

pub mod fusion;
pub mod geo;
pub mod klv;
pub mod overlay;
pub mod projection;
pub mod reports;

pub use fusion::{
    Detection, FusionSettings, IdentityConfidence, SensorKind, SensorSet, Track, TrackCorrelator,
    TrackEvent, TrackHandle, TrackState,
};
pub use geo::{GeoPoint, LocalPosition};
pub use klv::{decode, DecodeError, Decoded, MetadataRecord};
pub use projection::{project, ImagePoint, SensorPose};
