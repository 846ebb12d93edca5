//! Multi-sensor Track Fusion
//!
//! Merges AIS reports, radar returns and EO/IR detections into one table of
//! vessel tracks.
//!
//! # Architecture
//!
//! - **types**: sensors, detections, tracks, events and settings
//! - **correlator**: the track table and the association rules
//!
//! Association is nearest-neighbor on raw positions in a local metric
//! plane. There is no motion model: a track sits where its last detection
//! put it.
//!
//! # Usage
//!
//! ```
//! use seafuse_core::fusion::{Detection, DetectionPosition, FusionSettings, TrackCorrelator};
//! use seafuse_core::geo::LocalPosition;
//!
//! let mut correlator = TrackCorrelator::new(FusionSettings::default());
//! let at = |e, n| DetectionPosition::Local(LocalPosition::new(e, n));
//!
//! correlator.process_detection(Detection::radar(at(0.0, 0.0), None, 0));
//! correlator.process_detection(Detection::eoir(at(40.0, 10.0), 1_000));
//!
//! assert_eq!(correlator.len(), 1);
//! assert_eq!(correlator.drain_events().len(), 2);
//! ```

mod correlator;
mod types;

pub use correlator::{Association, Processed, TrackCorrelator};
pub use types::{
    Detection, DetectionPosition, FusionSettings, IdentityConfidence, SensorKind, SensorSet,
    ShipIdentity, Track, TrackEvent, TrackHandle, TrackState,
};
