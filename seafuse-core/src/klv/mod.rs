//! Binary telemetry metadata decoder
//!
//! Parses the KLV local set carried alongside an EO/IR video stream into a
//! [`MetadataRecord`]: sensor position, platform and sensor attitude, field
//! of view and the frame-center hint the projector prefers.
//!
//! # Wire format
//!
//! ```text
//! [ 06 0E 2B 34 .. (16-byte universal key) ][ BER length ][ payload ]   (optional envelope)
//!
//! payload = { tag: u8, len: u8, value: [u8; len] }*
//! ```
//!
//! Decoding never panics. A stream that breaks off halfway keeps the fields
//! decoded up to that point; a stream that carries no recognized tag is
//! reported as [`DecodeError::NoRecognizedData`] so the caller can wait for
//! the next frame.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::GeoPoint;
use crate::projection::SensorPose;

mod tags;
mod writer;

pub use tags::{Encoding, Tag, ALL_TAGS};
pub use writer::KlvWriter;

// =============================================================================
// Envelope
// =============================================================================

/// First four bytes of the 16-byte universal key that wraps a local set
pub const UNIVERSAL_KEY_PREFIX: [u8; 4] = [0x06, 0x0E, 0x2B, 0x34];

/// Length of the universal key
pub const UNIVERSAL_KEY_LEN: usize = 16;

// Key + at least one length byte + a few payload bytes
const MIN_ENVELOPE_LEN: usize = 21;

/// Why a stream was cut short
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Truncation {
    /// The envelope's BER length field runs past the buffer
    EnvelopeLength,
    /// An item declares more value bytes than remain
    ValueOverrun {
        tag: u8,
        offset: usize,
        declared: usize,
        remaining: usize,
    },
    /// Fewer bytes than a tag + length header are left over
    TrailingBytes { count: usize },
}

impl fmt::Display for Truncation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Truncation::EnvelopeLength => write!(f, "envelope length overruns buffer"),
            Truncation::ValueOverrun {
                tag,
                offset,
                declared,
                remaining,
            } => write!(
                f,
                "tag {} at offset {} declares {} bytes, {} remain",
                tag, offset, declared, remaining
            ),
            Truncation::TrailingBytes { count } => write!(f, "{} trailing byte(s)", count),
        }
    }
}

/// Decoder outcomes that carry no usable record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Less than a single item header
    #[error("buffer too short ({0} bytes)")]
    TooShort(usize),
    /// Well-formed stream without a single recognized tag
    #[error("no recognized metadata tags")]
    NoRecognizedData,
    /// Stream broke off before any recognized tag was decoded
    #[error("malformed metadata stream: {0}")]
    Malformed(Truncation),
}

// =============================================================================
// Record
// =============================================================================

/// Decoded telemetry frame
///
/// Every field is optional: a frame only updates what it carries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataRecord {
    /// Origin timestamp (microseconds since epoch in the usual profile, passed through unscaled)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_heading: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_pitch: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_roll: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensor_latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensor_longitude: Option<f64>,
    /// Meters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensor_altitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizontal_fov: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertical_fov: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensor_azimuth: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensor_elevation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensor_roll: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_center_latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_center_longitude: Option<f64>,
}

impl MetadataRecord {
    /// Store the decoded value of one item
    fn apply(&mut self, tag: Tag, value: &[u8]) {
        let (min, max) = tag.domain();
        let scaled = match tag.encoding() {
            Encoding::Raw => {
                self.timestamp = Some(decode_raw_u64(value));
                return;
            }
            Encoding::Unsigned => decode_unsigned(value, min, max),
            Encoding::Signed => decode_signed(value, min, max),
        };

        let slot = match tag {
            Tag::Timestamp => return,
            Tag::PlatformHeading => &mut self.platform_heading,
            Tag::PlatformPitch => &mut self.platform_pitch,
            Tag::PlatformRoll => &mut self.platform_roll,
            Tag::SensorLatitude => &mut self.sensor_latitude,
            Tag::SensorLongitude => &mut self.sensor_longitude,
            Tag::SensorAltitude => &mut self.sensor_altitude,
            Tag::HorizontalFov => &mut self.horizontal_fov,
            Tag::VerticalFov => &mut self.vertical_fov,
            Tag::SensorAzimuth => &mut self.sensor_azimuth,
            Tag::SensorElevation => &mut self.sensor_elevation,
            Tag::SensorRoll => &mut self.sensor_roll,
            Tag::FrameCenterLatitude => &mut self.frame_center_latitude,
            Tag::FrameCenterLongitude => &mut self.frame_center_longitude,
        };
        *slot = Some(scaled);
    }

    /// Frame center, when both halves were present
    pub fn frame_center(&self) -> Option<GeoPoint> {
        match (self.frame_center_latitude, self.frame_center_longitude) {
            (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
            _ => None,
        }
    }

    /// Build a camera pose for the projector
    ///
    /// Needs sensor position, altitude and both fields of view. Orientation
    /// defaults to zero when absent.
    pub fn to_pose(&self) -> Option<SensorPose> {
        Some(SensorPose {
            latitude: self.sensor_latitude?,
            longitude: self.sensor_longitude?,
            altitude: self.sensor_altitude?,
            azimuth: self.sensor_azimuth.unwrap_or(0.0),
            elevation: self.sensor_elevation.unwrap_or(0.0),
            roll: self.sensor_roll.unwrap_or(0.0),
            horizontal_fov: self.horizontal_fov?,
            vertical_fov: self.vertical_fov?,
            frame_center: self.frame_center(),
        })
    }

    /// Overlay the fields present in `newer` onto `self`
    ///
    /// Lets a host keep a running pose when frames only carry a subset.
    pub fn merge(&mut self, newer: &MetadataRecord) {
        macro_rules! take {
            ($($field:ident),*) => {
                $( if newer.$field.is_some() { self.$field = newer.$field; } )*
            };
        }
        take!(
            timestamp,
            platform_heading,
            platform_pitch,
            platform_roll,
            sensor_latitude,
            sensor_longitude,
            sensor_altitude,
            horizontal_fov,
            vertical_fov,
            sensor_azimuth,
            sensor_elevation,
            sensor_roll,
            frame_center_latitude,
            frame_center_longitude
        );
    }
}

/// A successfully decoded frame
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub record: MetadataRecord,
    /// Set when the stream broke off; `record` holds what came before
    pub truncation: Option<Truncation>,
    /// Items read, recognized or not
    pub items: usize,
    /// Items skipped because their tag is not in the table
    pub unknown_items: usize,
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode a telemetry buffer
///
/// # Example
/// ```
/// use seafuse_core::klv::{decode, KlvWriter, Tag};
/// let bytes = KlvWriter::new().scaled(Tag::SensorLatitude, 10.0, 4).finish();
/// let decoded = decode(&bytes).unwrap();
/// assert!((decoded.record.sensor_latitude.unwrap() - 10.0).abs() < 1e-6);
/// ```
pub fn decode(bytes: &[u8]) -> Result<Decoded, DecodeError> {
    if bytes.len() < 2 {
        return Err(DecodeError::TooShort(bytes.len()));
    }

    let (payload, envelope_truncation) = strip_envelope(bytes);

    let mut record = MetadataRecord::default();
    let mut recognized = 0usize;
    let mut items = 0usize;
    let mut unknown_items = 0usize;
    let mut truncation = envelope_truncation;
    let mut offset = 0usize;

    while offset < payload.len() {
        let remaining = payload.len() - offset;
        if remaining < 2 {
            truncation = Some(Truncation::TrailingBytes { count: remaining });
            break;
        }

        let tag = payload[offset];
        let len = payload[offset + 1] as usize;
        let value_start = offset + 2;
        if len > payload.len() - value_start {
            truncation = Some(Truncation::ValueOverrun {
                tag,
                offset,
                declared: len,
                remaining: payload.len() - value_start,
            });
            break;
        }

        let value = &payload[value_start..value_start + len];
        offset = value_start + len;
        items += 1;

        match Tag::from_u8(tag) {
            Some(known) if !value.is_empty() => {
                record.apply(known, value);
                recognized += 1;
            }
            Some(_) => {}
            None => unknown_items += 1,
        }
    }

    if recognized == 0 {
        return Err(match truncation {
            Some(t) => DecodeError::Malformed(t),
            None => DecodeError::NoRecognizedData,
        });
    }

    Ok(Decoded {
        record,
        truncation,
        items,
        unknown_items,
    })
}

/// Remove the universal-key envelope if present
///
/// Returns the local-set payload, clamped to the buffer, and a truncation
/// marker when the length field itself is unreadable.
pub fn strip_envelope(bytes: &[u8]) -> (&[u8], Option<Truncation>) {
    if bytes.len() < MIN_ENVELOPE_LEN || bytes[..4] != UNIVERSAL_KEY_PREFIX {
        return (bytes, None);
    }

    match read_ber_length(&bytes[UNIVERSAL_KEY_LEN..]) {
        Some((length, consumed)) => {
            let start = UNIVERSAL_KEY_LEN + consumed;
            let available = bytes.len() - start;
            let end = start + length.min(available);
            (&bytes[start..end], None)
        }
        None => (&[], Some(Truncation::EnvelopeLength)),
    }
}

/// Read a BER length field
///
/// Short form: high bit clear, the byte is the length. Long form: the low
/// seven bits count the big-endian bytes that follow. Returns
/// `(length, bytes consumed)`, or `None` if the field overruns `bytes` or
/// does not fit in 64 bits.
pub fn read_ber_length(bytes: &[u8]) -> Option<(usize, usize)> {
    let first = *bytes.first()?;
    if first & 0x80 == 0 {
        return Some((first as usize, 1));
    }

    let count = (first & 0x7F) as usize;
    if count > 8 || bytes.len() < 1 + count {
        return None;
    }
    let length = bytes[1..1 + count]
        .iter()
        .fold(0u64, |acc, b| (acc << 8) | *b as u64);
    Some((usize::try_from(length).unwrap_or(usize::MAX), 1 + count))
}

// Values wider than 8 bytes keep their least significant 8
fn trailing_u64(bytes: &[u8]) -> (u64, u32) {
    let width = bytes.len().min(8);
    let tail = &bytes[bytes.len() - width..];
    let raw = tail.iter().fold(0u64, |acc, b| (acc << 8) | *b as u64);
    (raw, (width * 8) as u32)
}

fn full_scale(bits: u32) -> f64 {
    2f64.powi(bits as i32) - 1.0
}

/// Unsigned big-endian integer rescaled into `[min, max]`
pub fn decode_unsigned(bytes: &[u8], min: f64, max: f64) -> f64 {
    if bytes.is_empty() {
        return min;
    }
    let (raw, bits) = trailing_u64(bytes);
    min + (raw as f64 / full_scale(bits)) * (max - min)
}

/// Two's-complement big-endian integer rescaled from the signed integer
/// range into `[min, max]`
pub fn decode_signed(bytes: &[u8], min: f64, max: f64) -> f64 {
    if bytes.is_empty() {
        return min;
    }
    let (raw, bits) = trailing_u64(bytes);
    let shift = 64 - bits;
    let signed = ((raw << shift) as i64) >> shift;
    let int_min = -(2f64.powi(bits as i32 - 1));
    min + ((signed as f64 - int_min) / full_scale(bits)) * (max - min)
}

/// Zero-extended unsigned 64-bit big-endian integer
pub fn decode_raw_u64(bytes: &[u8]) -> u64 {
    trailing_u64(bytes).0
}
