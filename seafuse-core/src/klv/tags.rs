//! KLV local-set tag table
//!
//! Each recognized tag maps to one field of the [`MetadataRecord`](super::MetadataRecord)
//! and a numeric domain the raw integer is rescaled into.

/// How the value bytes of a tag are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Unsigned big-endian integer, linearly mapped onto `[min, max]`
    Unsigned,
    /// Two's-complement big-endian integer of width 8·L, mapped from the
    /// signed integer range onto `[min, max]`
    Signed,
    /// Zero-extended unsigned 64-bit big-endian integer, not rescaled
    Raw,
}

/// Recognized local-set tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Tag {
    Timestamp = 2,
    PlatformHeading = 5,
    PlatformPitch = 6,
    PlatformRoll = 7,
    SensorLatitude = 13,
    SensorLongitude = 14,
    SensorAltitude = 15,
    HorizontalFov = 16,
    VerticalFov = 17,
    SensorAzimuth = 18,
    SensorElevation = 19,
    SensorRoll = 20,
    FrameCenterLatitude = 23,
    FrameCenterLongitude = 24,
}

/// All recognized tags, in tag-number order
pub const ALL_TAGS: [Tag; 14] = [
    Tag::Timestamp,
    Tag::PlatformHeading,
    Tag::PlatformPitch,
    Tag::PlatformRoll,
    Tag::SensorLatitude,
    Tag::SensorLongitude,
    Tag::SensorAltitude,
    Tag::HorizontalFov,
    Tag::VerticalFov,
    Tag::SensorAzimuth,
    Tag::SensorElevation,
    Tag::SensorRoll,
    Tag::FrameCenterLatitude,
    Tag::FrameCenterLongitude,
];

impl Tag {
    /// Look up a tag by its wire number
    pub fn from_u8(value: u8) -> Option<Tag> {
        ALL_TAGS.iter().copied().find(|t| t.as_u8() == value)
    }

    /// Wire number of this tag
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Value interpretation
    pub fn encoding(self) -> Encoding {
        match self {
            Tag::Timestamp => Encoding::Raw,
            Tag::SensorLatitude
            | Tag::SensorLongitude
            | Tag::FrameCenterLatitude
            | Tag::FrameCenterLongitude => Encoding::Signed,
            _ => Encoding::Unsigned,
        }
    }

    /// Declared `[min, max]` domain. The timestamp is unscaled and reports
    /// the full `u64` range.
    pub fn domain(self) -> (f64, f64) {
        match self {
            Tag::Timestamp => (0.0, u64::MAX as f64),
            Tag::PlatformHeading => (0.0, 360.0),
            Tag::PlatformPitch => (-90.0, 90.0),
            Tag::PlatformRoll => (-180.0, 180.0),
            Tag::SensorLatitude => (-90.0, 90.0),
            Tag::SensorLongitude => (-180.0, 180.0),
            Tag::SensorAltitude => (-900.0, 19000.0),
            Tag::HorizontalFov => (0.0, 180.0),
            Tag::VerticalFov => (0.0, 180.0),
            Tag::SensorAzimuth => (0.0, 360.0),
            Tag::SensorElevation => (0.0, 90.0),
            Tag::SensorRoll => (-180.0, 180.0),
            Tag::FrameCenterLatitude => (-90.0, 90.0),
            Tag::FrameCenterLongitude => (-180.0, 180.0),
        }
    }
}
