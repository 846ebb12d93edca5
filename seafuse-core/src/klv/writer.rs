//! KLV local-set builder
//!
//! The inverse of the decoder, used to synthesize telemetry for replay
//! tooling and tests.

use super::tags::{Encoding, Tag};
use super::{UNIVERSAL_KEY_LEN, UNIVERSAL_KEY_PREFIX};

// Remaining 12 bytes of the UAS local set universal key
const UNIVERSAL_KEY_SUFFIX: [u8; UNIVERSAL_KEY_LEN - 4] = [
    0x02, 0x0B, 0x01, 0x01, 0x0E, 0x01, 0x03, 0x01, 0x01, 0x00, 0x00, 0x00,
];

/// Builds a tag/length/value payload
#[derive(Debug, Clone, Default)]
pub struct KlvWriter {
    payload: Vec<u8>,
}

impl KlvWriter {
    pub fn new() -> Self {
        KlvWriter::default()
    }

    /// Append an item with arbitrary value bytes. Values longer than 255
    /// bytes are cut to 255.
    pub fn raw(mut self, tag: u8, value: &[u8]) -> Self {
        let value = &value[..value.len().min(u8::MAX as usize)];
        self.payload.push(tag);
        self.payload.push(value.len() as u8);
        self.payload.extend_from_slice(value);
        self
    }

    /// Append a timestamp item (8 bytes)
    pub fn timestamp(self, value: u64) -> Self {
        self.raw(Tag::Timestamp.as_u8(), &value.to_be_bytes())
    }

    /// Append `value` rescaled into `width` bytes (1..=8) using the tag's
    /// domain and encoding. Values outside the domain are clamped.
    pub fn scaled(self, tag: Tag, value: f64, width: usize) -> Self {
        let width = width.clamp(1, 8);
        let bytes = encode_scaled(tag, value, width);
        self.raw(tag.as_u8(), &bytes[8 - width..])
    }

    /// The bare local set
    pub fn finish(self) -> Vec<u8> {
        self.payload
    }

    /// The local set wrapped in the universal key and a BER length
    pub fn finish_with_envelope(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(UNIVERSAL_KEY_LEN + 9 + self.payload.len());
        out.extend_from_slice(&UNIVERSAL_KEY_PREFIX);
        out.extend_from_slice(&UNIVERSAL_KEY_SUFFIX);
        write_ber_length(&mut out, self.payload.len());
        out.extend_from_slice(&self.payload);
        out
    }
}

/// Append a BER length in its shortest form
pub fn write_ber_length(out: &mut Vec<u8>, length: usize) {
    if length < 0x80 {
        out.push(length as u8);
        return;
    }
    let bytes = (length as u64).to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    out.push(0x80 | (8 - skip) as u8);
    out.extend_from_slice(&bytes[skip..]);
}

// Returns the 8-byte big-endian two's complement image; callers keep the
// trailing `width` bytes
fn encode_scaled(tag: Tag, value: f64, width: usize) -> [u8; 8] {
    if tag.encoding() == Encoding::Raw {
        return (value.max(0.0) as u64).to_be_bytes();
    }

    let (min, max) = tag.domain();
    let bits = (width * 8) as i32;
    let span = 2f64.powi(bits) - 1.0;
    let fraction = ((value - min) / (max - min)).clamp(0.0, 1.0);

    match tag.encoding() {
        Encoding::Signed => {
            let int_min = -(2f64.powi(bits - 1));
            let raw = (fraction * span + int_min).round() as i64;
            raw.to_be_bytes()
        }
        _ => {
            let raw = (fraction * span).round() as u64;
            raw.to_be_bytes()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_item_layout() {
        let bytes = KlvWriter::new().raw(7, &[0xAB, 0xCD]).finish();
        assert_eq!(bytes, vec![7, 2, 0xAB, 0xCD]);
    }

    #[test]
    fn test_signed_negative_bytes() {
        // The bottom of the domain is the most negative integer
        let bytes = KlvWriter::new()
            .scaled(Tag::SensorLatitude, -90.0, 2)
            .finish();
        assert_eq!(bytes, vec![13, 2, 0x80, 0x00]);
    }

    #[test]
    fn test_unsigned_full_scale() {
        let bytes = KlvWriter::new()
            .scaled(Tag::SensorAzimuth, 360.0, 2)
            .finish();
        assert_eq!(bytes, vec![18, 2, 0xFF, 0xFF]);
    }

    #[test]
    fn test_ber_length_forms() {
        let mut out = Vec::new();
        write_ber_length(&mut out, 0x7F);
        assert_eq!(out, vec![0x7F]);

        out.clear();
        write_ber_length(&mut out, 0x80);
        assert_eq!(out, vec![0x81, 0x80]);

        out.clear();
        write_ber_length(&mut out, 0x1234);
        assert_eq!(out, vec![0x82, 0x12, 0x34]);
    }

    #[test]
    fn test_envelope_key() {
        let bytes = KlvWriter::new().raw(2, &[1]).finish_with_envelope();
        assert_eq!(bytes.len(), UNIVERSAL_KEY_LEN + 1 + 3);
        assert_eq!(bytes[..4], UNIVERSAL_KEY_PREFIX);
        assert_eq!(bytes[UNIVERSAL_KEY_LEN], 3);
    }
}
