//! Scenario feed
//!
//! A feed is a text file with one JSON record per line, tagged by `kind`:
//!
//! ```text
//! {"kind":"ais","time":1000,"batch":{"ships":[{"mmsi":"244000001","lat":51.9,"lon":4.1}]}}
//! {"kind":"radar","time":1500,"position":{"frame":"local","east":120.0,"north":-40.0}}
//! {"kind":"eoir","time":1700,"position":{"frame":"geodetic","lat":51.9,"lon":4.1}}
//! {"kind":"camera","time":1800,"metadata":{"cameraPosition":{...},"cameraOrientation":{...},"fov":{...}}}
//! {"kind":"klv","time":2000,"data":"Bg4rNAILAQEOAQMBAQAAAA..."}
//! ```
//!
//! Blank lines and lines starting with `#` are ignored.

use std::path::Path;

use anyhow::{bail, Context};
use base64::Engine;
use serde::{Deserialize, Serialize};

use seafuse_core::fusion::{Detection, DetectionPosition};
use seafuse_core::geo::Velocity;
use seafuse_core::reports::{AisBatch, EoirMetadata};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FeedRecord {
    Ais {
        /// Milliseconds; when absent the batch's own timestamp is used
        #[serde(default)]
        time: Option<u64>,
        batch: AisBatch,
    },
    Radar {
        time: u64,
        position: DetectionPosition,
        #[serde(default)]
        velocity: Option<Velocity>,
    },
    Eoir {
        time: u64,
        position: DetectionPosition,
    },
    /// EO/IR camera metadata
    Camera {
        time: u64,
        metadata: EoirMetadata,
    },
    /// Base64 KLV telemetry packet
    Klv {
        #[serde(default)]
        time: Option<u64>,
        data: String,
    },
}

impl FeedRecord {
    /// Detection carried by a radar or EO/IR record
    pub fn detection(&self) -> Option<Detection> {
        match self {
            FeedRecord::Radar {
                time,
                position,
                velocity,
            } => Some(Detection::radar(*position, *velocity, *time)),
            FeedRecord::Eoir { time, position } => Some(Detection::eoir(*position, *time)),
            _ => None,
        }
    }

    /// Record time in milliseconds, if known without decoding the payload
    pub fn time(&self) -> Option<u64> {
        match self {
            FeedRecord::Ais { time, batch } => time.or_else(|| {
                batch
                    .timestamp
                    .as_deref()
                    .and_then(|ts| parse_timestamp(ts).ok())
            }),
            FeedRecord::Radar { time, .. }
            | FeedRecord::Eoir { time, .. }
            | FeedRecord::Camera { time, .. } => Some(*time),
            FeedRecord::Klv { time, .. } => *time,
        }
    }

    /// Raw bytes of a KLV record
    pub fn klv_bytes(&self) -> anyhow::Result<Option<Vec<u8>>> {
        match self {
            FeedRecord::Klv { data, .. } => {
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(data.trim())
                    .context("KLV data is not valid base64")?;
                Ok(Some(bytes))
            }
            _ => Ok(None),
        }
    }
}

/// RFC 3339 timestamp to milliseconds since epoch
pub fn parse_timestamp(s: &str) -> anyhow::Result<u64> {
    let t = chrono::DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("Invalid timestamp '{}'", s))?;
    let ms = t.timestamp_millis();
    if ms < 0 {
        bail!("Timestamp '{}' is before 1970", s);
    }
    Ok(ms as u64)
}

/// Parse one feed line; `Ok(None)` for blank and comment lines
pub fn parse_line(line: &str) -> anyhow::Result<Option<FeedRecord>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let record = serde_json::from_str(line).context("Invalid feed record")?;
    Ok(Some(record))
}

/// Write records as a feed file, one JSON line each
pub async fn write_feed(path: &Path, records: &[FeedRecord]) -> anyhow::Result<()> {
    let mut text = String::new();
    for record in records {
        text.push_str(&serde_json::to_string(record)?);
        text.push('\n');
    }
    tokio::fs::write(path, text)
        .await
        .with_context(|| format!("Cannot write feed {}", path.display()))?;
    log::info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

/// Read a whole feed file
///
/// Lines that fail to parse are logged and skipped.
pub async fn read_feed(path: &Path) -> anyhow::Result<Vec<FeedRecord>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Cannot read feed {}", path.display()))?;

    let mut records = Vec::new();
    for (n, line) in text.lines().enumerate() {
        match parse_line(line) {
            Ok(Some(record)) => records.push(record),
            Ok(None) => {}
            Err(e) => log::warn!("{}:{}: {:#}", path.display(), n + 1, e),
        }
    }
    log::info!("Read {} records from {}", records.len(), path.display());
    Ok(records)
}
