use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use seafuse_core::fusion::TrackEvent;

use crate::overlay::OverlayFrame;

/// One line of JSON output
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "output", rename_all = "snake_case")]
pub enum OutputLine {
    Event { event: TrackEvent },
    Frame { frame: OverlayFrame },
}

/// Forward lifecycle events into the output queue until either side closes
///
/// Both queues are bounded, so a slow writer holds the fusion task back
/// rather than losing events. Returns the number of events forwarded.
pub async fn forward_events(
    mut events: mpsc::Receiver<TrackEvent>,
    output: mpsc::Sender<OutputLine>,
) -> u64 {
    let mut count = 0;
    while let Some(event) = events.recv().await {
        if output.send(OutputLine::Event { event }).await.is_err() {
            log::warn!("Output writer stopped, dropping track events");
            break;
        }
        count += 1;
    }
    count
}

/// Write every queued line as JSON; returns the number of lines written
pub async fn write_lines<W>(mut lines: mpsc::Receiver<OutputLine>, mut writer: W) -> anyhow::Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut count = 0;
    while let Some(line) = lines.recv().await {
        let mut json = serde_json::to_vec(&line)?;
        json.push(b'\n');
        writer.write_all(&json).await?;
        count += 1;
    }
    writer.flush().await?;
    Ok(count)
}
