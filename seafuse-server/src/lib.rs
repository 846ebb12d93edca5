//! SeaFuse Server
//!
//! Native host for `seafuse-core`: feeds recorded, simulated or live sensor
//! reports into a single fusion task, schedules the inactivity sweep, and
//! writes track events and overlay frames as JSON lines.

use std::path::Path;

use anyhow::Context;
use tokio::io::AsyncWrite;
use tokio::sync::mpsc;

pub mod config;
pub mod feed;
pub mod fusion;
pub mod output;
pub mod overlay;
pub mod simulate;

pub use config::{Cli, ProjectionSettings};
pub use fusion::{Clock, FusionHandle, FusionService, FusionSummary};

use feed::FeedRecord;
use output::OutputLine;
use overlay::FrameBuilder;
use simulate::Simulator;

/// Counters for one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub records: u64,
    pub skipped: u64,
    pub frames: u64,
    pub lines: u64,
    pub fusion: FusionSummary,
}

/// Run with output on stdout
pub async fn run(cli: Cli) -> anyhow::Result<RunSummary> {
    run_with_writer(cli, tokio::io::stdout()).await
}

pub async fn run_with_writer<W>(cli: Cli, writer: W) -> anyhow::Result<RunSummary>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let clock = cli.clock();
    let queue_size = cli.queue_size.max(1);

    // Events flow fusion -> forwarder -> writer over bounded queues, so
    // every event reaches the output and a slow writer throttles the input
    let (event_tx, event_rx) = mpsc::channel(queue_size);
    let (handle, fusion_task) = FusionService::spawn_with_sink(
        cli.fusion_settings(),
        cli.sweep_interval(),
        clock,
        queue_size,
        Some(event_tx),
    );

    let (line_tx, line_rx) = mpsc::channel(queue_size);
    let forwarder = tokio::spawn(output::forward_events(event_rx, line_tx.clone()));
    let writer = tokio::spawn(output::write_lines(line_rx, writer));

    let mut player = Player {
        handle,
        frames: FrameBuilder::new(cli.projection_settings()),
        lines: line_tx,
        clock,
        last_time: 0,
        summary: RunSummary::default(),
    };

    if let Some(path) = &cli.feed {
        for record in feed::read_feed(path).await? {
            player.play(record).await?;
        }
    }
    if let Some(path) = &cli.simulate {
        let scenario = simulate::load_scenario(path).await?;
        let records = Simulator::new(scenario).generate();
        if let Some(out) = &cli.save_feed {
            feed::write_feed(out, &records).await?;
        }
        for record in records {
            player.play(record).await?;
        }
    }
    for path in &cli.klv {
        player.play_klv_file(path).await?;
    }

    let Player {
        handle,
        lines,
        mut summary,
        ..
    } = player;
    drop(handle);
    drop(lines);

    summary.fusion = fusion_task.await.context("Fusion task failed")?;
    let events = forwarder.await.context("Event forwarder failed")?;
    log::debug!("Forwarded {} track events", events);
    summary.lines = writer.await.context("Output writer failed")??;

    log::info!(
        "Processed {} records ({} skipped), wrote {} frames",
        summary.records,
        summary.skipped,
        summary.frames
    );
    Ok(summary)
}

struct Player {
    handle: FusionHandle,
    frames: FrameBuilder,
    lines: mpsc::Sender<OutputLine>,
    clock: Clock,
    /// Latest record time, used for records that carry none
    last_time: u64,
    summary: RunSummary,
}

impl Player {
    async fn play(&mut self, record: FeedRecord) -> anyhow::Result<()> {
        self.summary.records += 1;
        let time = record.time();

        if let Some(detection) = record.detection() {
            self.observe(detection.timestamp);
            self.handle.detection(detection).await?;
            return Ok(());
        }

        match record {
            FeedRecord::Ais { batch, .. } => {
                let time = time.unwrap_or_else(|| self.fallback_time());
                self.observe(time);
                self.handle.ais_batch(batch, time).await?;
            }
            FeedRecord::Camera { time, metadata } => {
                self.observe(time);
                self.frames.apply_camera(&metadata);
                self.emit_frame(time).await?;
            }
            FeedRecord::Klv { .. } => match record.klv_bytes() {
                Ok(Some(bytes)) => self.play_klv(&bytes, time).await?,
                Ok(None) => {}
                Err(e) => {
                    log::warn!("Skipping KLV record: {:#}", e);
                    self.summary.skipped += 1;
                }
            },
            FeedRecord::Radar { .. } | FeedRecord::Eoir { .. } => {}
        }
        Ok(())
    }

    async fn play_klv_file(&mut self, path: &Path) -> anyhow::Result<()> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Cannot read KLV file {}", path.display()))?;
        log::debug!("{}: {} bytes of KLV", path.display(), bytes.len());
        self.summary.records += 1;
        self.play_klv(&bytes, None).await
    }

    async fn play_klv(&mut self, bytes: &[u8], time: Option<u64>) -> anyhow::Result<()> {
        match self.frames.apply_klv(bytes) {
            Ok(packet_time) => {
                let time = time
                    .or(packet_time)
                    .unwrap_or_else(|| self.fallback_time());
                self.observe(time);
                self.emit_frame(time).await
            }
            Err(e) => {
                log::warn!("Skipping KLV packet: {}", e);
                self.summary.skipped += 1;
                Ok(())
            }
        }
    }

    async fn emit_frame(&mut self, time: u64) -> anyhow::Result<()> {
        let tracks = self.handle.snapshot().await?;
        if let Some(frame) = self.frames.frame(time, &tracks) {
            log::debug!(
                "Frame at {}: {} of {} tracks in view",
                time,
                frame.visible(),
                frame.overlays.len()
            );
            self.summary.frames += 1;
            self.lines
                .send(OutputLine::Frame { frame })
                .await
                .context("Output writer stopped")?;
        }
        Ok(())
    }

    fn observe(&mut self, time: u64) {
        self.last_time = self.last_time.max(time);
    }

    fn fallback_time(&self) -> u64 {
        match self.clock {
            Clock::Wall => Clock::wall_now(),
            Clock::Replay => self.last_time,
        }
    }
}
