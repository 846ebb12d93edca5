//! Fusion task
//!
//! The correlator lives inside a single tokio task. Producers talk to it
//! through a bounded command queue, so detections and sweeps are applied
//! one at a time in arrival order. Lifecycle events go to an optional
//! bounded sink that the task waits on, so the sink's reader sees every
//! event, and are re-published on a broadcast channel for any number of
//! best-effort subscribers.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use seafuse_core::fusion::{Detection, FusionSettings, Track, TrackCorrelator, TrackEvent};
use seafuse_core::reports::AisBatch;

// Lagging broadcast subscribers lose the oldest events beyond this
const EVENT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Error, Debug)]
pub enum FusionError {
    #[error("fusion task has stopped")]
    Stopped,
}

/// Where the sweep takes "now" from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clock {
    /// System time
    Wall,
    /// Latest timestamp seen in the input, for recorded scenarios
    Replay,
}

impl Clock {
    pub fn wall_now() -> u64 {
        chrono::Utc::now().timestamp_millis().max(0) as u64
    }
}

#[derive(Debug)]
pub enum FusionCommand {
    Detection(Detection),
    AisBatch { batch: AisBatch, timestamp: u64 },
    Sweep { now: u64 },
    Snapshot(oneshot::Sender<Vec<Track>>),
}

/// Cloneable producer side of the fusion task
#[derive(Clone, Debug)]
pub struct FusionHandle {
    commands: mpsc::Sender<FusionCommand>,
    events: broadcast::Sender<TrackEvent>,
}

impl FusionHandle {
    pub async fn detection(&self, detection: Detection) -> Result<(), FusionError> {
        self.send(FusionCommand::Detection(detection)).await
    }

    pub async fn ais_batch(&self, batch: AisBatch, timestamp: u64) -> Result<(), FusionError> {
        self.send(FusionCommand::AisBatch { batch, timestamp }).await
    }

    pub async fn sweep(&self, now: u64) -> Result<(), FusionError> {
        self.send(FusionCommand::Sweep { now }).await
    }

    /// Copy of the track table after every command queued before this one
    pub async fn snapshot(&self) -> Result<Vec<Track>, FusionError> {
        let (tx, rx) = oneshot::channel();
        self.send(FusionCommand::Snapshot(tx)).await?;
        rx.await.map_err(|_| FusionError::Stopped)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TrackEvent> {
        self.events.subscribe()
    }

    async fn send(&self, command: FusionCommand) -> Result<(), FusionError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| FusionError::Stopped)
    }
}

/// Summary returned when the task ends
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FusionSummary {
    pub detections: u64,
    pub sweeps: u64,
    pub removed: u64,
    pub live_tracks: usize,
}

pub struct FusionService {
    correlator: TrackCorrelator,
    commands: mpsc::Receiver<FusionCommand>,
    events: broadcast::Sender<TrackEvent>,
    /// Lossless consumer; commands stall while it is full
    sink: Option<mpsc::Sender<TrackEvent>>,
    sweep_interval: Duration,
    clock: Clock,
    latest: u64,
    summary: FusionSummary,
}

impl FusionService {
    /// Start the fusion task
    ///
    /// The task runs until every [`FusionHandle`] has been dropped, then
    /// returns a summary.
    pub fn spawn(
        settings: FusionSettings,
        sweep_interval: Duration,
        clock: Clock,
        queue_size: usize,
    ) -> (FusionHandle, JoinHandle<FusionSummary>) {
        Self::spawn_with_sink(settings, sweep_interval, clock, queue_size, None)
    }

    /// Start the fusion task with a lossless event sink
    ///
    /// Every event is delivered to `sink` in order before the next command
    /// is taken, so a slow reader slows the producers down instead of
    /// losing events. If the reader goes away the task carries on without
    /// it.
    pub fn spawn_with_sink(
        settings: FusionSettings,
        sweep_interval: Duration,
        clock: Clock,
        queue_size: usize,
        sink: Option<mpsc::Sender<TrackEvent>>,
    ) -> (FusionHandle, JoinHandle<FusionSummary>) {
        let (command_tx, command_rx) = mpsc::channel(queue_size.max(1));
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        log::debug!(
            "Starting fusion task: {:?}, sweep every {:?}, {:?} clock",
            settings,
            sweep_interval,
            clock
        );

        let service = FusionService {
            correlator: TrackCorrelator::new(settings),
            commands: command_rx,
            events: event_tx.clone(),
            sink,
            sweep_interval,
            clock,
            latest: 0,
            summary: FusionSummary::default(),
        };
        let handle = FusionHandle {
            commands: command_tx,
            events: event_tx,
        };
        (handle, tokio::spawn(service.run()))
    }

    async fn run(mut self) -> FusionSummary {
        let mut ticker = tokio::time::interval(self.sweep_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    match command {
                        Some(command) => self.handle(command),
                        None => {
                            log::debug!("All fusion handles dropped, stopping");
                            break;
                        }
                    }
                },

                _ = ticker.tick() => {
                    let now = self.now();
                    self.sweep(now);
                },
            }
            self.publish().await;
        }

        self.summary.live_tracks = self.correlator.len();
        log::info!(
            "Fusion stopped: {} detections, {} sweeps, {} tracks removed, {} live",
            self.summary.detections,
            self.summary.sweeps,
            self.summary.removed,
            self.summary.live_tracks
        );
        self.summary
    }

    fn handle(&mut self, command: FusionCommand) {
        match command {
            FusionCommand::Detection(detection) => {
                self.observe_time(detection.timestamp);
                let kind = detection.kind;
                let processed = self.correlator.process_detection(detection);
                log::debug!(
                    "{} detection -> {} {} ({:?})",
                    kind,
                    processed.track_id,
                    processed.handle,
                    processed.association
                );
                self.summary.detections += 1;
            }
            FusionCommand::AisBatch { batch, timestamp } => {
                self.observe_time(timestamp);
                let processed = self.correlator.process_ais_batch(&batch, timestamp);
                log::debug!("AIS batch of {} ships at {}", processed.len(), timestamp);
                self.summary.detections += processed.len() as u64;
            }
            FusionCommand::Sweep { now } => {
                self.observe_time(now);
                self.sweep(now);
            }
            FusionCommand::Snapshot(reply) => {
                if reply.send(self.correlator.snapshot()).is_err() {
                    log::trace!("Snapshot requester went away");
                }
            }
        }
    }

    fn sweep(&mut self, now: u64) {
        // Nothing has been seen yet on a replay clock
        if self.clock == Clock::Replay && self.latest == 0 {
            return;
        }
        let removed = self.correlator.sweep(now);
        self.summary.sweeps += 1;
        if !removed.is_empty() {
            log::info!("Sweep at {} removed {} tracks: {:?}", now, removed.len(), removed);
            self.summary.removed += removed.len() as u64;
        }
    }

    async fn publish(&mut self) {
        for event in self.correlator.drain_events() {
            if let Some(sink) = &self.sink {
                if sink.send(event.clone()).await.is_err() {
                    log::warn!("Event sink closed, continuing without it");
                    self.sink = None;
                }
            }
            if self.events.send(event).is_err() {
                log::trace!("No event subscribers");
            }
        }
    }

    fn observe_time(&mut self, timestamp: u64) {
        self.latest = self.latest.max(timestamp);
    }

    fn now(&self) -> u64 {
        match self.clock {
            Clock::Wall => Clock::wall_now(),
            Clock::Replay => self.latest,
        }
    }
}
