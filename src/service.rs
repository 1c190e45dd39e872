//! Async vision service
//!
//! Owns the pipeline and runs a single processing loop: frames arrive on one
//! channel, configuration snapshots on another, and measurement events go out
//! on a broadcast channel for the publishing boundary. Reconfiguration and
//! frame processing share the loop, so a snapshot is always applied between
//! frames and an in-flight frame sees one consistent stack for its whole
//! duration.

use crate::config::VisionConfig;
use crate::error::VisionError;
use crate::frame::Frame;
use crate::candidate::MeasurementEvent;
use crate::pipeline::VisionPipeline;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

const EVENT_BUFFER_SIZE: usize = 64;
const CONFIG_QUEUE_SIZE: usize = 4;

/// Handle to a running vision service.
pub struct VisionService {
    frame_sender: mpsc::Sender<Frame>,
    config_sender: mpsc::Sender<VisionConfig>,
    event_sender: broadcast::Sender<MeasurementEvent>,
    is_running: Arc<RwLock<bool>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl VisionService {
    /// Build the initial pipeline and spawn the processing loop.
    pub fn start(config: VisionConfig) -> Result<Self, VisionError> {
        let queue_size = config.transport.queue_size.max(1);
        let pipeline = VisionPipeline::new(config)?;

        let (frame_sender, mut frame_receiver) = mpsc::channel::<Frame>(queue_size);
        let (config_sender, mut config_receiver) = mpsc::channel::<VisionConfig>(CONFIG_QUEUE_SIZE);
        let (event_sender, _) = broadcast::channel(EVENT_BUFFER_SIZE);

        let is_running = Arc::new(RwLock::new(true));
        let events = event_sender.clone();
        let running = is_running.clone();

        let task = tokio::spawn(async move {
            let mut pipeline = pipeline;
            loop {
                if !*running.read() {
                    break;
                }
                tokio::select! {
                    // Snapshots are drained before the next frame starts.
                    biased;
                    snapshot = config_receiver.recv() => match snapshot {
                        Some(snapshot) => apply_snapshot(&mut pipeline, snapshot),
                        None => break,
                    },
                    frame = frame_receiver.recv() => match frame {
                        Some(frame) => process_frame(&pipeline, &frame, &events),
                        None => {
                            warn!("Frame channel closed, stopping vision service");
                            break;
                        }
                    },
                    _ = tokio::time::sleep(std::time::Duration::from_millis(100)) => {
                        // Idle wakeup so a stop request is noticed.
                    }
                }
            }
            *running.write() = false;
            info!("Vision service stopped");
        });

        info!("Vision service started");
        Ok(Self {
            frame_sender,
            config_sender,
            event_sender,
            is_running,
            task: Some(task),
        })
    }

    /// Submit a frame for processing. Back-pressure is the channel itself:
    /// when the queue is full the frame is dropped, matching a live camera
    /// feed where stale frames are worthless.
    pub fn submit_frame(&self, frame: Frame) -> bool {
        match self.frame_sender.try_send(frame) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(frame)) => {
                debug!(seq = frame.seq(), "Frame queue full, dropping frame");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!("Vision service not running, frame discarded");
                false
            }
        }
    }

    /// Deliver a new configuration snapshot. Applied before the next frame
    /// begins processing.
    pub async fn submit_config(&self, config: VisionConfig) -> Result<(), VisionError> {
        self.config_sender
            .send(config)
            .await
            .map_err(|_| VisionError::Config("Vision service not running".to_string()))
    }

    /// Subscribe to measurement events.
    pub fn subscribe(&self) -> broadcast::Receiver<MeasurementEvent> {
        self.event_sender.subscribe()
    }

    pub fn is_running(&self) -> bool {
        *self.is_running.read()
    }

    /// Signal the loop to stop and wait for it to wind down.
    pub async fn stop(&mut self) {
        {
            let mut running = self.is_running.write();
            if !*running {
                return;
            }
            *running = false;
        }
        if let Some(task) = self.task.take() {
            if tokio::time::timeout(std::time::Duration::from_secs(1), task)
                .await
                .is_err()
            {
                warn!("Vision service did not stop in time");
            }
        }
    }
}

fn apply_snapshot(pipeline: &mut VisionPipeline, snapshot: VisionConfig) {
    match pipeline.apply_config(snapshot) {
        Ok(failures) => {
            for failure in &failures {
                warn!(
                    capability = ?failure.capability,
                    reason = %failure.reason,
                    "Capability kept previous instance after failed rebuild"
                );
            }
            if failures.is_empty() {
                info!("Configuration snapshot applied");
            }
        }
        Err(e) => error!(error = %e, "Rejected invalid configuration snapshot"),
    }
}

fn process_frame(
    pipeline: &VisionPipeline,
    frame: &Frame,
    events: &broadcast::Sender<MeasurementEvent>,
) {
    match pipeline.process(frame) {
        Ok(event) => {
            if events.send(event).is_err() {
                debug!("No measurement subscribers, event dropped");
            }
        }
        Err(e) => {
            // Horizon failure: the frame is dropped, nothing is published.
            warn!(seq = frame.seq(), error = %e, "Frame dropped");
        }
    }
}
