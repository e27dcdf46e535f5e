use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::report::{SessionOutcome, SessionReport};
use super::state::SessionState;
use crate::audio::{
    AudioCapturer, AudioInput, CaptureBudgetPlanner, CaptureSettings, InputConfig, MemoryProbe,
    WaveEncoder,
};
use crate::config::Config;
use crate::delivery::DeliveryAgent;
use crate::error::SessionError;
use crate::indicator::{Color, Indicator};
use crate::network::Connectivity;
use crate::trigger::TriggerSource;

/// Collaborators the controller drives
pub struct SessionParts {
    pub indicator: Indicator,
    pub input: Box<dyn AudioInput>,
    pub memory: Box<dyn MemoryProbe>,
    pub network: Box<dyn Connectivity>,
    pub delivery: Box<dyn DeliveryAgent>,
}

/// What `record_process` produced
struct RecordedClip {
    sample_count: u64,
    dc_offset: i32,
    file_bytes: u64,
}

/// Top-level loop: wait for a trigger, then record, encode and deliver
/// one clip, reporting each phase on the indicator.
pub struct SessionController {
    config: Config,
    trigger: Arc<TriggerSource>,
    indicator: Indicator,
    input: Box<dyn AudioInput>,
    memory: Box<dyn MemoryProbe>,
    network: Box<dyn Connectivity>,
    delivery: Box<dyn DeliveryAgent>,
    planner: CaptureBudgetPlanner,
    capturer: AudioCapturer,
    encoder: WaveEncoder,
    state: SessionState,
}

impl SessionController {
    pub fn new(config: Config, trigger: Arc<TriggerSource>, parts: SessionParts) -> Self {
        let planner = CaptureBudgetPlanner::new(config.recording.memory_reserve_bytes);
        let capturer = AudioCapturer::new(CaptureSettings::from_recording(&config.recording));

        Self {
            config,
            trigger,
            indicator: parts.indicator,
            input: parts.input,
            memory: parts.memory,
            network: parts.network,
            delivery: parts.delivery,
            planner,
            capturer,
            encoder: WaveEncoder,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn indicator(&self) -> &Indicator {
        &self.indicator
    }

    /// Boot sequence: White while the link comes up, then Off.
    ///
    /// Returns false when the link could not be established.
    pub async fn startup(&mut self) -> bool {
        info!("System starting");
        self.indicator.set_color(Color::White).await;

        match self.network.connect().await {
            Ok(()) => {
                tokio::time::sleep(Duration::from_millis(self.config.timing.startup_hold_ms)).await;
                self.indicator.set_color(Color::Off).await;
                info!("Idle, waiting for trigger");
                true
            }
            Err(e) => {
                error!("Network unavailable at startup: {}", e);
                false
            }
        }
    }

    /// Slow Red/Off blink that never returns; used when startup fails.
    pub async fn blink_offline(&mut self) {
        let period = Duration::from_millis(self.config.timing.offline_blink_ms);
        loop {
            self.indicator.set_color(Color::Red).await;
            tokio::time::sleep(period).await;
            self.indicator.set_color(Color::Off).await;
            tokio::time::sleep(period).await;
        }
    }

    /// Poll the trigger forever, running one session per accepted edge.
    pub async fn run(&mut self) {
        let idle_poll = self.config.timing.idle_poll();
        loop {
            self.poll_once().await;
            tokio::time::sleep(idle_poll).await;
        }
    }

    /// Consume a pending trigger, if any, and run its session.
    pub async fn poll_once(&mut self) -> Option<SessionReport> {
        if !self.trigger.consume_pending() {
            return None;
        }
        Some(self.run_session().await)
    }

    /// Run one full capture-encode-deliver cycle.
    ///
    /// Never fails: every error becomes a failure outcome and the
    /// controller is back in `Idle` on return.
    pub async fn run_session(&mut self) -> SessionReport {
        let id = Uuid::new_v4();
        let started_at = Utc::now();
        let clock = Instant::now();
        info!(session = %id, "Trigger accepted, starting session");

        let mut clip_stats = None;
        let outcome = match self.record_phase(id).await {
            Ok(clip) => {
                clip_stats = Some(clip);
                self.upload_phase(id).await
            }
            Err(e) => SessionOutcome::RecordFailed(e.to_string()),
        };

        self.transition_to(SessionState::Idle);

        if self.trigger.consume_pending() {
            debug!(session = %id, "Trigger during session discarded");
        }

        let report = SessionReport {
            id,
            started_at,
            sample_rate: self.config.recording.sample_rate,
            duration_secs: self.config.recording.duration_secs,
            sample_count: clip_stats.as_ref().map(|c| c.sample_count),
            dc_offset: clip_stats.as_ref().map(|c| c.dc_offset),
            file_bytes: clip_stats.as_ref().map(|c| c.file_bytes),
            elapsed_secs: clock.elapsed().as_secs_f64(),
            outcome,
        };

        info!(
            session = %id,
            outcome = ?report.outcome,
            elapsed_secs = report.elapsed_secs,
            "Session finished, back to idle"
        );

        report
    }

    async fn record_phase(&mut self, id: Uuid) -> Result<RecordedClip, SessionError> {
        self.transition_to(SessionState::Recording);
        self.indicator.set_color(Color::Red).await;
        info!(session = %id, "Recording");

        match self.record_process().await {
            Ok(clip) => {
                self.transition_to(SessionState::Recorded);
                Ok(clip)
            }
            Err(e) => {
                if e.is_out_of_memory() {
                    error!(session = %id, "{}; reduce recording.duration_secs", e);
                    self.indicator.set_color(Color::Off).await;
                } else {
                    error!(session = %id, "Recording failed: {}", e);
                }
                self.transition_to(SessionState::RecordFailed);
                self.blink_failure().await;
                Err(e)
            }
        }
    }

    async fn upload_phase(&mut self, id: Uuid) -> SessionOutcome {
        if !self.network.is_connected().await {
            warn!(session = %id, "Link down before upload, reconnecting");
            if let Err(e) = self.network.connect().await {
                warn!(session = %id, "Reconnect failed: {}", e);
            }
        }

        self.transition_to(SessionState::Uploading);
        self.indicator.set_color(Color::Blue).await;
        info!(session = %id, "Uploading");

        match self.delivery.deliver(&self.config.recording.wav_path).await {
            Ok(()) => {
                self.transition_to(SessionState::Delivered);
                info!(session = %id, "Delivered");
                self.indicator.set_color(Color::Green).await;
                tokio::time::sleep(self.config.timing.success_hold()).await;
                self.indicator.set_color(Color::Off).await;
                SessionOutcome::Delivered
            }
            Err(e) => {
                self.transition_to(SessionState::UploadFailed);
                error!(session = %id, "Upload failed: {}", e);
                self.blink_failure().await;
                SessionOutcome::UploadFailed(SessionError::from(e).to_string())
            }
        }
    }

    /// Capture then encode; the sample buffer is released before return.
    async fn record_process(&mut self) -> Result<RecordedClip, SessionError> {
        let rec = &self.config.recording;
        let budget = self
            .planner
            .plan(rec.sample_rate, rec.duration_secs, self.memory.as_ref());

        let input_config = InputConfig::from_recording(rec);
        let recording = self
            .capturer
            .capture(self.input.as_mut(), &input_config, budget.sample_count)
            .await?;

        info!("Recording finished, writing {}", rec.wav_path.display());
        let file_bytes = self.encoder.write(
            &rec.wav_path,
            recording.samples.as_slice(),
            recording.sample_rate,
        )?;

        Ok(RecordedClip {
            sample_count: recording.samples.len() as u64,
            dc_offset: recording.dc_offset,
            file_bytes,
        })
    }

    async fn blink_failure(&mut self) {
        let timing = &self.config.timing;
        let (count, period) = (timing.blink_count, timing.blink_period());
        self.indicator.blink_failure(count, period).await;
    }

    fn transition_to(&mut self, next: SessionState) {
        if !self.state.can_transition_to(next) {
            warn!(from = %self.state, to = %next, "unexpected state transition");
        }
        debug!(from = %self.state, to = %next, "state transition");
        self.state = next;
    }
}
