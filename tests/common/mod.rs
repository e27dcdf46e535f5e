// Test doubles shared by the integration tests
#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::time::Instant;
use voice_drop::config::TimingConfig;
use voice_drop::{
    AudioInput, CaptureError, Color, Config, Connectivity, ConnectivityError, DeliveryAgent,
    DeliveryError, InputConfig, MemoryProbe, PixelDriver, TriggerSource,
};

/// Raw word for a 16-bit value as the input would present it
pub fn word(value: i32) -> i32 {
    value << 15
}

/// One scripted read
#[derive(Debug, Clone)]
pub enum Step {
    Chunk(Vec<i32>),
    Empty,
    Fail(String),
}

#[derive(Debug, Default)]
pub struct InputStats {
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
    pub reads: AtomicUsize,
}

/// Replays scripted reads, then repeats `fill` once the script runs out
pub struct ScriptedInput {
    steps: VecDeque<Step>,
    fill: i32,
    fail_start: bool,
    open: bool,
    pub stats: Arc<InputStats>,
}

impl ScriptedInput {
    pub fn new(steps: Vec<Step>, fill: i32) -> Self {
        Self {
            steps: steps.into(),
            fill,
            fail_start: false,
            open: false,
            stats: Arc::new(InputStats::default()),
        }
    }

    /// Constant stream of `fill` words
    pub fn constant(fill: i32) -> Self {
        Self::new(Vec::new(), fill)
    }

    pub fn failing_start() -> Self {
        Self {
            fail_start: true,
            ..Self::constant(0)
        }
    }

    pub fn remaining_steps(&self) -> usize {
        self.steps.len()
    }
}

#[async_trait::async_trait]
impl AudioInput for ScriptedInput {
    async fn start(&mut self, _config: &InputConfig) -> Result<(), CaptureError> {
        self.stats.starts.fetch_add(1, Ordering::SeqCst);
        if self.fail_start {
            return Err(CaptureError::Stream("no such device".to_string()));
        }
        self.open = true;
        Ok(())
    }

    async fn read(&mut self, buf: &mut [i32]) -> Result<usize, CaptureError> {
        self.stats.reads.fetch_add(1, Ordering::SeqCst);
        if !self.open {
            return Err(CaptureError::Stream("read on closed input".to_string()));
        }

        match self.steps.pop_front() {
            Some(Step::Chunk(words)) => {
                let n = words.len().min(buf.len());
                buf[..n].copy_from_slice(&words[..n]);
                Ok(n)
            }
            Some(Step::Empty) => Ok(0),
            Some(Step::Fail(message)) => Err(CaptureError::Stream(message)),
            None => {
                buf.fill(self.fill);
                Ok(buf.len())
            }
        }
    }

    fn stop(&mut self) {
        self.stats.stops.fetch_add(1, Ordering::SeqCst);
        self.open = false;
    }

    fn is_capturing(&self) -> bool {
        self.open
    }

    fn name(&self) -> &str {
        "scripted input"
    }
}

/// Pixel driver that remembers every flushed colour
#[derive(Clone, Default)]
pub struct RecordingPixel {
    latched: (u8, u8, u8),
    history: Arc<Mutex<Vec<(u8, u8, u8)>>>,
}

impl RecordingPixel {
    pub fn history(&self) -> Arc<Mutex<Vec<(u8, u8, u8)>>> {
        Arc::clone(&self.history)
    }
}

impl PixelDriver for RecordingPixel {
    fn write(&mut self, rgb: (u8, u8, u8)) -> std::io::Result<()> {
        self.latched = rgb;
        Ok(())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.history.lock().unwrap().push(self.latched);
        Ok(())
    }
}

/// Pixel driver stamping every flush with the (possibly paused) tokio clock
#[derive(Clone, Default)]
pub struct TimedPixel {
    latched: (u8, u8, u8),
    writes: Arc<Mutex<Vec<(Color, Instant)>>>,
}

impl TimedPixel {
    pub fn writes(&self) -> Arc<Mutex<Vec<(Color, Instant)>>> {
        Arc::clone(&self.writes)
    }
}

impl PixelDriver for TimedPixel {
    fn write(&mut self, rgb: (u8, u8, u8)) -> std::io::Result<()> {
        self.latched = rgb;
        Ok(())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.writes
            .lock()
            .unwrap()
            .push((color_of(self.latched), Instant::now()));
        Ok(())
    }
}

/// Palette entry for an RGB triple
pub fn color_of(rgb: (u8, u8, u8)) -> Color {
    let palette = [Color::Off, Color::Red, Color::Green, Color::Blue, Color::White];
    *palette
        .iter()
        .find(|c| c.rgb() == rgb)
        .expect("unknown colour written")
}

/// Map recorded RGB triples back onto the palette
pub fn colors(history: &Arc<Mutex<Vec<(u8, u8, u8)>>>) -> Vec<Color> {
    history.lock().unwrap().iter().map(|&rgb| color_of(rgb)).collect()
}

/// `count` Red/Off pairs
pub fn blink(count: usize) -> Vec<Color> {
    std::iter::repeat([Color::Red, Color::Off])
        .take(count)
        .flatten()
        .collect()
}

pub struct FixedMemory(pub Option<u64>);

impl MemoryProbe for FixedMemory {
    fn free_bytes(&self) -> Option<u64> {
        self.0
    }
}

/// Link that is up or down on demand
#[derive(Default)]
pub struct FakeNetwork {
    pub connected: Arc<AtomicBool>,
    pub connect_ok: bool,
    pub connects: Arc<AtomicUsize>,
}

impl FakeNetwork {
    pub fn up() -> Self {
        Self {
            connected: Arc::new(AtomicBool::new(true)),
            connect_ok: true,
            connects: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn down(connect_ok: bool) -> Self {
        Self {
            connected: Arc::new(AtomicBool::new(false)),
            connect_ok,
            connects: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait::async_trait]
impl Connectivity for FakeNetwork {
    async fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn connect(&mut self) -> Result<(), ConnectivityError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.connect_ok {
            self.connected.store(true, Ordering::SeqCst);
            Ok(())
        } else {
            Err(ConnectivityError::Unreachable {
                endpoint: "fake".to_string(),
                attempts: 1,
            })
        }
    }
}

/// Delivery agent answering with a fixed status
pub struct FakeDelivery {
    pub status: u16,
    pub calls: Arc<AtomicUsize>,
    pub seen_bytes: Arc<Mutex<Option<u64>>>,
    /// Fired while the upload is "in flight"
    pub edge_during_upload: Option<(Arc<TriggerSource>, u64)>,
}

impl FakeDelivery {
    pub fn answering(status: u16) -> Self {
        Self {
            status,
            calls: Arc::new(AtomicUsize::new(0)),
            seen_bytes: Arc::new(Mutex::new(None)),
            edge_during_upload: None,
        }
    }
}

#[async_trait::async_trait]
impl DeliveryAgent for FakeDelivery {
    async fn deliver(&self, path: &Path) -> Result<(), DeliveryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some((trigger, at_ms)) = &self.edge_during_upload {
            trigger.on_edge_at(*at_ms);
        }

        let meta = std::fs::metadata(path).map_err(|source| DeliveryError::MissingFile {
            path: path.to_path_buf(),
            source,
        })?;
        *self.seen_bytes.lock().unwrap() = Some(meta.len());

        if voice_drop::delivery::is_accepted_status(self.status) {
            Ok(())
        } else {
            Err(DeliveryError::Status(self.status))
        }
    }
}

/// Config writing into `dir` with every delay zeroed
pub fn test_config(dir: &Path, sample_rate: u32, duration_secs: u32) -> Config {
    let mut cfg = Config::default();
    cfg.recording.sample_rate = sample_rate;
    cfg.recording.duration_secs = duration_secs;
    cfg.recording.wav_path = wav_path(dir);
    cfg.timing = TimingConfig::immediate();
    cfg
}

pub fn wav_path(dir: &Path) -> PathBuf {
    dir.join("record.wav")
}
