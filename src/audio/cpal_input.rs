// Host capture backend over cpal
//
// cpal streams are not `Send` on every platform, so the stream lives on a
// dedicated thread for as long as it is open. The audio callback pushes
// full-width 32-bit words into a bounded read-ahead ring; `read` drains it.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc as std_mpsc, Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SampleFormat, SizedSample};
use tokio::sync::{oneshot, Notify};
use tracing::{error, info, warn};

use super::backend::{AudioInput, InputConfig};
use crate::error::CaptureError;

/// Longest wait for new words before `read` reports zero
const READ_WAIT: Duration = Duration::from_millis(500);

/// Bounded ring between the audio callback and the reader
struct ReadAhead {
    words: Mutex<VecDeque<i32>>,
    capacity: usize,
    ready: Notify,
    overruns: AtomicU64,
    fault: Mutex<Option<String>>,
}

impl ReadAhead {
    fn new(capacity: usize) -> Self {
        Self {
            words: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            ready: Notify::new(),
            overruns: AtomicU64::new(0),
            fault: Mutex::new(None),
        }
    }

    fn push<T>(&self, data: &[T])
    where
        T: SizedSample,
        i32: FromSample<T>,
    {
        if let Ok(mut words) = self.words.lock() {
            for &sample in data {
                if words.len() >= self.capacity {
                    words.pop_front();
                    self.overruns.fetch_add(1, Ordering::Relaxed);
                }
                words.push_back(<i32 as FromSample<T>>::from_sample_(sample));
            }
        }
        self.ready.notify_one();
    }

    fn record_fault(&self, message: String) {
        if let Ok(mut fault) = self.fault.lock() {
            fault.get_or_insert(message);
        }
        self.ready.notify_one();
    }
}

struct StreamWorker {
    stop_tx: std_mpsc::Sender<()>,
    thread: JoinHandle<()>,
    ring: Arc<ReadAhead>,
}

/// Capture backend reading the host's input device
#[derive(Default)]
pub struct CpalInput {
    worker: Option<StreamWorker>,
}

impl CpalInput {
    pub fn new() -> Self {
        Self { worker: None }
    }
}

#[async_trait::async_trait]
impl AudioInput for CpalInput {
    async fn start(&mut self, config: &InputConfig) -> Result<(), CaptureError> {
        if self.worker.is_some() {
            return Err(CaptureError::Stream("input already open".to_string()));
        }

        let ring = Arc::new(ReadAhead::new(config.read_ahead_samples()));
        let (ready_tx, ready_rx) = oneshot::channel::<Result<(), String>>();
        let (stop_tx, stop_rx) = std_mpsc::channel::<()>();

        let thread_ring = Arc::clone(&ring);
        let thread_config = config.clone();
        let thread = std::thread::Builder::new()
            .name("voice-drop-input".to_string())
            .spawn(move || {
                let stream = match open_stream(&thread_config, thread_ring) {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                if let Err(e) = stream.play() {
                    let _ = ready_tx.send(Err(format!("failed to start stream: {}", e)));
                    return;
                }
                let _ = ready_tx.send(Ok(()));

                // Returns on stop or when the handle is dropped
                let _ = stop_rx.recv();
                drop(stream);
            })
            .map_err(|e| CaptureError::Stream(format!("failed to spawn input thread: {}", e)))?;

        let opened = ready_rx
            .await
            .unwrap_or_else(|_| Err("input thread exited before opening".to_string()));

        match opened {
            Ok(()) => {
                info!(
                    "Input opened: {}Hz mono, {} word read-ahead",
                    config.sample_rate,
                    ring.capacity
                );
                self.worker = Some(StreamWorker {
                    stop_tx,
                    thread,
                    ring,
                });
                Ok(())
            }
            Err(e) => {
                let _ = thread.join();
                Err(CaptureError::Stream(e))
            }
        }
    }

    async fn read(&mut self, buf: &mut [i32]) -> Result<usize, CaptureError> {
        let ring = match &self.worker {
            Some(worker) => Arc::clone(&worker.ring),
            None => return Err(CaptureError::Stream("input is not open".to_string())),
        };

        loop {
            if let Some(fault) = ring.fault.lock().ok().and_then(|f| f.clone()) {
                return Err(CaptureError::Stream(fault));
            }

            {
                let mut words = ring
                    .words
                    .lock()
                    .map_err(|_| CaptureError::Stream("read-ahead lock poisoned".to_string()))?;
                if !words.is_empty() {
                    let n = buf.len().min(words.len());
                    for (dst, word) in buf.iter_mut().zip(words.drain(..n)) {
                        *dst = word;
                    }
                    return Ok(n);
                }
            }

            if tokio::time::timeout(READ_WAIT, ring.ready.notified()).await.is_err() {
                return Ok(0);
            }
        }
    }

    fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };

        let _ = worker.stop_tx.send(());
        if worker.thread.join().is_err() {
            error!("Input thread panicked");
        }

        let overruns = worker.ring.overruns.load(Ordering::Relaxed);
        if overruns > 0 {
            warn!("Read-ahead overran, {} words dropped", overruns);
        }
        info!("Input closed");
    }

    fn is_capturing(&self) -> bool {
        self.worker.is_some()
    }

    fn name(&self) -> &str {
        "cpal input"
    }
}

impl Drop for CpalInput {
    fn drop(&mut self) {
        self.stop();
    }
}

fn open_stream(config: &InputConfig, ring: Arc<ReadAhead>) -> Result<cpal::Stream, String> {
    let host = cpal::default_host();

    let device = match &config.device {
        Some(wanted) => host
            .input_devices()
            .map_err(|e| format!("failed to list input devices: {}", e))?
            .find(|d| d.name().map(|name| &name == wanted).unwrap_or(false))
            .ok_or_else(|| format!("input device {:?} not found", wanted))?,
        None => host
            .default_input_device()
            .ok_or_else(|| "no audio input device found".to_string())?,
    };

    let sample_format = device
        .default_input_config()
        .map_err(|e| format!("no supported input config: {}", e))?
        .sample_format();

    info!(
        "Using input device {:?} ({:?})",
        device.name().unwrap_or_default(),
        sample_format
    );

    let stream_config = cpal::StreamConfig {
        channels: config.channels,
        sample_rate: cpal::SampleRate(config.sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    match sample_format {
        SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, ring),
        SampleFormat::I32 => build_stream::<i32>(&device, &stream_config, ring),
        SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, ring),
        other => Err(format!("unsupported sample format {:?}", other)),
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    ring: Arc<ReadAhead>,
) -> Result<cpal::Stream, String>
where
    T: SizedSample + Send + 'static,
    i32: FromSample<T>,
{
    let data_ring = Arc::clone(&ring);
    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| data_ring.push(data),
            move |err| ring.record_fault(err.to_string()),
            None,
        )
        .map_err(|e| format!("failed to build input stream: {}", e))
}
