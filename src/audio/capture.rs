// Streaming capture into a fixed-size sample buffer
//
// The capture runs in two phases over the same raw chunk buffer:
// - calibration: the first word of each of N chunks, shifted down, is
//   averaged into a DC offset; nothing is stored
// - streaming: every word is shifted, offset-corrected and clamped to
//   i16 before landing in the sample buffer

use tracing::{debug, info, warn};

use super::backend::{AudioInput, InputConfig};
use super::budget::BYTES_PER_SAMPLE;
use crate::config::RecordingConfig;
use crate::error::CaptureError;

/// Exclusively owned 16-bit mono sample storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleBuffer {
    samples: Vec<i16>,
}

impl SampleBuffer {
    /// Allocate `count` zeroed samples, reporting allocation failure as
    /// `CaptureError::OutOfMemory` instead of aborting.
    pub fn allocate(count: u64) -> Result<Self, CaptureError> {
        let oom = || CaptureError::OutOfMemory {
            samples: count,
            bytes: count.saturating_mul(BYTES_PER_SAMPLE),
        };

        let len = usize::try_from(count).map_err(|_| oom())?;
        let mut samples: Vec<i16> = Vec::new();
        samples.try_reserve_exact(len).map_err(|_| oom())?;
        samples.resize(len, 0);

        Ok(Self { samples })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn byte_len(&self) -> u64 {
        self.samples.len() as u64 * BYTES_PER_SAMPLE
    }

    pub fn as_slice(&self) -> &[i16] {
        &self.samples
    }

    pub fn into_inner(self) -> Vec<i16> {
        self.samples
    }
}

/// A filled buffer plus what calibration measured
#[derive(Debug)]
pub struct Recording {
    pub samples: SampleBuffer,
    pub sample_rate: u32,
    pub dc_offset: i32,
}

/// Capture parameters
#[derive(Debug, Clone)]
pub struct CaptureSettings {
    pub bit_shift: u32,
    pub chunk_samples: usize,
    pub calibration_chunks: usize,
}

/// Widest shift that keeps `raw >> shift` defined for a 32-bit word
pub const MAX_BIT_SHIFT: u32 = 31;

impl CaptureSettings {
    pub fn from_recording(config: &RecordingConfig) -> Self {
        Self {
            bit_shift: config.bit_shift,
            chunk_samples: config.chunk_samples,
            calibration_chunks: config.calibration_chunks,
        }
    }

    /// Pull out-of-range values back into the range the capture loop needs:
    /// a shift below 32 and at least one word per chunk and calibration pass.
    pub fn normalized(self) -> Self {
        let normalized = Self {
            bit_shift: self.bit_shift.min(MAX_BIT_SHIFT),
            chunk_samples: self.chunk_samples.max(1),
            calibration_chunks: self.calibration_chunks.max(1),
        };
        if normalized.bit_shift != self.bit_shift
            || normalized.chunk_samples != self.chunk_samples
            || normalized.calibration_chunks != self.calibration_chunks
        {
            warn!(
                "Capture settings adjusted: shift {} -> {}, chunk {} -> {}, calibration {} -> {}",
                self.bit_shift,
                normalized.bit_shift,
                self.chunk_samples,
                normalized.chunk_samples,
                self.calibration_chunks,
                normalized.calibration_chunks
            );
        }
        normalized
    }
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self::from_recording(&RecordingConfig::default())
    }
}

/// Shift a raw word down, remove the DC offset and saturate to i16.
pub fn convert_sample(raw: i32, bit_shift: u32, dc_offset: i32) -> i16 {
    let value = (raw >> bit_shift.min(MAX_BIT_SHIFT)) as i64 - dc_offset as i64;
    value.clamp(i16::MIN as i64, i16::MAX as i64) as i16
}

pub struct AudioCapturer {
    settings: CaptureSettings,
}

impl AudioCapturer {
    pub fn new(settings: CaptureSettings) -> Self {
        Self {
            settings: settings.normalized(),
        }
    }

    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    /// Capture `sample_count` samples from `input`.
    ///
    /// The buffer is allocated before the stream is opened. The stream is
    /// closed on every path once it has been started.
    pub async fn capture(
        &self,
        input: &mut dyn AudioInput,
        config: &InputConfig,
        sample_count: u64,
    ) -> Result<Recording, CaptureError> {
        let mut samples = SampleBuffer::allocate(sample_count)?;
        info!(
            "Sample buffer allocated: {} samples ({} bytes)",
            samples.len(),
            samples.byte_len()
        );

        let started = input.start(config).await;
        let filled = match started {
            Ok(()) => self.fill(input, &mut samples).await,
            Err(e) => Err(e),
        };
        input.stop();

        let dc_offset = filled?;

        Ok(Recording {
            samples,
            sample_rate: config.sample_rate,
            dc_offset,
        })
    }

    async fn fill(
        &self,
        input: &mut dyn AudioInput,
        samples: &mut SampleBuffer,
    ) -> Result<i32, CaptureError> {
        let mut raw = vec![0i32; self.settings.chunk_samples];

        let dc_offset = self.calibrate(input, &mut raw).await?;
        info!("Recording from {} (dc offset {})", input.name(), dc_offset);

        let shift = self.settings.bit_shift;
        let total = samples.samples.len();
        let mut idx = 0;

        while idx < total {
            let read = input.read(&mut raw).await?.min(raw.len());
            if read == 0 {
                tokio::task::yield_now().await;
                continue;
            }

            let take = read.min(total - idx);
            for (dst, &word) in samples.samples[idx..idx + take].iter_mut().zip(&raw[..take]) {
                *dst = convert_sample(word, shift, dc_offset);
            }
            idx += take;
        }

        debug!(samples = total, "capture complete");
        Ok(dc_offset)
    }

    /// Average the first word of each calibration chunk.
    async fn calibrate(
        &self,
        input: &mut dyn AudioInput,
        raw: &mut [i32],
    ) -> Result<i32, CaptureError> {
        let shift = self.settings.bit_shift;
        let wanted = self.settings.calibration_chunks;
        let mut sum: i64 = 0;
        let mut taken = 0;

        while taken < wanted {
            if input.read(raw).await? == 0 {
                tokio::task::yield_now().await;
                continue;
            }
            sum += (raw[0] >> shift) as i64;
            taken += 1;
        }

        let offset = sum.div_euclid(wanted as i64);
        if offset.abs() > i16::MAX as i64 {
            warn!("Unusually large DC offset: {}", offset);
        }

        Ok(offset as i32)
    }
}
