use anyhow::{Context, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::info;

use crate::error::EncodeError;

/// Size of the canonical PCM header written by [`WaveEncoder`]
pub const WAV_HEADER_LEN: u64 = 44;

/// Writes mono 16-bit PCM recordings as canonical RIFF/WAVE files
#[derive(Debug, Clone, Copy, Default)]
pub struct WaveEncoder;

impl WaveEncoder {
    pub fn spec(sample_rate: u32) -> WavSpec {
        WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        }
    }

    /// Write `samples` to `path`, replacing any existing file.
    ///
    /// Returns the number of bytes on storage.
    pub fn write(&self, path: &Path, samples: &[i16], sample_rate: u32) -> Result<u64, EncodeError> {
        let file = File::create(path)?;
        let mut writer = WavWriter::new(BufWriter::new(file), Self::spec(sample_rate))?;

        for &sample in samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;

        let written = std::fs::metadata(path)?.len();
        info!(
            "Wrote {} ({} samples, {} bytes)",
            path.display(),
            samples.len(),
            written
        );

        Ok(written)
    }
}

/// A recording read back from storage
pub struct WaveFile {
    pub path: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub samples: Vec<i16>,
}

impl WaveFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let reader = WavReader::open(path)
            .with_context(|| format!("Failed to open WAV file: {}", path.display()))?;

        let spec = reader.spec();
        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read audio samples")?;

        let duration_seconds = samples.len() as f64 /
            (spec.sample_rate as f64 * spec.channels as f64);

        Ok(Self {
            path: path.display().to_string(),
            duration_seconds,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            bits_per_sample: spec.bits_per_sample,
            samples,
        })
    }
}
