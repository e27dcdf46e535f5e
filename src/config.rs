use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable prefix, e.g. `VOICE_DROP__DELIVERY__ENDPOINT`
pub const ENV_PREFIX: &str = "VOICE_DROP";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub network: NetworkConfig,
    pub delivery: DeliveryConfig,
    pub recording: RecordingConfig,
    pub timing: TimingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub ssid: Option<String>,
    pub password: Option<String>,
    pub connect_retries: u32,
    pub retry_interval_ms: u64,
    pub probe_timeout_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            ssid: None,
            password: None,
            connect_retries: 20,
            retry_interval_ms: 500,
            probe_timeout_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Webhook URL; empty means delivery is not configured
    pub endpoint: String,
    pub boundary: String,
    pub filename: String,
    pub timeout_secs: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            boundary: "---ESP32Boundary".to_string(),
            filename: "record.wav".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    pub sample_rate: u32,
    pub duration_secs: u32,
    /// Right shift applied to each raw 32-bit word to reach 16-bit range
    pub bit_shift: u32,
    pub wav_path: PathBuf,
    /// Driver-side read-ahead buffer in bytes
    pub read_ahead_bytes: usize,
    pub chunk_samples: usize,
    pub calibration_chunks: usize,
    /// Free memory kept back for the rest of the system
    pub memory_reserve_bytes: u64,
    /// Capture device name; `None` picks the host default
    pub input_device: Option<String>,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            duration_secs: 20,
            bit_shift: 15,
            wav_path: PathBuf::from("record.wav"),
            read_ahead_bytes: 40_000,
            chunk_samples: 1024,
            calibration_chunks: 20,
            memory_reserve_bytes: 50_000,
            input_device: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub debounce_ms: u64,
    pub settle_ms: u64,
    pub blink_count: u32,
    pub blink_period_ms: u64,
    pub success_hold_ms: u64,
    pub idle_poll_ms: u64,
    pub startup_hold_ms: u64,
    pub offline_blink_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 1000,
            settle_ms: 50,
            blink_count: 5,
            blink_period_ms: 200,
            success_hold_ms: 2000,
            idle_poll_ms: 50,
            startup_hold_ms: 1000,
            offline_blink_ms: 500,
        }
    }
}

impl TimingConfig {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn blink_period(&self) -> Duration {
        Duration::from_millis(self.blink_period_ms)
    }

    pub fn success_hold(&self) -> Duration {
        Duration::from_millis(self.success_hold_ms)
    }

    pub fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.idle_poll_ms)
    }

    /// Zero every delay, keeping counts and the debounce window.
    pub fn immediate() -> Self {
        Self {
            settle_ms: 0,
            blink_period_ms: 0,
            success_hold_ms: 0,
            idle_poll_ms: 0,
            startup_hold_ms: 0,
            offline_blink_ms: 0,
            ..Self::default()
        }
    }
}

impl Config {
    /// Load from an optional file (`path` without extension) overlaid by
    /// `VOICE_DROP__SECTION__KEY` environment variables.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path))?;

        let cfg: Self = settings
            .try_deserialize()
            .context("Failed to parse configuration")?;
        cfg.validate()?;

        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        let rec = &self.recording;
        if rec.sample_rate == 0 {
            bail!("recording.sample_rate must be positive");
        }
        if rec.duration_secs == 0 {
            bail!("recording.duration_secs must be positive");
        }
        if rec.bit_shift >= 32 {
            bail!("recording.bit_shift must be below 32, got {}", rec.bit_shift);
        }
        if rec.chunk_samples == 0 {
            bail!("recording.chunk_samples must be positive");
        }
        if rec.calibration_chunks == 0 {
            bail!("recording.calibration_chunks must be positive");
        }
        Ok(())
    }
}
