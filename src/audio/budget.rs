// Capture buffer sizing against available memory

use tracing::{debug, warn};

/// Bytes per stored sample (16-bit mono)
pub const BYTES_PER_SAMPLE: u64 = 2;

/// Source of the free-memory figure
pub trait MemoryProbe: Send {
    /// Free bytes available for allocation, `None` when unknown
    fn free_bytes(&self) -> Option<u64>;
}

/// Host probe reading `MemAvailable` from `/proc/meminfo`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemMemory;

impl MemoryProbe for SystemMemory {
    fn free_bytes(&self) -> Option<u64> {
        let meminfo = std::fs::read_to_string("/proc/meminfo").ok()?;
        parse_mem_available(&meminfo)
    }
}

fn parse_mem_available(meminfo: &str) -> Option<u64> {
    meminfo
        .lines()
        .find_map(|line| line.strip_prefix("MemAvailable:"))
        .and_then(|rest| rest.trim().strip_suffix("kB"))
        .and_then(|kb| kb.trim().parse::<u64>().ok())
        .map(|kb| kb * 1024)
}

/// Outcome of planning a capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureBudget {
    /// Samples to allocate (rate x duration)
    pub sample_count: u64,
    /// Bytes the sample buffer will occupy
    pub required_bytes: u64,
    /// Free memory reported by the probe
    pub free_bytes: Option<u64>,
    /// Free memory is below `required_bytes + reserve`
    pub constrained: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct CaptureBudgetPlanner {
    reserve_bytes: u64,
}

impl CaptureBudgetPlanner {
    pub fn new(reserve_bytes: u64) -> Self {
        Self { reserve_bytes }
    }

    /// Size the buffer for `sample_rate` x `duration_secs`.
    ///
    /// A shortfall only raises a warning; the configured duration is kept
    /// and the allocation itself decides.
    pub fn plan(&self, sample_rate: u32, duration_secs: u32, probe: &dyn MemoryProbe) -> CaptureBudget {
        let sample_count = sample_rate as u64 * duration_secs as u64;
        let required_bytes = sample_count.saturating_mul(BYTES_PER_SAMPLE);
        let free_bytes = probe.free_bytes();

        let constrained = match free_bytes {
            Some(free) => free < required_bytes.saturating_add(self.reserve_bytes),
            None => false,
        };

        if constrained {
            warn!(
                "Low memory: {} bytes free, capture needs {} + {} reserve; attempting full duration",
                free_bytes.unwrap_or_default(),
                required_bytes,
                self.reserve_bytes
            );
        } else {
            debug!(
                sample_count,
                required_bytes,
                free_bytes = ?free_bytes,
                "capture budget"
            );
        }

        CaptureBudget {
            sample_count,
            required_bytes,
            free_bytes,
            constrained,
        }
    }
}
