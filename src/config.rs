use std::time::Duration;

/// Configuration descriptor for a [`FilePlayer`](crate::FilePlayer).
///
/// Queue capacities are small on purpose: every queue is a fail-fast
/// bounded hand-off, not a backlog. A full queue drops the item and bumps
/// a diagnostics counter.
#[derive(Debug, Clone)]
pub struct PlayerDesc {
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Number of output channels (typically 2 for stereo).
    pub channels: u16,
    /// Preferred frames per audio callback.
    pub block_size: usize,
    /// Capacity of the control-thread → loader request queue.
    pub request_queue_capacity: usize,
    /// Capacity of the loader → audio-thread result queue.
    pub result_queue_capacity: usize,
    /// Capacity of each reclamation-pool hand-off queue.
    pub retire_queue_capacity: usize,
    /// How long the loader thread parks before re-checking for work.
    /// Safety net against a missed wake; the submit path unparks eagerly.
    pub loader_wake_timeout: Duration,
    /// Cadence of the housekeeping sweep that frees retired sources.
    pub sweep_interval: Duration,
}

impl Default for PlayerDesc {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            channels: 2,
            block_size: 512,
            request_queue_capacity: 16,
            result_queue_capacity: 8,
            retire_queue_capacity: 16,
            loader_wake_timeout: Duration::from_millis(5),
            sweep_interval: Duration::from_secs(1),
        }
    }
}
