//! Ambient configuration surface (SPEC_FULL "Configuration").
//!
//! Neither struct here changes wire semantics by itself; both exist so a
//! caller driving the streaming reader/encoder has a real, documented
//! knob set instead of constants buried in the implementation.

pub use ch_types::DecodeOptions;

/// Tunables for the streaming reader's growth policy and the encoder's
/// chunk budget (spec §4.8 `pullMore`, §4.9 "bounded chunk budget C").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    /// Initial capacity reserved for the reader's accumulator buffer.
    pub initial_capacity: usize,
    /// The encoder's chunk budget `C`: once the scratch buffer's write
    /// offset reaches `chunk_budget - safety_margin`, a chunk is yielded
    /// and the buffer resets.
    pub chunk_budget: usize,
    /// Bytes of headroom subtracted from `chunk_budget` before yielding,
    /// so one more row's worth of encoding never has to grow the buffer
    /// mid-row right at the boundary.
    pub safety_margin: usize,
}

impl StreamConfig {
    /// `chunk_budget - safety_margin`, the point at which the encoder
    /// yields its current buffer.
    pub fn yield_threshold(&self) -> usize {
        self.chunk_budget.saturating_sub(self.safety_margin)
    }
}

impl Default for StreamConfig {
    /// 64 KiB chunks with an 4 KiB safety margin — comfortably larger
    /// than any single encoded row in practice, and a natural alignment
    /// with typical TCP/compression block sizes (spec §4.9 discusses
    /// tuning this against exactly those).
    fn default() -> Self {
        Self {
            initial_capacity: 8 * 1024,
            chunk_budget: 64 * 1024,
            safety_margin: 4 * 1024,
        }
    }
}
