//! Retry policies for request/reply transactions

use serde::{Deserialize, Serialize};

/// Per-attempt reply timeout
pub const DEFAULT_TIMEOUT_MS: u32 = 2000;

/// How a transaction retries
///
/// Each attempt sends the request (if any), then polls for the expected
/// reply until `timeout_ms` elapses. Failed attempts sleep `pause_ms`
/// before the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RetryPolicy {
    /// Attempts before giving up, at least 1
    pub retries: u8,
    /// Sleep between failed attempts
    pub pause_ms: u32,
    /// Reply deadline for one attempt
    pub timeout_ms: u32,
    /// Sleep after the first write before polling
    pub first_wait_ms: u32,
}

impl RetryPolicy {
    /// Handshake during connect
    pub const KNOCK: Self = Self::new(20, 100);

    /// Ordinary commands
    pub const COMMAND: Self = Self::new(3, 100);

    /// Algorithm switch, the sensor needs time to load models
    pub const SWITCH_ALGORITHM: Self = Self::new(3, 1000);

    pub const fn new(retries: u8, pause_ms: u32) -> Self {
        Self {
            retries,
            pause_ms,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            first_wait_ms: 0,
        }
    }

    pub const fn with_timeout(mut self, timeout_ms: u32) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub const fn with_first_wait(mut self, first_wait_ms: u32) -> Self {
        self.first_wait_ms = first_wait_ms;
        self
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::COMMAND
    }
}
