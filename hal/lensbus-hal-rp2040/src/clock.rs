//! Monotonic clock from the embassy time driver

use embassy_time::Instant;
use lensbus_hal::Clock;

/// [`Clock`] reading `embassy_time::Instant`
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_ms(&mut self) -> u64 {
        Instant::now().as_millis()
    }
}
