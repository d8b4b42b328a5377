//! Line-tracking view
//!
//! For line tracking the sensor reports arrows. The arrow in slot 0 is the
//! line being followed when its `level` is 1; the remaining slots hold
//! the branches at the next junction.

use lensbus_protocol::Detection;

use crate::cache::{ResultCache, CACHE_CAPACITY};

/// Level of the arrow the robot is currently on
pub const MAIN_LINE_LEVEL: u8 = 1;

/// Read-only line-tracking accessors over a [`ResultCache`]
#[derive(Debug, Clone, Copy)]
pub struct LineTrack<'a> {
    cache: &'a ResultCache,
}

impl<'a> LineTrack<'a> {
    pub fn new(cache: &'a ResultCache) -> Self {
        Self { cache }
    }

    /// The arrow being followed, if the sensor sees one
    pub fn current(&self) -> Option<&'a Detection> {
        self.cache
            .by_index(0)
            .filter(|d| d.level == MAIN_LINE_LEVEL)
    }

    /// Number of branches at the next junction
    pub fn branch_count(&self) -> usize {
        self.cache.count().saturating_sub(1)
    }

    /// Branch `n` (0-based)
    pub fn branch(&self, n: usize) -> Option<&'a Detection> {
        self.cache.by_index(n.checked_add(1)?)
    }

    pub fn branches(&self) -> impl Iterator<Item = &'a Detection> {
        let cache = self.cache;
        (1..CACHE_CAPACITY).filter_map(move |i| cache.by_index(i))
    }
}
