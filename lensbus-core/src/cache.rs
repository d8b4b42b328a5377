//! Result cache for the most recent get-result exchange
//!
//! The sensor reports at most [`CACHE_CAPACITY`] detections per request.
//! The cache holds exactly those of the last request: every request starts
//! by clearing all slots, nothing is merged across requests.

use lensbus_protocol::algorithm::bucket_of;
use lensbus_protocol::{Detection, MAX_RESULTS};

use crate::config::ScreenGeometry;

/// Slots in the cache
pub const CACHE_CAPACITY: usize = MAX_RESULTS;

/// Errors from cache operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CacheError {
    /// Slot index is not below [`CACHE_CAPACITY`]
    IndexOutOfRange,
}

/// Detections of one algorithm bucket, one per slot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultCache {
    slots: [Option<Detection>; CACHE_CAPACITY],
    max_id: i16,
    bucket: Option<u8>,
}

impl ResultCache {
    /// Create an empty cache bound to no algorithm
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request for `algorithm_id`: empties every slot
    ///
    /// User-trained model ids share a single bucket.
    pub fn begin_request(&mut self, algorithm_id: u8) {
        self.slots = Default::default();
        self.max_id = 0;
        self.bucket = Some(bucket_of(algorithm_id));
    }

    /// Forget everything, including the bucket
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Bucket the cached detections belong to
    pub fn bucket(&self) -> Option<u8> {
        self.bucket
    }

    /// Returns true if the cache was filled for `algorithm_id`'s bucket
    pub fn holds(&self, algorithm_id: u8) -> bool {
        self.bucket == Some(bucket_of(algorithm_id))
    }

    /// Store a detection; a later store to the same index overwrites
    pub fn store(&mut self, index: usize, detection: Detection) -> Result<(), CacheError> {
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(CacheError::IndexOutOfRange)?;
        *slot = Some(detection);
        Ok(())
    }

    /// Record the learned-id count from the info frame
    pub fn set_learned_count(&mut self, max_id: i16) {
        self.max_id = max_id;
    }

    /// Number of ids learned for the algorithm, as last reported
    pub fn learned_count(&self) -> i16 {
        self.max_id
    }

    /// Number of cached detections
    pub fn count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Cached detections in slot order
    pub fn iter(&self) -> impl Iterator<Item = &Detection> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    pub fn by_index(&self, index: usize) -> Option<&Detection> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// First detection with `id`, in slot order
    pub fn by_id(&self, id: i16) -> Option<&Detection> {
        self.nth_by_id(id, 0)
    }

    pub fn count_by_id(&self, id: i16) -> usize {
        self.iter().filter(|d| d.id == id).count()
    }

    /// The `n`-th (0-based) detection with `id`, in slot order
    pub fn nth_by_id(&self, id: i16, n: usize) -> Option<&Detection> {
        self.iter().filter(|d| d.id == id).nth(n)
    }

    /// Detection closest to the screen center
    ///
    /// Ties keep the lowest slot.
    pub fn nearest_to_center(&self, screen: ScreenGeometry) -> Option<&Detection> {
        let (cx, cy) = screen.center();
        let mut best: Option<(&Detection, i64)> = None;
        for detection in self.iter() {
            let dist = detection.distance_sq_to(cx, cy);
            match best {
                Some((_, best_dist)) if best_dist <= dist => {}
                _ => best = Some((detection, dist)),
            }
        }
        best.map(|(d, _)| d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lensbus_protocol::CUSTOM_BEGIN;
    use proptest::prelude::*;

    fn at(id: i16, x: i16, y: i16) -> Detection {
        Detection {
            id,
            x_center: x,
            y_center: y,
            ..Detection::default()
        }
    }

    #[test]
    fn test_begin_request_clears() {
        let mut cache = ResultCache::new();
        cache.begin_request(1);
        cache.store(0, at(1, 0, 0)).unwrap();
        cache.store(5, at(2, 0, 0)).unwrap();
        cache.set_learned_count(4);
        assert_eq!(cache.count(), 2);

        cache.begin_request(1);
        assert_eq!(cache.count(), 0);
        assert_eq!(cache.learned_count(), 0);
        assert!(cache.by_index(5).is_none());
    }

    #[test]
    fn test_store_bounds_and_overwrite() {
        let mut cache = ResultCache::new();
        assert_eq!(
            cache.store(CACHE_CAPACITY, at(1, 0, 0)),
            Err(CacheError::IndexOutOfRange)
        );
        cache.store(2, at(1, 0, 0)).unwrap();
        cache.store(2, at(7, 0, 0)).unwrap();
        assert_eq!(cache.count(), 1);
        assert_eq!(cache.by_index(2).unwrap().id, 7);
    }

    #[test]
    fn test_nearest_to_center() {
        let mut cache = ResultCache::new();
        cache.store(0, at(1, 0, 0)).unwrap();
        cache.store(1, at(2, 639, 479)).unwrap();
        cache.store(2, at(3, 300, 250)).unwrap();
        let screen = ScreenGeometry::new(640, 480);
        assert_eq!(cache.nearest_to_center(screen).unwrap().id, 3);
    }

    #[test]
    fn test_nearest_corner_pair() {
        let mut cache = ResultCache::new();
        cache.store(0, at(1, 0, 0)).unwrap();
        cache.store(1, at(2, 639, 479)).unwrap();
        // (0,0) is 320²+240², (639,479) is 319²+239²
        let screen = ScreenGeometry::new(640, 480);
        assert_eq!(cache.nearest_to_center(screen).unwrap().id, 2);
    }

    #[test]
    fn test_nearest_tie_keeps_first_slot() {
        let mut cache = ResultCache::new();
        cache.store(1, at(1, 310, 240)).unwrap();
        cache.store(3, at(2, 330, 240)).unwrap();
        let screen = ScreenGeometry::new(640, 480);
        assert_eq!(cache.nearest_to_center(screen).unwrap().id, 1);
        assert!(ResultCache::new().nearest_to_center(screen).is_none());
    }

    #[test]
    fn test_nearest_with_extreme_coordinates() {
        let mut cache = ResultCache::new();
        cache.store(0, at(1, i16::MIN, i16::MIN)).unwrap();
        cache.store(1, at(2, i16::MAX, i16::MIN)).unwrap();
        cache.store(2, at(3, 600, 400)).unwrap();
        let screen = ScreenGeometry::new(640, 480);
        assert_eq!(cache.nearest_to_center(screen).unwrap().id, 3);

        cache.store(2, at(3, i16::MAX, i16::MAX)).unwrap();
        // Only corners left; the positive one is nearest to (320, 240)
        let nearest = cache.nearest_to_center(screen).unwrap();
        assert_eq!((nearest.id, nearest.x_center), (3, i16::MAX));
    }

    #[test]
    fn test_lookup_by_id() {
        let mut cache = ResultCache::new();
        cache.store(0, at(2, 1, 0)).unwrap();
        cache.store(1, at(1, 2, 0)).unwrap();
        cache.store(3, at(2, 3, 0)).unwrap();
        assert_eq!(cache.by_id(2).unwrap().x_center, 1);
        assert_eq!(cache.count_by_id(2), 2);
        assert_eq!(cache.nth_by_id(2, 1).unwrap().x_center, 3);
        assert!(cache.nth_by_id(2, 2).is_none());
        assert!(cache.by_id(9).is_none());
    }

    #[test]
    fn test_user_models_share_bucket() {
        let mut cache = ResultCache::new();
        cache.begin_request(CUSTOM_BEGIN + 4);
        assert!(cache.holds(CUSTOM_BEGIN));
        assert!(cache.holds(200));
        assert!(!cache.holds(1));
        cache.clear();
        assert_eq!(cache.bucket(), None);
    }

    proptest! {
        #[test]
        fn prop_begin_request_always_empties(
            indices in proptest::collection::vec(0usize..CACHE_CAPACITY, 0..12),
            algo in any::<u8>(),
        ) {
            let mut cache = ResultCache::new();
            for (n, i) in indices.into_iter().enumerate() {
                cache.store(i, at(n as i16, 0, 0)).unwrap();
            }
            cache.begin_request(algo);
            prop_assert_eq!(cache.count(), 0);
        }
    }
}
