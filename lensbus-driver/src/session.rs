//! Command facade
//!
//! [`Session`] owns everything one sensor needs: the link, the result
//! cache, the clock and the delay. Public operations never return errors;
//! they degrade to `false`, `None` or `0` and keep the cause in
//! [`Session::last_error`].

use embedded_hal::delay::DelayNs;
use lensbus_core::{LineTrack, ResultCache, RetryPolicy, SessionConfig};
use lensbus_hal::Clock;
use lensbus_protocol::{
    Algorithm, ArgsView, Color, Command, Detection, InfoView, LinkStats, Rect, Request, RETURN_OK,
};

use crate::transaction::{expect_return, Link, TransactionError};
use crate::transport::Transport;

/// Which retry policy a request runs under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PolicyKind {
    Knock,
    Command,
    SwitchAlgorithm,
}

/// A connection to one sensor
pub struct Session<T, C, D> {
    link: Link<T>,
    clock: C,
    delay: D,
    config: SessionConfig,
    cache: ResultCache,
    algorithm: Option<Algorithm>,
    last_error: Option<TransactionError>,
}

impl<T, C, D> Session<T, C, D>
where
    T: Transport,
    C: Clock,
    D: DelayNs,
{
    pub fn new(transport: T, clock: C, delay: D, config: SessionConfig) -> Self {
        Self {
            link: Link::new(transport, &config),
            clock,
            delay,
            config,
            cache: ResultCache::new(),
            algorithm: None,
            last_error: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Cause of the most recent failed operation, cleared on success
    pub fn last_error(&self) -> Option<TransactionError> {
        self.last_error
    }

    /// Receive counters of the underlying link
    pub fn link_stats(&self) -> LinkStats {
        self.link.stats()
    }

    /// Algorithm last switched to successfully
    pub fn algorithm(&self) -> Option<Algorithm> {
        self.algorithm
    }

    pub fn transport_mut(&mut self) -> &mut T {
        self.link.transport_mut()
    }

    /// Tear the session down, returning the transport
    pub fn release(self) -> T {
        self.link.release()
    }

    /// Handshake with the sensor
    pub fn knock(&mut self) -> bool {
        let result = self.command(&Request::Knock, PolicyKind::Knock);
        self.finish(result).is_some()
    }

    /// Select the active recognition algorithm
    ///
    /// Cached results of another bucket are dropped on success.
    pub fn switch_algorithm(&mut self, algorithm: Algorithm) -> bool {
        let result = self.command(
            &Request::SetAlgorithm { algorithm },
            PolicyKind::SwitchAlgorithm,
        );
        if self.finish(result).is_none() {
            return false;
        }
        if !self.cache.holds(algorithm.id()) {
            self.cache.clear();
        }
        debug!("switched to algorithm {}", algorithm.id());
        self.algorithm = Some(algorithm);
        true
    }

    /// Fetch the current detections of `algorithm` into the cache
    ///
    /// Returns the number of cached detections; 0 on failure, in which case
    /// the cache is empty.
    pub fn get_result(&mut self, algorithm: Algorithm) -> usize {
        let result = self.fetch_results(algorithm);
        match self.finish(result) {
            Some(count) => count,
            None => {
                self.cache.clear();
                0
            }
        }
    }

    /// Detections of the last successful [`Session::get_result`]
    pub fn results(&self) -> &ResultCache {
        &self.cache
    }

    /// Cached detections, if they were fetched for `algorithm`'s bucket
    pub fn results_for(&self, algorithm: Algorithm) -> Option<&ResultCache> {
        self.cache
            .holds(algorithm.id())
            .then_some(&self.cache)
    }

    /// Cached detection closest to the screen center
    pub fn nearest_to_center(&self) -> Option<&Detection> {
        self.cache.nearest_to_center(self.config.screen)
    }

    /// Line-tracking view over the cache
    pub fn line(&self) -> LineTrack<'_> {
        LineTrack::new(&self.cache)
    }

    /// Learn the target in view, returning the id the sensor assigned
    pub fn learn(&mut self, algorithm: Algorithm) -> Option<i16> {
        let result = self.command(&Request::Learn { algorithm }, PolicyKind::Command);
        self.finish(result).map(|args| args.values[0])
    }

    /// Learn the target inside `rect`, returning the assigned id
    pub fn learn_block(&mut self, algorithm: Algorithm, rect: Rect) -> Option<i16> {
        let result = self.command(&Request::LearnBlock { algorithm, rect }, PolicyKind::Command);
        self.finish(result).map(|args| args.values[0])
    }

    /// Forget every learned id of `algorithm`
    pub fn forget(&mut self, algorithm: Algorithm) -> bool {
        let result = self.command(&Request::Forget { algorithm }, PolicyKind::Command);
        self.finish(result).is_some()
    }

    /// Attach a display name to learned `id`
    pub fn set_name(&mut self, algorithm: Algorithm, id: i16, name: &str) -> bool {
        let request = Request::SetNameById {
            algorithm,
            id,
            name,
        };
        let result = self.command(&request, PolicyKind::Command);
        self.finish(result).is_some()
    }

    /// Read algorithm parameter `index`
    pub fn algorithm_param(&mut self, algorithm: Algorithm, index: u8) -> Option<i16> {
        let result = self.command(
            &Request::GetAlgoParam { algorithm, index },
            PolicyKind::Command,
        );
        self.finish(result).map(|args| args.values[0])
    }

    pub fn draw_rect(&mut self, color: Color, line_width: u8, rect: Rect) -> bool {
        self.simple(&Request::DrawRect {
            color,
            line_width,
            rect,
        })
    }

    /// Draw a rectangle that replaces the previous unique one
    pub fn draw_unique_rect(&mut self, color: Color, line_width: u8, rect: Rect) -> bool {
        self.simple(&Request::DrawUniqueRect {
            color,
            line_width,
            rect,
        })
    }

    pub fn clear_rect(&mut self) -> bool {
        self.simple(&Request::ClearRect)
    }

    pub fn draw_text(&mut self, color: Color, font_size: u8, x: i16, y: i16, text: &str) -> bool {
        self.simple(&Request::DrawText {
            color,
            font_size,
            x,
            y,
            text,
        })
    }

    pub fn clear_text(&mut self) -> bool {
        self.simple(&Request::ClearText)
    }

    /// Play `file` from the sensor's storage; volume is clamped to 0-100
    pub fn play_music(&mut self, file: &str, volume: u8, duration_ms: u16) -> bool {
        self.simple(&Request::PlayMusic {
            file,
            volume,
            duration_ms,
        })
    }

    pub fn take_photo(&mut self, resolution: u8) -> bool {
        self.simple(&Request::TakePhoto { resolution })
    }

    pub fn take_screenshot(&mut self) -> bool {
        self.simple(&Request::TakeScreenshot)
    }

    fn simple(&mut self, request: &Request<'_>) -> bool {
        let result = self.command(request, PolicyKind::Command);
        self.finish(result).is_some()
    }

    fn policy(&self, kind: PolicyKind) -> RetryPolicy {
        match kind {
            PolicyKind::Knock => self.config.knock,
            PolicyKind::Command => self.config.command,
            PolicyKind::SwitchAlgorithm => self.config.switch_algorithm,
        }
    }

    /// Send a request answered by a single `ReturnArgs` and check it
    fn command(
        &mut self,
        request: &Request<'_>,
        kind: PolicyKind,
    ) -> Result<ArgsView, TransactionError> {
        let policy = self.policy(kind);
        let frame = self.link.send_and_wait(
            &mut self.clock,
            &mut self.delay,
            Some(request),
            request.expected_reply(),
            &policy,
        )?;
        expect_return(&frame, RETURN_OK)
    }

    /// Info frame, then one frame per result: blocks first, then arrows
    fn fetch_results(&mut self, algorithm: Algorithm) -> Result<usize, TransactionError> {
        self.cache.begin_request(algorithm.id());
        let policy = self.policy(PolicyKind::Command);

        let request = Request::GetResult { algorithm };
        let frame = self.link.send_and_wait(
            &mut self.clock,
            &mut self.delay,
            Some(&request),
            Command::ReturnInfo,
            &policy,
        )?;
        let info = InfoView::parse(&frame.content);
        self.cache.set_learned_count(info.max_id);
        trace!(
            "info: max_id {} blocks {} results {}",
            info.max_id,
            info.total_blocks,
            info.total_results
        );

        let blocks = info.blocks();
        for index in 0..info.results() {
            let expected = if index < blocks {
                Command::ReturnBlock
            } else {
                Command::ReturnArrow
            };
            let frame = self.link.send_and_wait(
                &mut self.clock,
                &mut self.delay,
                None,
                expected,
                &policy,
            )?;
            if let Some(detection) = Detection::decode(expected, Some(algorithm), &frame.content) {
                self.cache.store(index, detection)?;
            }
        }

        Ok(self.cache.count())
    }

    /// Record the outcome of an operation
    fn finish<V>(&mut self, result: Result<V, TransactionError>) -> Option<V> {
        match result {
            Ok(value) => {
                self.last_error = None;
                Some(value)
            }
            Err(err) => {
                warn!("transaction failed: {}", err);
                self.last_error = Some(err);
                None
            }
        }
    }
}
