//! Request/reply transactions
//!
//! A [`Link`] owns the transport, the frame assembler and a small staging
//! buffer for received bytes. [`Link::send_and_wait`] writes a request and
//! polls for the expected reply under a [`RetryPolicy`].

use embedded_hal::delay::DelayNs;
use lensbus_core::config::MAX_READ_CHUNK;
use lensbus_core::{CacheError, RetryPolicy, SessionConfig};
use lensbus_hal::Clock;
use lensbus_protocol::{ArgsView, Command, Frame, FrameAssembler, FrameError, LinkStats, Request};

use crate::transport::Transport;

const STAGING_SIZE: usize = MAX_READ_CHUNK as usize;

/// Reads spent discarding stale input before a request
///
/// I2C reads never come back empty, so draining needs a bound.
const MAX_STALE_READS: usize = 8;

/// Why a transaction failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransactionError {
    /// No matching reply within any attempt
    Timeout,
    /// Reply arrived with a non-OK return value
    Nak(u8),
    /// Every write attempt failed on the bus
    Bus,
    /// Request could not be encoded
    Encode(FrameError),
    /// Reply did not fit the result cache
    Cache(CacheError),
}

impl From<FrameError> for TransactionError {
    fn from(err: FrameError) -> Self {
        TransactionError::Encode(err)
    }
}

impl From<CacheError> for TransactionError {
    fn from(err: CacheError) -> Self {
        TransactionError::Cache(err)
    }
}

/// Check the return value byte of a reply
///
/// Returns the parsed arguments when the byte equals `expected`.
pub fn expect_return(frame: &Frame, expected: u8) -> Result<ArgsView, TransactionError> {
    let args = ArgsView::parse(&frame.content);
    if args.returned(expected) {
        Ok(args)
    } else {
        Err(TransactionError::Nak(args.ret))
    }
}

/// Transport plus receive state for one sensor
pub struct Link<T> {
    transport: T,
    assembler: FrameAssembler,
    staging: [u8; STAGING_SIZE],
    staged_len: usize,
    staged_pos: usize,
    read_chunk: usize,
    poll_interval_ms: u32,
}

impl<T: Transport> Link<T> {
    pub fn new(transport: T, config: &SessionConfig) -> Self {
        Self {
            transport,
            assembler: FrameAssembler::new(),
            staging: [0u8; STAGING_SIZE],
            staged_len: 0,
            staged_pos: 0,
            read_chunk: (config.read_chunk as usize).clamp(1, STAGING_SIZE),
            poll_interval_ms: config.poll_interval_ms.max(1),
        }
    }

    /// Receive counters
    pub fn stats(&self) -> LinkStats {
        self.assembler.stats()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Give the transport back
    pub fn release(self) -> T {
        self.transport
    }

    /// Drop staged bytes and any partial frame
    pub fn flush_rx(&mut self) {
        self.staged_len = 0;
        self.staged_pos = 0;
        self.assembler.reset();
    }

    /// Drop everything received so far, including bytes still queued on
    /// the transport
    ///
    /// Late replies to an earlier request must not answer the next one.
    pub fn discard_stale(&mut self) {
        self.flush_rx();
        let mut scratch = [0u8; STAGING_SIZE];
        let chunk = &mut scratch[..self.read_chunk];
        for _ in 0..MAX_STALE_READS {
            match self.transport.read_available(chunk) {
                Ok(0) | Err(_) => break,
                Ok(n) => trace!("discarded {} stale bytes", n),
            }
        }
    }

    /// Send `request` and wait for a reply with command `expected`
    ///
    /// With `request == None` nothing is written and the call only waits,
    /// which is how follow-up frames of a multi-frame reply are collected.
    /// A request first discards stale input; a pure wait keeps it.
    /// Frames with other commands are dropped without ending the attempt.
    pub fn send_and_wait<C: Clock, D: DelayNs>(
        &mut self,
        clock: &mut C,
        delay: &mut D,
        request: Option<&Request<'_>>,
        expected: Command,
        policy: &RetryPolicy,
    ) -> Result<Frame, TransactionError> {
        let packet = request.map(Request::encode).transpose()?;
        let mut bus_failures = 0u8;

        if packet.is_some() {
            self.discard_stale();
        }

        for attempt in 0..policy.retries {
            if attempt > 0 {
                delay.delay_ms(policy.pause_ms);
            }

            if let Some(packet) = &packet {
                if self.transport.write(packet).is_err() {
                    bus_failures += 1;
                    warn!("write failed (attempt {})", attempt + 1);
                    continue;
                }
                trace!("sent {} bytes, cmd {}", packet.len(), packet[2]);
            }

            if attempt == 0 && policy.first_wait_ms > 0 {
                delay.delay_ms(policy.first_wait_ms);
            }

            if let Some(frame) = self.wait_for(clock, delay, expected, policy.timeout_ms) {
                return Ok(frame);
            }
            debug!(
                "no reply {} (attempt {}/{})",
                expected.to_byte(),
                attempt + 1,
                policy.retries
            );
        }

        if bus_failures > 0 && bus_failures == policy.retries {
            Err(TransactionError::Bus)
        } else {
            Err(TransactionError::Timeout)
        }
    }

    /// Poll until a frame with command `expected` completes or time runs out
    fn wait_for<C: Clock, D: DelayNs>(
        &mut self,
        clock: &mut C,
        delay: &mut D,
        expected: Command,
        timeout_ms: u32,
    ) -> Option<Frame> {
        let start = clock.now_ms();
        let mut first_poll = true;

        loop {
            while let Some(frame) = self.next_staged_frame() {
                if frame.is(expected) {
                    return Some(frame);
                }
                trace!("dropping reply {} while waiting", frame.command);
            }

            if clock.elapsed_since(start) >= timeout_ms as u64 {
                return None;
            }

            // Read right away while a frame is half received
            if !first_poll && (self.staged_len == 0 || self.assembler.is_idle()) {
                delay.delay_ms(self.poll_interval_ms);
            }
            first_poll = false;
            self.fill();
        }
    }

    /// Next frame from the assembler's replay queue or the staged bytes
    fn next_staged_frame(&mut self) -> Option<Frame> {
        let (frame, used) = self
            .assembler
            .feed_bytes(&self.staging[self.staged_pos..self.staged_len]);
        self.staged_pos += used;
        frame
    }

    fn fill(&mut self) {
        let chunk = &mut self.staging[..self.read_chunk];
        let received = match self.transport.read_available(chunk) {
            Ok(n) => n.min(chunk.len()),
            Err(_) => {
                trace!("read failed");
                0
            }
        };
        self.staged_len = received;
        self.staged_pos = 0;
    }
}
