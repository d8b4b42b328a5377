//! Frame encoding and streaming reassembly.
//!
//! Frame format:
//! - HEADER (2 bytes): `0x55 0xAA`
//! - COMMAND (1 byte): opcode, see [`Command`]
//! - ALGO (1 byte): algorithm id the frame refers to
//! - LENGTH (1 byte): content length
//! - CONTENT (LENGTH bytes)
//! - CHECKSUM (1 byte): 8-bit sum of every preceding byte
//!
//! The receive side never fails hard. Bad headers, impossible lengths and
//! checksum mismatches reset the [`FrameAssembler`], which then looks for
//! the next header inside the bytes it just discarded.

use heapless::{Deque, Vec};

use crate::checksum::checksum;
use crate::command::Command;

/// First header byte
pub const HEADER_0: u8 = 0x55;

/// Second header byte
pub const HEADER_1: u8 = 0xAA;

/// Bytes before the content (2 header + command + algo + length)
pub const HEADER_LEN: usize = 5;

/// Receive buffer capacity; no frame may be longer than this
pub const FRAME_BUFFER_SIZE: usize = 128;

/// Largest content a frame can carry
pub const MAX_CONTENT_SIZE: usize = FRAME_BUFFER_SIZE - HEADER_LEN - 1;

/// Replay queue capacity
///
/// Queued bytes plus the partial frame never exceed one buffer plus the
/// byte being fed.
const BACKLOG_SIZE: usize = FRAME_BUFFER_SIZE * 2;

/// Errors that can occur during frame assembly or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Second header byte was not `0xAA`
    HeaderMismatch,
    /// Declared length does not fit the receive buffer
    LengthOverflow,
    /// Checksum mismatch
    InvalidChecksum,
    /// Outgoing content exceeds [`MAX_CONTENT_SIZE`]
    PayloadTooLarge,
}

/// A validated or constructed frame
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame {
    /// Raw command byte
    pub command: u8,
    /// Algorithm id byte
    pub algorithm_id: u8,
    /// Content bytes (header and checksum stripped)
    pub content: Vec<u8, MAX_CONTENT_SIZE>,
}

impl Frame {
    /// Create a frame from raw parts
    pub fn new(command: u8, algorithm_id: u8, content: &[u8]) -> Result<Self, FrameError> {
        let content = Vec::from_slice(content).map_err(|_| FrameError::PayloadTooLarge)?;
        Ok(Self {
            command,
            algorithm_id,
            content,
        })
    }

    /// Decoded command, if the opcode is known
    pub fn command(&self) -> Option<Command> {
        Command::from_byte(self.command)
    }

    /// Returns true if this frame carries `command`
    pub fn is(&self, command: Command) -> bool {
        self.command == command.to_byte()
    }

    /// Encode this frame into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let frame_len = HEADER_LEN + self.content.len() + 1;
        if buffer.len() < frame_len {
            return Err(FrameError::PayloadTooLarge);
        }

        buffer[0] = HEADER_0;
        buffer[1] = HEADER_1;
        buffer[2] = self.command;
        buffer[3] = self.algorithm_id;
        buffer[4] = self.content.len() as u8;
        buffer[HEADER_LEN..frame_len - 1].copy_from_slice(&self.content);
        buffer[frame_len - 1] = checksum(&buffer[..frame_len - 1]);

        Ok(frame_len)
    }

    /// Encode this frame into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, FRAME_BUFFER_SIZE>, FrameError> {
        let mut buffer = [0u8; FRAME_BUFFER_SIZE];
        let len = self.encode(&mut buffer)?;
        Vec::from_slice(&buffer[..len]).map_err(|_| FrameError::PayloadTooLarge)
    }
}

/// Build an outgoing packet
///
/// Layout: `55 AA command algo length payload [name_len name] checksum`.
/// When `name` is present its byte length plus the length byte itself are
/// counted in `length`.
pub fn encode_packet(
    command: Command,
    algorithm_id: u8,
    payload: &[u8],
    name: Option<&str>,
) -> Result<Vec<u8, FRAME_BUFFER_SIZE>, FrameError> {
    let suffix_len = name.map_or(0, |n| n.len() + 1);
    let content_len = payload.len() + suffix_len;
    if content_len > MAX_CONTENT_SIZE {
        return Err(FrameError::PayloadTooLarge);
    }

    let mut out = Vec::<u8, FRAME_BUFFER_SIZE>::new();
    out.extend_from_slice(&[
        HEADER_0,
        HEADER_1,
        command.to_byte(),
        algorithm_id,
        content_len as u8,
    ])
    .map_err(|_| FrameError::PayloadTooLarge)?;
    out.extend_from_slice(payload)
        .map_err(|_| FrameError::PayloadTooLarge)?;
    if let Some(name) = name {
        out.push(name.len() as u8)
            .map_err(|_| FrameError::PayloadTooLarge)?;
        out.extend_from_slice(name.as_bytes())
            .map_err(|_| FrameError::PayloadTooLarge)?;
    }
    let sum = checksum(&out);
    out.push(sum).map_err(|_| FrameError::PayloadTooLarge)?;
    Ok(out)
}

/// Receive-side counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkStats {
    /// Frames that passed the checksum
    pub frames: u32,
    /// Second header byte mismatches
    pub header_mismatches: u32,
    /// Length bytes that would overflow the buffer
    pub length_overflows: u32,
    /// Fully received frames with a bad checksum
    pub checksum_failures: u32,
}

impl LinkStats {
    fn record(&mut self, err: FrameError) {
        match err {
            FrameError::HeaderMismatch => self.header_mismatches += 1,
            FrameError::LengthOverflow => self.length_overflows += 1,
            FrameError::InvalidChecksum => self.checksum_failures += 1,
            FrameError::PayloadTooLarge => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum AssemblerState {
    /// Waiting for 0x55
    ExpectHeader0,
    /// Got 0x55, waiting for 0xAA
    ExpectHeader1,
    ExpectCommand,
    ExpectAlgo,
    ExpectLength,
    /// Content bytes, then the checksum
    AccumulateBody,
}

/// State machine reassembling frames from an arbitrary byte stream
///
/// Bytes of a dropped partial frame go back into a replay queue, minus the
/// first header byte, so every frame hidden behind a false header is still
/// delivered in order.
#[derive(Debug, Clone)]
pub struct FrameAssembler {
    state: AssemblerState,
    buffer: [u8; FRAME_BUFFER_SIZE],
    cursor: usize,
    backlog: Deque<u8, BACKLOG_SIZE>,
    stats: LinkStats,
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameAssembler {
    /// Create a new assembler waiting for a header
    pub fn new() -> Self {
        Self {
            state: AssemblerState::ExpectHeader0,
            buffer: [0u8; FRAME_BUFFER_SIZE],
            cursor: 0,
            backlog: Deque::new(),
            stats: LinkStats::default(),
        }
    }

    /// Drop any partial frame and every byte queued for replay
    pub fn reset(&mut self) {
        self.restart();
        self.backlog.clear();
    }

    /// Returns true when no partial frame or replay bytes are buffered
    pub fn is_idle(&self) -> bool {
        self.state == AssemblerState::ExpectHeader0 && self.backlog.is_empty()
    }

    /// Returns true when replayed bytes still wait to be parsed
    pub fn has_backlog(&self) -> bool {
        !self.backlog.is_empty()
    }

    /// Counters since creation
    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    /// Feed a single byte
    ///
    /// Returns `Ok(Some(frame))` when a frame completes, `Ok(None)` when
    /// more bytes are needed, or `Err` when a partial frame was dropped.
    /// Errors are informational: the assembler has already resynchronized.
    /// Replay bytes queued earlier are parsed before `byte`.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Frame>, FrameError> {
        if self.backlog.push_back(byte).is_err() {
            self.reset();
            return Err(FrameError::LengthOverflow);
        }
        self.replay()
    }

    /// Next frame recovered from replay bytes, without new input
    pub fn poll(&mut self) -> Option<Frame> {
        self.replay().ok().flatten()
    }

    /// Feed bytes until a frame completes
    ///
    /// Returns the frame (if any) and how many bytes were consumed, so the
    /// caller can keep the rest for the next call. A frame waiting in the
    /// replay queue comes out first, with zero bytes consumed.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> (Option<Frame>, usize) {
        if let Some(frame) = self.poll() {
            return (Some(frame), 0);
        }
        for (i, &byte) in bytes.iter().enumerate() {
            if let Ok(Some(frame)) = self.feed(byte) {
                return (Some(frame), i + 1);
            }
        }
        (None, bytes.len())
    }

    /// Parse queued bytes until a frame completes or the queue runs dry
    ///
    /// Reports the first error seen when no frame completed.
    fn replay(&mut self) -> Result<Option<Frame>, FrameError> {
        let mut dropped = None;
        while let Some(byte) = self.backlog.pop_front() {
            match self.step(byte) {
                Ok(Some(frame)) => {
                    self.stats.frames += 1;
                    return Ok(Some(frame));
                }
                Ok(None) => {}
                Err(err) => {
                    self.stats.record(err);
                    self.requeue();
                    dropped.get_or_insert(err);
                }
            }
        }
        dropped.map_or(Ok(None), Err)
    }

    /// Put a dropped partial frame back in front of the queue, skipping
    /// its first header byte
    fn requeue(&mut self) {
        let start = self.cursor.min(1);
        for &byte in self.buffer[start..self.cursor].iter().rev() {
            // Capacity covers a full buffer on top of the queue
            let _ = self.backlog.push_front(byte);
        }
        self.restart();
    }

    fn restart(&mut self) {
        self.state = AssemblerState::ExpectHeader0;
        self.cursor = 0;
    }

    /// Advance the state machine by one byte without recovery
    fn step(&mut self, byte: u8) -> Result<Option<Frame>, FrameError> {
        match self.state {
            AssemblerState::ExpectHeader0 => {
                // Anything but a header start is line noise
                if byte == HEADER_0 {
                    self.buffer[0] = byte;
                    self.cursor = 1;
                    self.state = AssemblerState::ExpectHeader1;
                }
                Ok(None)
            }
            AssemblerState::ExpectHeader1 => {
                self.push(byte);
                if byte != HEADER_1 {
                    return Err(FrameError::HeaderMismatch);
                }
                self.state = AssemblerState::ExpectCommand;
                Ok(None)
            }
            AssemblerState::ExpectCommand => {
                self.push(byte);
                self.state = AssemblerState::ExpectAlgo;
                Ok(None)
            }
            AssemblerState::ExpectAlgo => {
                self.push(byte);
                self.state = AssemblerState::ExpectLength;
                Ok(None)
            }
            AssemblerState::ExpectLength => {
                self.push(byte);
                if HEADER_LEN + byte as usize + 1 > FRAME_BUFFER_SIZE {
                    return Err(FrameError::LengthOverflow);
                }
                self.state = AssemblerState::AccumulateBody;
                Ok(None)
            }
            AssemblerState::AccumulateBody => {
                self.push(byte);
                let checksum_pos = HEADER_LEN + self.buffer[4] as usize;
                if self.cursor <= checksum_pos {
                    return Ok(None);
                }

                if checksum(&self.buffer[..checksum_pos]) != byte {
                    return Err(FrameError::InvalidChecksum);
                }

                let frame = Frame::new(
                    self.buffer[2],
                    self.buffer[3],
                    &self.buffer[HEADER_LEN..checksum_pos],
                )?;
                self.restart();
                Ok(Some(frame))
            }
        }
    }

    fn push(&mut self, byte: u8) {
        // The length check keeps cursor below the capacity
        if self.cursor < FRAME_BUFFER_SIZE {
            self.buffer[self.cursor] = byte;
            self.cursor += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn get_result_packet() -> Vec<u8, FRAME_BUFFER_SIZE> {
        encode_packet(Command::GetResult, 1, &[], None).unwrap()
    }

    #[test]
    fn test_encode_get_result() {
        let packet = get_result_packet();
        assert_eq!(packet.as_slice(), &[0x55, 0xAA, 0x01, 0x01, 0x00, 0x01]);
    }

    #[test]
    fn test_encode_name_suffix() {
        let packet = encode_packet(Command::SetNameById, 1, &[0, 0, 2, 0], Some("cat")).unwrap();
        // 4 payload bytes + length byte + 3 name bytes
        assert_eq!(packet[4], 8);
        assert_eq!(packet[9], 3);
        assert_eq!(&packet[10..13], b"cat");
        assert_eq!(packet.len(), HEADER_LEN + 8 + 1);
        assert!(crate::checksum::verify(&packet));
    }

    #[test]
    fn test_encode_payload_too_large() {
        let payload = [0u8; MAX_CONTENT_SIZE];
        assert!(encode_packet(Command::DrawText, 0, &payload, None).is_ok());
        assert_eq!(
            encode_packet(Command::DrawText, 0, &payload, Some("")),
            Err(FrameError::PayloadTooLarge)
        );
    }

    #[test]
    fn test_assemble_single_frame() {
        let packet = get_result_packet();
        let mut asm = FrameAssembler::new();
        let (frame, used) = asm.feed_bytes(&packet);
        let frame = frame.unwrap();
        assert_eq!(used, packet.len());
        assert!(frame.is(Command::GetResult));
        assert_eq!(frame.algorithm_id, 1);
        assert!(frame.content.is_empty());
        assert!(asm.is_idle());
    }

    #[test]
    fn test_assemble_across_chunks() {
        let frame = Frame::new(0x1C, 1, &[3, 0, 10, 0, 20, 0, 5, 0, 6, 0, 0]).unwrap();
        let encoded = frame.encode_to_vec().unwrap();
        let mut asm = FrameAssembler::new();
        let mut parsed = None;
        for chunk in encoded.chunks(3) {
            let (f, _) = asm.feed_bytes(chunk);
            if f.is_some() {
                parsed = f;
            }
        }
        assert_eq!(parsed, Some(frame));
    }

    #[test]
    fn test_invalid_checksum_discarded() {
        let mut packet = get_result_packet();
        let last = packet.len() - 1;
        packet[last] ^= 0xFF;

        let mut asm = FrameAssembler::new();
        let mut result = Ok(None);
        for &b in packet.iter() {
            result = asm.feed(b);
        }
        assert_eq!(result, Err(FrameError::InvalidChecksum));
        assert_eq!(asm.stats().checksum_failures, 1);
        assert!(asm.is_idle());
    }

    #[test]
    fn test_header_mismatch_reported() {
        let mut asm = FrameAssembler::new();
        assert_eq!(asm.feed(0x55), Ok(None));
        assert_eq!(asm.feed(0x12), Err(FrameError::HeaderMismatch));
        assert!(asm.is_idle());
        assert_eq!(asm.stats().header_mismatches, 1);
    }

    #[test]
    fn test_repeated_header_byte() {
        // 55 55 AA: the second 0x55 starts the real header
        let packet = get_result_packet();
        let mut data = Vec::<u8, 16>::new();
        data.push(0x55).unwrap();
        data.extend_from_slice(&packet).unwrap();

        let mut asm = FrameAssembler::new();
        let (frame, _) = asm.feed_bytes(&data);
        assert!(frame.unwrap().is(Command::GetResult));
    }

    #[test]
    fn test_length_overflow_resets() {
        let mut asm = FrameAssembler::new();
        for &b in &[0x55, 0xAA, 0x1C, 0x01] {
            assert_eq!(asm.feed(b), Ok(None));
        }
        assert_eq!(asm.feed(123), Err(FrameError::LengthOverflow));
        assert!(asm.is_idle());

        // A maximal frame still fits
        let frame = Frame::new(0x1C, 1, &[7u8; MAX_CONTENT_SIZE]).unwrap();
        let (parsed, _) = asm.feed_bytes(&frame.encode_to_vec().unwrap());
        assert_eq!(parsed, Some(frame));
    }

    #[test]
    fn test_garbage_prefix_yields_one_frame() {
        let mut data = Vec::<u8, 16>::new();
        data.extend_from_slice(&[0xAA, 0x55, 0xAA]).unwrap();
        data.extend_from_slice(&get_result_packet()).unwrap();

        let mut asm = FrameAssembler::new();
        let mut frames = 0;
        for &b in data.iter() {
            if let Ok(Some(_)) = asm.feed(b) {
                frames += 1;
            }
        }
        assert_eq!(frames, 1);
    }

    #[test]
    fn test_false_header_does_not_hide_real_frame() {
        let info = Frame::new(0x1B, 1, &[0, 0, 2, 0, 1, 0, 1, 0, 0, 0]).unwrap();
        let mut data = Vec::<u8, 64>::new();
        data.extend_from_slice(&[0xAA, 0x55, 0xAA]).unwrap();
        data.extend_from_slice(&info.encode_to_vec().unwrap()).unwrap();
        // Idle bus filler until the false frame's checksum position
        data.extend_from_slice(&[0u8; 16]).unwrap();

        let mut asm = FrameAssembler::new();
        let mut parsed = None;
        for &b in data.iter() {
            if let Ok(Some(frame)) = asm.feed(b) {
                parsed = Some(frame);
            }
        }
        assert_eq!(parsed, Some(info));
    }

    fn swallowed_burst() -> (Frame, Frame, Vec<u8, 80>) {
        let info = Frame::new(0x1B, 1, &[0, 0, 2, 0, 1, 0, 1, 0, 0, 0]).unwrap();
        let block = Frame::new(0x1C, 1, &[1, 0, 10, 0, 20, 0, 5, 0, 6, 0, 0]).unwrap();
        let mut data = Vec::<u8, 80>::new();
        // Declares 60 content bytes, covering both real frames
        data.extend_from_slice(&[0x55, 0xAA, 0x1C, 0x01, 60]).unwrap();
        data.extend_from_slice(&info.encode_to_vec().unwrap()).unwrap();
        data.extend_from_slice(&block.encode_to_vec().unwrap()).unwrap();
        // Filler through the false checksum position
        data.extend_from_slice(&[0u8; 28]).unwrap();
        (info, block, data)
    }

    #[test]
    fn test_every_frame_behind_false_header_is_delivered() {
        let (info, block, data) = swallowed_burst();

        let mut asm = FrameAssembler::new();
        let mut parsed = std::vec::Vec::new();
        for &b in data.iter() {
            if let Ok(Some(frame)) = asm.feed(b) {
                parsed.push(frame);
            }
        }
        assert!(asm.has_backlog());
        while let Some(frame) = asm.poll() {
            parsed.push(frame);
        }

        assert_eq!(parsed, [info, block]);
        assert_eq!(asm.stats().frames, 2);
        assert_eq!(asm.stats().checksum_failures, 1);
        assert!(asm.is_idle());
    }

    #[test]
    fn test_feed_bytes_serves_backlog_first() {
        let (info, block, data) = swallowed_burst();

        let mut asm = FrameAssembler::new();
        let (first, used) = asm.feed_bytes(&data);
        assert_eq!(first, Some(info));
        assert_eq!(used, data.len());

        let next = get_result_packet();
        let (second, used) = asm.feed_bytes(&next);
        assert_eq!(second, Some(block));
        assert_eq!(used, 0);

        let (third, _) = asm.feed_bytes(&next);
        assert!(third.unwrap().is(Command::GetResult));
    }

    #[test]
    fn test_reset_drops_backlog() {
        let (_, _, data) = swallowed_burst();
        let mut asm = FrameAssembler::new();
        asm.feed_bytes(&data);
        asm.reset();
        assert!(asm.is_idle());
        assert_eq!(asm.poll(), None);
    }

    #[test]
    fn test_feed_bytes_keeps_remainder() {
        let first = get_result_packet();
        let second = encode_packet(Command::Knock, 0, &[], None).unwrap();
        let mut data = Vec::<u8, 16>::new();
        data.extend_from_slice(&first).unwrap();
        data.extend_from_slice(&second).unwrap();

        let mut asm = FrameAssembler::new();
        let (frame, used) = asm.feed_bytes(&data);
        assert!(frame.unwrap().is(Command::GetResult));
        let (frame, _) = asm.feed_bytes(&data[used..]);
        assert!(frame.unwrap().is(Command::Knock));
        assert_eq!(asm.stats().frames, 2);
    }

    proptest! {
        #[test]
        fn prop_encode_then_assemble(
            command in any::<u8>(),
            algorithm_id in any::<u8>(),
            content in proptest::collection::vec(any::<u8>(), 0..=MAX_CONTENT_SIZE),
        ) {
            let frame = Frame::new(command, algorithm_id, &content).unwrap();
            let encoded = frame.encode_to_vec().unwrap();
            let mut asm = FrameAssembler::new();
            let (parsed, used) = asm.feed_bytes(&encoded);
            prop_assert_eq!(parsed, Some(frame));
            prop_assert_eq!(used, encoded.len());
        }

        #[test]
        fn prop_single_byte_flip_breaks_checksum(
            content in proptest::collection::vec(any::<u8>(), 0..32),
            index in any::<prop::sample::Index>(),
            mask in 1u8..=255,
        ) {
            let frame = Frame::new(0x1C, 1, &content).unwrap();
            let mut encoded = frame.encode_to_vec().unwrap();
            let i = index.index(encoded.len());
            encoded[i] ^= mask;
            prop_assert!(!crate::checksum::verify(&encoded));
        }

        #[test]
        fn prop_noise_never_panics(noise in proptest::collection::vec(any::<u8>(), 0..512)) {
            let mut asm = FrameAssembler::new();
            for b in noise {
                let _ = asm.feed(b);
            }
        }
    }
}
