//! Scripted sensor, fake clock and delay shared by the integration tests

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use lensbus_driver::{Session, SessionConfig, Transport};
use lensbus_hal::Clock;
use lensbus_protocol::{Command, Frame};

/// Shared virtual time in nanoseconds
#[derive(Debug, Clone, Default)]
pub struct VirtualTime(Rc<Cell<u64>>);

impl VirtualTime {
    pub fn now_ms(&self) -> u64 {
        self.0.get() / 1_000_000
    }

    fn advance_ns(&self, ns: u64) {
        self.0.set(self.0.get() + ns);
    }
}

pub struct FakeClock(pub VirtualTime);

impl Clock for FakeClock {
    fn now_ms(&mut self) -> u64 {
        self.0.now_ms()
    }
}

/// Delay that only moves virtual time forward
pub struct FakeDelay(pub VirtualTime);

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.advance_ns(ns as u64);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.0.advance_ns(ms as u64 * 1_000_000);
    }
}

/// Sensor stand-in: each write releases the next scripted reply burst
#[derive(Debug, Default)]
pub struct MockSensor {
    pub written: Vec<Vec<u8>>,
    pub rx: VecDeque<u8>,
    pub replies: VecDeque<Vec<u8>>,
    pub failing_writes: usize,
    pub failing_reads: usize,
}

impl MockSensor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply released by the next write
    pub fn reply(mut self, bytes: Vec<u8>) -> Self {
        self.replies.push_back(bytes);
        self
    }

    /// Bytes already waiting before any write
    pub fn pending(mut self, bytes: &[u8]) -> Self {
        self.rx.extend(bytes.iter().copied());
        self
    }
}

impl Transport for MockSensor {
    type Error = ();

    fn write(&mut self, bytes: &[u8]) -> Result<(), ()> {
        if self.failing_writes > 0 {
            self.failing_writes -= 1;
            return Err(());
        }
        self.written.push(bytes.to_vec());
        if let Some(reply) = self.replies.pop_front() {
            self.rx.extend(reply);
        }
        Ok(())
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, ()> {
        if self.failing_reads > 0 {
            self.failing_reads -= 1;
            return Err(());
        }
        let n = buf.len().min(self.rx.len());
        for (slot, byte) in buf.iter_mut().zip(self.rx.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

pub type TestSession = Session<MockSensor, FakeClock, FakeDelay>;

pub fn session(sensor: MockSensor, config: SessionConfig) -> (TestSession, VirtualTime) {
    let time = VirtualTime::default();
    let session = Session::new(
        sensor,
        FakeClock(time.clone()),
        FakeDelay(time.clone()),
        config,
    );
    (session, time)
}

pub fn frame(command: Command, algorithm_id: u8, content: &[u8]) -> Vec<u8> {
    Frame::new(command.to_byte(), algorithm_id, content)
        .unwrap()
        .encode_to_vec()
        .unwrap()
        .to_vec()
}

/// `ReturnArgs` with return value `ret` and first value `value`
pub fn args(ret: u8, value: i16) -> Vec<u8> {
    let [lo, hi] = value.to_le_bytes();
    frame(Command::ReturnArgs, 0, &[ret, 0, lo, hi, 0, 0, 0, 0, 0, 0])
}

pub fn info(algorithm_id: u8, max_id: i16, blocks: i16, results: i16) -> Vec<u8> {
    let mut content = vec![0u8, 0];
    for word in [max_id, blocks, results, 0] {
        content.extend_from_slice(&word.to_le_bytes());
    }
    frame(Command::ReturnInfo, algorithm_id, &content)
}

pub fn block(algorithm_id: u8, id: u8, x: i16, y: i16, w: i16, h: i16, name: &str) -> Vec<u8> {
    let mut content = vec![id, 0];
    for word in [x, y, w, h] {
        content.extend_from_slice(&word.to_le_bytes());
    }
    content.push(name.len() as u8);
    content.extend_from_slice(name.as_bytes());
    frame(Command::ReturnBlock, algorithm_id, &content)
}

pub fn arrow(algorithm_id: u8, level: u8, x: i16, y: i16, length: i16, angle: i16) -> Vec<u8> {
    let mut content = vec![0u8, level];
    for word in [x, y, length, angle] {
        content.extend_from_slice(&word.to_le_bytes());
    }
    frame(Command::ReturnArrow, algorithm_id, &content)
}

pub fn concat(parts: &[Vec<u8>]) -> Vec<u8> {
    parts.iter().flatten().copied().collect()
}
