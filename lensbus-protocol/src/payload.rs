//! Named views over the 10-byte reply region
//!
//! Reply content starts with a fixed region: two leading unsigned bytes
//! followed by four little-endian `i16` words. What those words mean is
//! decided by the command that carried them, so each meaning gets its own
//! view type:
//!
//! ```text
//! byte:        0     1     2..4      4..6      6..8      8..10
//! Info:        -     -     max_id    blocks    results   -
//! Block:       id    class x_center  y_center  width     height
//! Orientation: id    class yaw       pitch     roll      angle
//! Arrow:       id    level x_origin  y_origin  length    angle
//! Args:        ret   arg   value0    value1    value2    value3
//! ```
//!
//! After the region comes an optional `name_len name content_len content`
//! tail. Every read is bounds-checked; missing bytes read as zero.

use heapless::String;

/// Size of the fixed numeric region
pub const REGION_LEN: usize = 10;

/// Results per get-result exchange the client keeps
pub const MAX_RESULTS: usize = 6;

/// Return value the sensor uses for success
pub const RETURN_OK: u8 = 0;

/// Reinterpret two bytes as a little-endian two's-complement `i16`
pub fn le_i16(lo: u8, hi: u8) -> i16 {
    i16::from_le_bytes([lo, hi])
}

/// Bounds-checked reader over reply content
#[derive(Debug, Clone, Copy)]
struct Region<'a>(&'a [u8]);

impl<'a> Region<'a> {
    fn byte(&self, index: usize) -> u8 {
        self.0.get(index).copied().unwrap_or(0)
    }

    /// Word `slot` (0-3) of the region
    fn word(&self, slot: usize) -> i16 {
        let at = 2 + slot * 2;
        le_i16(self.byte(at), self.byte(at + 1))
    }
}

/// `ReturnInfo`: header of a get-result exchange
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InfoView {
    /// Number of ids learned for the algorithm
    pub max_id: i16,
    /// Block frames that follow
    pub total_blocks: i16,
    /// Block plus arrow frames that follow
    pub total_results: i16,
}

impl InfoView {
    pub fn parse(content: &[u8]) -> Self {
        let r = Region(content);
        Self {
            max_id: r.word(0),
            total_blocks: r.word(1),
            total_results: r.word(2),
        }
    }

    /// Block frames to wait for, capped at [`MAX_RESULTS`]
    pub fn blocks(&self) -> usize {
        clamp_count(self.total_blocks)
    }

    /// Total frames to wait for, capped at [`MAX_RESULTS`]
    ///
    /// Never less than [`InfoView::blocks`].
    pub fn results(&self) -> usize {
        clamp_count(self.total_results).max(self.blocks())
    }
}

fn clamp_count(raw: i16) -> usize {
    (raw.max(0) as usize).min(MAX_RESULTS)
}

/// `ReturnBlock`: one bounding box
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BlockView {
    pub id: u8,
    pub class_id: u8,
    pub x_center: i16,
    pub y_center: i16,
    pub width: i16,
    pub height: i16,
}

impl BlockView {
    pub fn parse(content: &[u8]) -> Self {
        let r = Region(content);
        Self {
            id: r.byte(0),
            class_id: r.byte(1),
            x_center: r.word(0),
            y_center: r.word(1),
            width: r.word(2),
            height: r.word(3),
        }
    }
}

/// `ReturnBlock` for face-orientation and gaze algorithms
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OrientationView {
    pub id: u8,
    pub class_id: u8,
    pub yaw: i16,
    pub pitch: i16,
    pub roll: i16,
    pub angle: i16,
}

impl OrientationView {
    pub fn parse(content: &[u8]) -> Self {
        let r = Region(content);
        Self {
            id: r.byte(0),
            class_id: r.byte(1),
            yaw: r.word(0),
            pitch: r.word(1),
            roll: r.word(2),
            angle: r.word(3),
        }
    }
}

/// `ReturnArrow`: a line segment from line tracking
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ArrowView {
    pub id: u8,
    /// Branch depth; 1 is the line being followed
    pub level: u8,
    pub x_origin: i16,
    pub y_origin: i16,
    pub length: i16,
    pub angle: i16,
}

impl ArrowView {
    pub fn parse(content: &[u8]) -> Self {
        let r = Region(content);
        Self {
            id: r.byte(0),
            level: r.byte(1),
            x_origin: r.word(0),
            y_origin: r.word(1),
            length: r.word(2),
            angle: r.word(3),
        }
    }
}

/// `ReturnArgs`: acknowledgement with a return value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ArgsView {
    /// Return value, [`RETURN_OK`] on success
    pub ret: u8,
    pub arg: u8,
    pub values: [i16; 4],
}

impl ArgsView {
    pub fn parse(content: &[u8]) -> Self {
        let r = Region(content);
        Self {
            ret: r.byte(0),
            arg: r.byte(1),
            values: [r.word(0), r.word(1), r.word(2), r.word(3)],
        }
    }

    /// Returns true if the sensor answered with return value `expected`
    pub fn returned(&self, expected: u8) -> bool {
        self.ret == expected
    }
}

/// Variable-length tail after the region
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tail<'a> {
    pub name: &'a [u8],
    pub content: &'a [u8],
}

impl<'a> Tail<'a> {
    /// Split the tail out of reply content
    ///
    /// `content_len` sits right after the name, i.e. at byte 11 when the
    /// name is empty. Lengths running past the buffer are cut short.
    pub fn parse(content: &'a [u8]) -> Self {
        let name_len = match content.get(REGION_LEN) {
            Some(&len) => len as usize,
            None => return Self::default(),
        };
        let name_start = REGION_LEN + 1;
        let name = slice_clamped(content, name_start, name_len);

        let content_len_at = name_start + name_len;
        let body = match content.get(content_len_at) {
            Some(&len) => slice_clamped(content, content_len_at + 1, len as usize),
            None => &[],
        };

        Self {
            name,
            content: body,
        }
    }
}

fn slice_clamped(bytes: &[u8], start: usize, len: usize) -> &[u8] {
    if start >= bytes.len() {
        return &[];
    }
    let end = (start + len).min(bytes.len());
    &bytes[start..end]
}

/// Decode sensor text into a bounded string
///
/// Stops at the first NUL. Invalid UTF-8 keeps the valid prefix; the
/// result is truncated on a character boundary to fit `N`.
pub fn decode_text<const N: usize>(bytes: &[u8]) -> String<N> {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let bytes = &bytes[..end];
    let text = match core::str::from_utf8(bytes) {
        Ok(text) => text,
        // valid_up_to() always lands on a char boundary
        Err(e) => core::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or(""),
    };

    let mut out = String::new();
    for ch in text.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}

/// Builder for the outgoing 10-byte region
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegionWriter {
    bytes: [u8; REGION_LEN],
}

impl RegionWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set leading byte 0 or 1
    pub fn byte(mut self, index: usize, value: u8) -> Self {
        if index < 2 {
            self.bytes[index] = value;
        }
        self
    }

    /// Set word `slot` (0-3) as little-endian
    pub fn word(mut self, slot: usize, value: i16) -> Self {
        if slot < 4 {
            let at = 2 + slot * 2;
            self.bytes[at..at + 2].copy_from_slice(&value.to_le_bytes());
        }
        self
    }

    pub fn as_bytes(&self) -> &[u8; REGION_LEN] {
        &self.bytes
    }
}
