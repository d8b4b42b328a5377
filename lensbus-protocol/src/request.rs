//! Typed host requests
//!
//! Each request knows its opcode, the reply it waits for and how to lay
//! out its payload. Encoding never validates ranges beyond truncating to
//! the wire width; callers clamp (see [`Request::PlayMusic`]).

use heapless::Vec;

use crate::algorithm::Algorithm;
use crate::command::Command;
use crate::frame::{encode_packet, FrameError, FRAME_BUFFER_SIZE};
use crate::payload::RegionWriter;

/// Maximum speaker volume
pub const MAX_VOLUME: u8 = 100;

/// Rectangle in screen pixels, `(x, y)` is the top-left corner
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rect {
    pub x: i16,
    pub y: i16,
    pub width: i16,
    pub height: i16,
}

impl Rect {
    pub const fn new(x: i16, y: i16, width: i16, height: i16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    fn write(&self, region: RegionWriter) -> RegionWriter {
        region
            .word(0, self.x)
            .word(1, self.y)
            .word(2, self.width)
            .word(3, self.height)
    }
}

/// 24-bit RGB overlay color
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const RED: Self = Self::rgb(255, 0, 0);
    pub const GREEN: Self = Self::rgb(0, 255, 0);
    pub const BLUE: Self = Self::rgb(0, 0, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// From `0xRRGGBB`; the top byte is ignored
    pub const fn from_u32(value: u32) -> Self {
        Self::rgb((value >> 16) as u8, (value >> 8) as u8, value as u8)
    }

    fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, 0]
    }
}

/// Requests from host to sensor
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Request<'a> {
    /// Handshake
    Knock,
    /// Ask for the current detections of `algorithm`
    GetResult { algorithm: Algorithm },
    /// Read parameter `index` of `algorithm`
    GetAlgoParam { algorithm: Algorithm, index: u8 },
    /// Switch the active algorithm
    SetAlgorithm { algorithm: Algorithm },
    /// Name a learned id
    SetNameById {
        algorithm: Algorithm,
        id: i16,
        name: &'a str,
    },
    /// Learn the target currently in frame
    Learn { algorithm: Algorithm },
    /// Learn the target inside `rect`
    LearnBlock { algorithm: Algorithm, rect: Rect },
    /// Forget every learned id of `algorithm`
    Forget { algorithm: Algorithm },
    /// Save a camera photo to the sensor's storage
    TakePhoto { resolution: u8 },
    /// Save the rendered screen
    TakeScreenshot,
    /// Draw a rectangle overlay
    DrawRect {
        color: Color,
        line_width: u8,
        rect: Rect,
    },
    /// Draw a rectangle replacing the previous unique one
    DrawUniqueRect {
        color: Color,
        line_width: u8,
        rect: Rect,
    },
    /// Remove rectangle overlays
    ClearRect,
    /// Draw a text overlay at `(x, y)`
    DrawText {
        color: Color,
        font_size: u8,
        x: i16,
        y: i16,
        text: &'a str,
    },
    /// Remove text overlays
    ClearText,
    /// Play an audio file from the sensor's storage
    PlayMusic {
        file: &'a str,
        /// 0-100, higher values are clamped
        volume: u8,
        duration_ms: u16,
    },
}

impl<'a> Request<'a> {
    /// Opcode of this request
    pub fn command(&self) -> Command {
        match self {
            Request::Knock => Command::Knock,
            Request::GetResult { .. } => Command::GetResult,
            Request::GetAlgoParam { .. } => Command::GetAlgoParam,
            Request::SetAlgorithm { .. } => Command::SetAlgorithm,
            Request::SetNameById { .. } => Command::SetNameById,
            Request::Learn { .. } => Command::Learn,
            Request::LearnBlock { .. } => Command::LearnBlock,
            Request::Forget { .. } => Command::Forget,
            Request::TakePhoto { .. } => Command::TakePhoto,
            Request::TakeScreenshot => Command::TakeScreenshot,
            Request::DrawRect { .. } => Command::DrawRect,
            Request::DrawUniqueRect { .. } => Command::DrawUniqueRect,
            Request::ClearRect => Command::ClearRect,
            Request::DrawText { .. } => Command::DrawText,
            Request::ClearText => Command::ClearText,
            Request::PlayMusic { .. } => Command::PlayMusic,
        }
    }

    /// Reply opcode that completes this request
    pub fn expected_reply(&self) -> Command {
        match self {
            Request::GetResult { .. } => Command::ReturnInfo,
            _ => Command::ReturnArgs,
        }
    }

    /// Algorithm id carried in the frame header
    pub fn algorithm_id(&self) -> u8 {
        match self {
            Request::GetResult { algorithm }
            | Request::GetAlgoParam { algorithm, .. }
            | Request::SetAlgorithm { algorithm }
            | Request::SetNameById { algorithm, .. }
            | Request::Learn { algorithm }
            | Request::LearnBlock { algorithm, .. }
            | Request::Forget { algorithm } => algorithm.id(),
            _ => 0,
        }
    }

    /// Encode into a complete packet
    pub fn encode(&self) -> Result<Vec<u8, FRAME_BUFFER_SIZE>, FrameError> {
        let command = self.command();
        let algo = self.algorithm_id();

        match self {
            Request::Knock
            | Request::GetResult { .. }
            | Request::Learn { .. }
            | Request::Forget { .. }
            | Request::TakeScreenshot
            | Request::ClearRect
            | Request::ClearText => encode_packet(command, algo, &[], None),
            Request::GetAlgoParam { index, .. } => {
                let region = RegionWriter::new().byte(0, *index);
                encode_packet(command, algo, region.as_bytes(), None)
            }
            Request::SetAlgorithm { algorithm } => {
                let region = RegionWriter::new().word(0, algorithm.id() as i16);
                encode_packet(command, algo, region.as_bytes(), None)
            }
            Request::SetNameById { id, name, .. } => {
                let region = RegionWriter::new().word(0, *id);
                encode_packet(command, algo, region.as_bytes(), Some(*name))
            }
            Request::LearnBlock { rect, .. } => {
                let region = rect.write(RegionWriter::new());
                encode_packet(command, algo, region.as_bytes(), None)
            }
            Request::TakePhoto { resolution } => {
                let region = RegionWriter::new().byte(0, *resolution);
                encode_packet(command, algo, region.as_bytes(), None)
            }
            Request::DrawRect {
                color,
                line_width,
                rect,
            }
            | Request::DrawUniqueRect {
                color,
                line_width,
                rect,
            } => {
                let region = rect.write(RegionWriter::new().byte(0, *line_width));
                let payload = with_color(region, *color)?;
                encode_packet(command, algo, &payload, None)
            }
            Request::DrawText {
                color,
                font_size,
                x,
                y,
                text,
            } => {
                let region = RegionWriter::new()
                    .byte(0, *font_size)
                    .word(0, *x)
                    .word(1, *y);
                let payload = with_color(region, *color)?;
                encode_packet(command, algo, &payload, Some(*text))
            }
            Request::PlayMusic {
                file,
                volume,
                duration_ms,
            } => {
                let region = RegionWriter::new()
                    .byte(0, (*volume).min(MAX_VOLUME))
                    .word(0, *duration_ms as i16);
                encode_packet(command, algo, region.as_bytes(), Some(*file))
            }
        }
    }
}

fn with_color(region: RegionWriter, color: Color) -> Result<Vec<u8, 14>, FrameError> {
    let mut payload = Vec::new();
    payload
        .extend_from_slice(region.as_bytes())
        .map_err(|_| FrameError::PayloadTooLarge)?;
    payload
        .extend_from_slice(&color.to_bytes())
        .map_err(|_| FrameError::PayloadTooLarge)?;
    Ok(payload)
}
