//! Decoded detection results

use heapless::String;

use crate::algorithm::Algorithm;
use crate::command::Command;
use crate::frame::Frame;
use crate::payload::{decode_text, ArrowView, BlockView, OrientationView, Tail};

/// Maximum name length in bytes
pub const MAX_NAME_LEN: usize = 64;

/// Maximum content (OCR, plate, code) length in bytes
pub const MAX_CONTENT_LEN: usize = 112;

/// One detection reported by the sensor
///
/// Which numeric fields are meaningful depends on the reply kind: boxes
/// fill the position and size, orientation results fill the angles and
/// arrows fill the origin, `length`, `angle` and `level`. The rest stay 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Detection {
    /// Learned id, 0 when the target is not learned
    pub id: i16,
    pub class_id: i16,
    pub x_center: i16,
    pub y_center: i16,
    pub width: i16,
    pub height: i16,
    pub angle: i16,
    pub roll: i16,
    pub pitch: i16,
    pub yaw: i16,
    pub length: i16,
    /// Branch depth for line tracking
    pub level: u8,
    pub name: String<MAX_NAME_LEN>,
    pub content: String<MAX_CONTENT_LEN>,
    /// Always false when decoded
    pub used: bool,
}

impl From<BlockView> for Detection {
    fn from(v: BlockView) -> Self {
        Self {
            id: v.id as i16,
            class_id: v.class_id as i16,
            x_center: v.x_center,
            y_center: v.y_center,
            width: v.width,
            height: v.height,
            ..Self::default()
        }
    }
}

impl From<OrientationView> for Detection {
    fn from(v: OrientationView) -> Self {
        Self {
            id: v.id as i16,
            class_id: v.class_id as i16,
            yaw: v.yaw,
            pitch: v.pitch,
            roll: v.roll,
            angle: v.angle,
            ..Self::default()
        }
    }
}

impl From<ArrowView> for Detection {
    fn from(v: ArrowView) -> Self {
        Self {
            id: v.id as i16,
            level: v.level,
            x_center: v.x_origin,
            y_center: v.y_origin,
            length: v.length,
            angle: v.angle,
            ..Self::default()
        }
    }
}

impl Detection {
    /// Decode reply content for `command`
    ///
    /// Returns `None` for commands that do not carry detections.
    pub fn decode(command: Command, algorithm: Option<Algorithm>, content: &[u8]) -> Option<Self> {
        let mut detection: Detection = match command {
            Command::ReturnBlock => match algorithm {
                Some(algo) if algo.reports_orientation() => OrientationView::parse(content).into(),
                _ => BlockView::parse(content).into(),
            },
            Command::ReturnArrow => ArrowView::parse(content).into(),
            _ => return None,
        };

        let tail = Tail::parse(content);
        detection.name = decode_text(tail.name);
        detection.content = decode_text(tail.content);
        Some(detection)
    }

    /// Decode a received frame
    pub fn from_frame(frame: &Frame) -> Option<Self> {
        let command = frame.command()?;
        Self::decode(command, Algorithm::from_id(frame.algorithm_id), &frame.content)
    }

    /// Returns true if the sensor recognized this target as a learned id
    pub fn is_learned(&self) -> bool {
        self.id > 0
    }

    /// Squared distance from the center to `(x, y)`
    ///
    /// Wide enough for any pair of wire coordinates.
    pub fn distance_sq_to(&self, x: i32, y: i32) -> i64 {
        let dx = self.x_center as i64 - x as i64;
        let dy = self.y_center as i64 - y as i64;
        dx * dx + dy * dy
    }
}
