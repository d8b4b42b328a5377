//! Command opcodes
//!
//! Opcodes below `0x1A` are host requests, `0x1A..=0x1D` are sensor
//! replies and `0x20..` are actions.

/// Command byte carried in every frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Command {
    /// Handshake, answered with `ReturnArgs`
    Knock = 0x00,
    /// Request detections, answered with `ReturnInfo` then blocks/arrows
    GetResult = 0x01,
    /// Read one algorithm parameter
    GetAlgoParam = 0x02,
    /// Switch the active recognition algorithm
    SetAlgorithm = 0x0A,
    /// Attach a name to a learned id
    SetNameById = 0x0B,
    /// Generic reply carrying a return-value byte
    ReturnArgs = 0x1A,
    /// Reply header of a get-result exchange
    ReturnInfo = 0x1B,
    /// One detection box
    ReturnBlock = 0x1C,
    /// One directional (line-tracking) result
    ReturnArrow = 0x1D,
    TakePhoto = 0x20,
    TakeScreenshot = 0x21,
    Learn = 0x22,
    Forget = 0x23,
    DrawRect = 0x26,
    ClearRect = 0x27,
    DrawText = 0x28,
    ClearText = 0x29,
    PlayMusic = 0x2A,
    LearnBlock = 0x2C,
    DrawUniqueRect = 0x2D,
}

impl Command {
    /// Parse a command from its wire byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        let cmd = match byte {
            0x00 => Command::Knock,
            0x01 => Command::GetResult,
            0x02 => Command::GetAlgoParam,
            0x0A => Command::SetAlgorithm,
            0x0B => Command::SetNameById,
            0x1A => Command::ReturnArgs,
            0x1B => Command::ReturnInfo,
            0x1C => Command::ReturnBlock,
            0x1D => Command::ReturnArrow,
            0x20 => Command::TakePhoto,
            0x21 => Command::TakeScreenshot,
            0x22 => Command::Learn,
            0x23 => Command::Forget,
            0x26 => Command::DrawRect,
            0x27 => Command::ClearRect,
            0x28 => Command::DrawText,
            0x29 => Command::ClearText,
            0x2A => Command::PlayMusic,
            0x2C => Command::LearnBlock,
            0x2D => Command::DrawUniqueRect,
            _ => return None,
        };
        Some(cmd)
    }

    /// Convert to wire format byte
    pub fn to_byte(self) -> u8 {
        self as u8
    }
}
