//! Recognition algorithm ids
//!
//! Id space:
//! - `1..=19`: built-in recognizers
//! - `20..=22`: reserved custom slots
//! - `128..`: user-trained models, `id = 127 + n` for the 1-based model `n`

/// First id of the user-trained model range
pub const CUSTOM_BEGIN: u8 = 128;

/// Highest 1-based user model index that fits in the id byte
pub const MAX_USER_MODEL: u8 = u8::MAX - (CUSTOM_BEGIN - 1);

/// Recognition algorithm selected on the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Algorithm {
    FaceRecognition,
    ObjectRecognition,
    ObjectTracking,
    ColorRecognition,
    ObjectClassification,
    SelfLearningClassification,
    Segmentation,
    HandRecognition,
    PoseRecognition,
    LicensePlateRecognition,
    TextRecognition,
    LineTracking,
    EmotionRecognition,
    GazeRecognition,
    FaceOrientation,
    TagRecognition,
    BarcodeRecognition,
    QrCodeRecognition,
    FallDetection,
    /// Reserved custom slot (0-2)
    Reserved(u8),
    /// User-trained model, 1-based
    UserModel(u8),
}

impl Algorithm {
    /// Parse an algorithm from its wire id
    pub fn from_id(id: u8) -> Option<Self> {
        let algo = match id {
            1 => Algorithm::FaceRecognition,
            2 => Algorithm::ObjectRecognition,
            3 => Algorithm::ObjectTracking,
            4 => Algorithm::ColorRecognition,
            5 => Algorithm::ObjectClassification,
            6 => Algorithm::SelfLearningClassification,
            7 => Algorithm::Segmentation,
            8 => Algorithm::HandRecognition,
            9 => Algorithm::PoseRecognition,
            10 => Algorithm::LicensePlateRecognition,
            11 => Algorithm::TextRecognition,
            12 => Algorithm::LineTracking,
            13 => Algorithm::EmotionRecognition,
            14 => Algorithm::GazeRecognition,
            15 => Algorithm::FaceOrientation,
            16 => Algorithm::TagRecognition,
            17 => Algorithm::BarcodeRecognition,
            18 => Algorithm::QrCodeRecognition,
            19 => Algorithm::FallDetection,
            20..=22 => Algorithm::Reserved(id - 20),
            id if id >= CUSTOM_BEGIN => Algorithm::UserModel(id - (CUSTOM_BEGIN - 1)),
            _ => return None,
        };
        Some(algo)
    }

    /// Wire id of this algorithm
    ///
    /// Out-of-range `Reserved`/`UserModel` indices saturate to the last
    /// valid id of their range.
    pub fn id(self) -> u8 {
        match self {
            Algorithm::FaceRecognition => 1,
            Algorithm::ObjectRecognition => 2,
            Algorithm::ObjectTracking => 3,
            Algorithm::ColorRecognition => 4,
            Algorithm::ObjectClassification => 5,
            Algorithm::SelfLearningClassification => 6,
            Algorithm::Segmentation => 7,
            Algorithm::HandRecognition => 8,
            Algorithm::PoseRecognition => 9,
            Algorithm::LicensePlateRecognition => 10,
            Algorithm::TextRecognition => 11,
            Algorithm::LineTracking => 12,
            Algorithm::EmotionRecognition => 13,
            Algorithm::GazeRecognition => 14,
            Algorithm::FaceOrientation => 15,
            Algorithm::TagRecognition => 16,
            Algorithm::BarcodeRecognition => 17,
            Algorithm::QrCodeRecognition => 18,
            Algorithm::FallDetection => 19,
            Algorithm::Reserved(slot) => 20 + slot.min(2),
            Algorithm::UserModel(n) => (CUSTOM_BEGIN - 1) + n.clamp(1, MAX_USER_MODEL),
        }
    }

    /// Result cache bucket; every user-trained model shares one bucket
    pub fn cache_bucket(self) -> u8 {
        bucket_of(self.id())
    }

    /// True when block replies carry head orientation instead of a box
    pub fn reports_orientation(&self) -> bool {
        matches!(self, Algorithm::FaceOrientation | Algorithm::GazeRecognition)
    }
}

/// Normalize a raw algorithm id to its cache bucket
pub fn bucket_of(id: u8) -> u8 {
    id.min(CUSTOM_BEGIN)
}
