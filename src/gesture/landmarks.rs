//! Hand-landmark frame data structures.
//!
//! Models the 21 keypoints per hand produced by the external pose-detection
//! service, in the fixed anatomical order: wrist, then four joints per digit
//! (thumb CMC/MCP/IP/tip, and MCP/PIP/DIP/tip for each finger).

use serde::{Deserialize, Serialize};

/// The 21 hand keypoints in detection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keypoint {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

/// Total number of keypoints per hand.
pub const LANDMARK_COUNT: usize = 21;

impl Keypoint {
    /// Convert keypoint enum to array index (0-20).
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// String representation for logging and trace output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wrist => "wrist",
            Self::ThumbCmc => "thumb-cmc",
            Self::ThumbMcp => "thumb-mcp",
            Self::ThumbIp => "thumb-ip",
            Self::ThumbTip => "thumb-tip",
            Self::IndexMcp => "index-mcp",
            Self::IndexPip => "index-pip",
            Self::IndexDip => "index-dip",
            Self::IndexTip => "index-tip",
            Self::MiddleMcp => "middle-mcp",
            Self::MiddlePip => "middle-pip",
            Self::MiddleDip => "middle-dip",
            Self::MiddleTip => "middle-tip",
            Self::RingMcp => "ring-mcp",
            Self::RingPip => "ring-pip",
            Self::RingDip => "ring-dip",
            Self::RingTip => "ring-tip",
            Self::PinkyMcp => "pinky-mcp",
            Self::PinkyPip => "pinky-pip",
            Self::PinkyDip => "pinky-dip",
            Self::PinkyTip => "pinky-tip",
        }
    }
}

/// A single detected landmark in the detection coordinate space.
///
/// Smaller `y` is "up" relative to the hand's orientation at capture time.
/// `z` and `confidence` are optional; the classifier uses neither.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl Landmark {
    /// Construct a landmark from 2D coordinates.
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            z: None,
            confidence: None,
        }
    }

    /// Euclidean distance to another landmark in the x/y plane.
    pub fn distance_to(&self, other: &Landmark) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// One hand's landmarks for a single detection tick.
///
/// Immutable once constructed; consumed by exactly one classifier call.
/// A frame with a keypoint count other than [`LANDMARK_COUNT`] is
/// incomplete and always classifies as `none`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandFrame {
    keypoints: Vec<Landmark>,
}

impl HandFrame {
    /// Construct a frame from keypoints in detection order.
    pub fn new(keypoints: Vec<Landmark>) -> Self {
        Self { keypoints }
    }

    /// Whether the frame carries the full 21-keypoint set.
    pub fn is_complete(&self) -> bool {
        self.keypoints.len() == LANDMARK_COUNT
    }

    /// Number of keypoints present.
    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    /// Whether the frame carries no keypoints at all.
    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    /// Landmark for a named keypoint.
    ///
    /// Callers must check [`is_complete`](Self::is_complete) first; this
    /// indexes directly into the keypoint array.
    pub fn get(&self, keypoint: Keypoint) -> &Landmark {
        &self.keypoints[keypoint.index()]
    }

    /// All keypoints in detection order.
    pub fn keypoints(&self) -> &[Landmark] {
        &self.keypoints
    }
}
