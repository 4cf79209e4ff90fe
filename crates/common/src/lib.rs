/// Common types for the human motion tracking pipeline
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of keypoints in the COCO anatomical layout every detector
/// integration must supply, index-aligned with [`KeypointName`].
pub const KEYPOINT_COUNT: usize = 17;

/// Errors raised when a detection violates the input contract
#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("Expected {expected} keypoints, got {actual}")]
    KeypointCountMismatch { expected: usize, actual: usize },

    #[error("Malformed bounding box: {0}")]
    MalformedBoundingBox(String),
}

/// 2D point in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    #[must_use]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    #[must_use]
    #[inline]
    pub fn distance(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Centroid displacement between two consecutive matched updates of a track
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Velocity {
    pub dx: f32,
    pub dy: f32,
}

impl Velocity {
    #[must_use]
    pub fn new(dx: f32, dy: f32) -> Self {
        Self { dx, dy }
    }

    /// Displacement vector from one centroid to the next
    #[must_use]
    pub fn between(from: Point, to: Point) -> Self {
        Self {
            dx: to.x - from.x,
            dy: to.y - from.y,
        }
    }

    /// Euclidean norm, in pixels per frame
    #[must_use]
    #[inline]
    pub fn speed(&self) -> f32 {
        (self.dx * self.dx + self.dy * self.dy).sqrt()
    }
}

/// Axis-aligned box in pixel corner coordinates (`x1 < x2`, `y1 < y2`)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    #[must_use]
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    #[must_use]
    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    #[must_use]
    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    /// Center of the box, used as the tracking centroid
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }
}

/// COCO keypoint names (17 keypoints)
///
/// The discriminant of each variant is its index in a detection's keypoint
/// sequence, so `keypoints[KeypointName::LeftWrist as usize]` is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeypointName {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl KeypointName {
    /// Get keypoint name from index (0-16)
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(KeypointName::Nose),
            1 => Some(KeypointName::LeftEye),
            2 => Some(KeypointName::RightEye),
            3 => Some(KeypointName::LeftEar),
            4 => Some(KeypointName::RightEar),
            5 => Some(KeypointName::LeftShoulder),
            6 => Some(KeypointName::RightShoulder),
            7 => Some(KeypointName::LeftElbow),
            8 => Some(KeypointName::RightElbow),
            9 => Some(KeypointName::LeftWrist),
            10 => Some(KeypointName::RightWrist),
            11 => Some(KeypointName::LeftHip),
            12 => Some(KeypointName::RightHip),
            13 => Some(KeypointName::LeftKnee),
            14 => Some(KeypointName::RightKnee),
            15 => Some(KeypointName::LeftAnkle),
            16 => Some(KeypointName::RightAnkle),
            _ => None,
        }
    }

    /// Get human-readable name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            KeypointName::Nose => "nose",
            KeypointName::LeftEye => "left_eye",
            KeypointName::RightEye => "right_eye",
            KeypointName::LeftEar => "left_ear",
            KeypointName::RightEar => "right_ear",
            KeypointName::LeftShoulder => "left_shoulder",
            KeypointName::RightShoulder => "right_shoulder",
            KeypointName::LeftElbow => "left_elbow",
            KeypointName::RightElbow => "right_elbow",
            KeypointName::LeftWrist => "left_wrist",
            KeypointName::RightWrist => "right_wrist",
            KeypointName::LeftHip => "left_hip",
            KeypointName::RightHip => "right_hip",
            KeypointName::LeftKnee => "left_knee",
            KeypointName::RightKnee => "right_knee",
            KeypointName::LeftAnkle => "left_ankle",
            KeypointName::RightAnkle => "right_ankle",
        }
    }
}

/// Single keypoint with pixel coordinates and visibility confidence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    /// Visibility confidence (0-1)
    pub confidence: f32,
}

impl Keypoint {
    #[must_use]
    pub fn new(x: f32, y: f32, confidence: f32) -> Self {
        Self { x, y, confidence }
    }
}

/// Discrete pose-derived label attached to one frame's detection
///
/// `WalkingLeft`/`WalkingRight` are only produced by the off-by-default
/// screen-position rule of the pose analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionTag {
    HandRaiseLeft,
    HandRaiseRight,
    Sleeping,
    Sitting,
    Standing,
    WalkingLeft,
    WalkingRight,
}

impl MotionTag {
    /// Wire/display name, matching the serialized form
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            MotionTag::HandRaiseLeft => "hand_raise_left",
            MotionTag::HandRaiseRight => "hand_raise_right",
            MotionTag::Sleeping => "sleeping",
            MotionTag::Sitting => "sitting",
            MotionTag::Standing => "standing",
            MotionTag::WalkingLeft => "walking_left",
            MotionTag::WalkingRight => "walking_right",
        }
    }

    /// True for either hand-raise side
    #[must_use]
    pub fn is_hand_raise(&self) -> bool {
        matches!(self, MotionTag::HandRaiseLeft | MotionTag::HandRaiseRight)
    }
}

/// One person detected in one frame
///
/// Constructed once per frame per visible person with empty `motion_tags`;
/// the pipeline fills the tags in before the detection reaches the tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: BoundingBox,
    /// Detection confidence score (0-1)
    pub confidence: f32,
    /// 17 COCO keypoints, index-aligned with [`KeypointName`]
    pub keypoints: Vec<Keypoint>,
    #[serde(default)]
    pub motion_tags: Vec<MotionTag>,
}

impl Detection {
    #[must_use]
    pub fn new(bbox: BoundingBox, confidence: f32, keypoints: Vec<Keypoint>) -> Self {
        Self {
            bbox,
            confidence,
            keypoints,
            motion_tags: Vec::new(),
        }
    }

    /// Tracking centroid, derived from the bounding box center
    #[must_use]
    pub fn centroid(&self) -> Point {
        self.bbox.center()
    }

    /// Check the input contract: 17 keypoints and a finite, non-empty box
    pub fn validate(&self) -> Result<(), DetectionError> {
        if self.keypoints.len() != KEYPOINT_COUNT {
            return Err(DetectionError::KeypointCountMismatch {
                expected: KEYPOINT_COUNT,
                actual: self.keypoints.len(),
            });
        }

        let corners = [self.bbox.x1, self.bbox.y1, self.bbox.x2, self.bbox.y2];
        if corners.iter().any(|c| !c.is_finite()) {
            return Err(DetectionError::MalformedBoundingBox(
                "non-finite coordinates".to_string(),
            ));
        }
        if self.bbox.width() <= 0.0 || self.bbox.height() <= 0.0 {
            return Err(DetectionError::MalformedBoundingBox(format!(
                "non-positive extent {}x{}",
                self.bbox.width(),
                self.bbox.height()
            )));
        }

        Ok(())
    }
}
