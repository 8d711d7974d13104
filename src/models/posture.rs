// Data models for per-frame posture classification

use super::pose::{BodyLandmark, BodyPose};
use serde::{Deserialize, Serialize};

// ==============================================================================
// Geometry
// ==============================================================================

/// A point in image space. Normalized [0, 1] before scaling, pixels after.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Unsigned interior angle, always within [0, 180]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct AngleMeasurement {
    pub value_degrees: f64,
}

impl AngleMeasurement {
    pub fn new(value_degrees: f64) -> Self {
        Self { value_degrees }
    }

    pub fn is_below(&self, threshold_degrees: f64) -> bool {
        self.value_degrees < threshold_degrees
    }
}

// ==============================================================================
// Landmarks
// ==============================================================================

/// The six body parts the classifier reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyPart {
    LeftShoulder,
    RightShoulder,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
}

impl BodyPart {
    /// Estimator landmark this part is read from
    pub fn landmark(&self) -> BodyLandmark {
        match self {
            BodyPart::LeftShoulder => BodyLandmark::LeftShoulder,
            BodyPart::RightShoulder => BodyLandmark::RightShoulder,
            BodyPart::LeftHip => BodyLandmark::LeftHip,
            BodyPart::RightHip => BodyLandmark::RightHip,
            BodyPart::LeftKnee => BodyLandmark::LeftKnee,
            BodyPart::RightKnee => BodyLandmark::RightKnee,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

/// Shoulder, hip and knee of one side of the body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limb {
    pub shoulder: Point2D,
    pub hip: Point2D,
    pub knee: Point2D,
}

/// All six classifier landmarks of one frame. Either every point is present
/// or the frame has no `LandmarkSet` at all.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandmarkSet {
    pub left_shoulder: Point2D,
    pub right_shoulder: Point2D,
    pub left_hip: Point2D,
    pub right_hip: Point2D,
    pub left_knee: Point2D,
    pub right_knee: Point2D,
}

impl LandmarkSet {
    /// Extract the six landmarks from a full estimator result.
    /// Returns `None` for truncated results (fewer than `BodyLandmark::COUNT` keypoints),
    /// so partial frames never reach the classifier.
    pub fn from_body_pose(pose: &BodyPose) -> Option<Self> {
        if pose.keypoints.len() < BodyLandmark::COUNT {
            return None;
        }

        let point = |part: BodyPart| {
            pose.keypoint(part.landmark())
                .map(|k| Point2D::new(k.x as f64, k.y as f64))
        };

        Some(Self {
            left_shoulder: point(BodyPart::LeftShoulder)?,
            right_shoulder: point(BodyPart::RightShoulder)?,
            left_hip: point(BodyPart::LeftHip)?,
            right_hip: point(BodyPart::RightHip)?,
            left_knee: point(BodyPart::LeftKnee)?,
            right_knee: point(BodyPart::RightKnee)?,
        })
    }

    pub fn limb(&self, side: Side) -> Limb {
        match side {
            Side::Left => Limb {
                shoulder: self.left_shoulder,
                hip: self.left_hip,
                knee: self.left_knee,
            },
            Side::Right => Limb {
                shoulder: self.right_shoulder,
                hip: self.right_hip,
                knee: self.right_knee,
            },
        }
    }

    /// Scale normalized coordinates to whole pixels of a `width` x `height` frame.
    /// Fractional pixels are truncated toward zero.
    pub fn to_pixels(&self, width: u32, height: u32) -> Self {
        let scale = |p: Point2D| {
            Point2D::new(
                (p.x * width as f64).trunc(),
                (p.y * height as f64).trunc(),
            )
        };

        Self {
            left_shoulder: scale(self.left_shoulder),
            right_shoulder: scale(self.right_shoulder),
            left_hip: scale(self.left_hip),
            right_hip: scale(self.right_hip),
            left_knee: scale(self.left_knee),
            right_knee: scale(self.right_knee),
        }
    }
}

// ==============================================================================
// Classification Output
// ==============================================================================

/// The four angles measured on every frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PostureAngles {
    pub left_knee: AngleMeasurement,
    pub right_knee: AngleMeasurement,
    /// Hip-vertex angle between shoulder and knee
    pub left_arm: AngleMeasurement,
    pub right_arm: AngleMeasurement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostureAlert {
    ArmsNotRaised,
    Crouching,
}

impl PostureAlert {
    /// Literal overlay text
    pub fn message(&self) -> &'static str {
        match self {
            PostureAlert::ArmsNotRaised => "Raise your arms!",
            PostureAlert::Crouching => "You are crouching!",
        }
    }

    /// Fixed top-left anchor of the overlay text, in pixels
    pub fn position(&self) -> (i32, i32) {
        match self {
            PostureAlert::ArmsNotRaised => (10, 30),
            PostureAlert::Crouching => (10, 60),
        }
    }

    pub fn to_string(&self) -> &'static str {
        match self {
            PostureAlert::ArmsNotRaised => "arms_not_raised",
            PostureAlert::Crouching => "crouching",
        }
    }
}

/// A line drawn over the frame to show body alignment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlaySegment {
    pub from: Point2D,
    pub to: Point2D,
}

impl OverlaySegment {
    pub fn new(from: Point2D, to: Point2D) -> Self {
        Self { from, to }
    }
}

/// Everything the classifier produces for one frame with a detected body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameAnalysis {
    pub angles: PostureAngles,
    pub alerts: Vec<PostureAlert>, // ArmsNotRaised always precedes Crouching
    pub segments: Vec<OverlaySegment>,
}
