// Per-frame posture classification
//
// Every frame is classified from scratch: no state is carried between frames,
// so a body hovering around a threshold will flicker between alerting and not.

use super::geometry::measure_angle;
use crate::models::posture::{
    AngleMeasurement, FrameAnalysis, LandmarkSet, Limb, OverlaySegment, Point2D, PostureAlert,
    PostureAngles, Side,
};

/// Hip-vertex angle below which `ArmsNotRaised` fires (exclusive)
pub const ARM_ANGLE_THRESHOLD: f64 = 160.0;

/// Knee-vertex angle below which `Crouching` fires (exclusive)
pub const KNEE_ANGLE_THRESHOLD: f64 = 100.0;

/// Distance of the synthetic reference point straight below each knee
pub const KNEE_REFERENCE_OFFSET_PX: f64 = 50.0;

/// Classify one frame. `None` landmarks means the estimator saw no body:
/// nothing is measured, alerted or drawn for that frame.
pub fn analyze_frame(landmarks: Option<&LandmarkSet>, width: u32, height: u32) -> Option<FrameAnalysis> {
    landmarks.map(|set| analyze(set, width, height))
}

/// Classify normalized landmarks of a `width` x `height` frame
pub fn analyze(landmarks: &LandmarkSet, width: u32, height: u32) -> FrameAnalysis {
    let pixels = landmarks.to_pixels(width, height);
    let angles = measure_angles(&pixels);

    FrameAnalysis {
        angles,
        alerts: classify(&angles),
        segments: overlay_segments(&pixels),
    }
}

/// Measure the four angles from pixel-space landmarks
pub fn measure_angles(pixels: &LandmarkSet) -> PostureAngles {
    let left = pixels.limb(Side::Left);
    let right = pixels.limb(Side::Right);

    PostureAngles {
        left_knee: knee_angle(&left),
        right_knee: knee_angle(&right),
        left_arm: arm_angle(&left),
        right_arm: arm_angle(&right),
    }
}

/// Deviation of the thigh from vertical: vertex at the knee, rays to the hip
/// and to a point straight below the knee (image y grows downward).
fn knee_angle(limb: &Limb) -> AngleMeasurement {
    let below = Point2D::new(limb.knee.x, limb.knee.y + KNEE_REFERENCE_OFFSET_PX);
    measure_angle(limb.hip, limb.knee, below)
}

/// Torso-to-thigh alignment: vertex at the hip, rays to the shoulder and the knee.
fn arm_angle(limb: &Limb) -> AngleMeasurement {
    measure_angle(limb.shoulder, limb.hip, limb.knee)
}

/// Apply the fixed thresholds. Either side breaching a threshold is enough.
pub fn classify(angles: &PostureAngles) -> Vec<PostureAlert> {
    let mut alerts = Vec::with_capacity(2);

    if angles.left_arm.is_below(ARM_ANGLE_THRESHOLD) || angles.right_arm.is_below(ARM_ANGLE_THRESHOLD) {
        alerts.push(PostureAlert::ArmsNotRaised);
    }

    if angles.left_knee.is_below(KNEE_ANGLE_THRESHOLD) || angles.right_knee.is_below(KNEE_ANGLE_THRESHOLD) {
        alerts.push(PostureAlert::Crouching);
    }

    alerts
}

/// Shoulder-hip and hip-knee lines, left side first
pub fn overlay_segments(pixels: &LandmarkSet) -> Vec<OverlaySegment> {
    [Side::Left, Side::Right]
        .into_iter()
        .map(|side| pixels.limb(side))
        .flat_map(|limb| {
            [
                OverlaySegment::new(limb.shoulder, limb.hip),
                OverlaySegment::new(limb.hip, limb.knee),
            ]
        })
        .collect()
}
