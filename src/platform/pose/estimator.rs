// Pose estimator bridge
// Abstracts over whatever produces body landmarks for a frame (MediaPipe via
// Python, an ONNX model, or a recorded session)

use crate::models::capture::Frame;
use crate::models::pose::{BodyPose, PoseResult};

/// Pose estimator trait
/// Implement this for each inference backend
pub trait PoseEstimator {
    /// Run inference on a frame. `Ok(None)` means no body was detected.
    fn process_frame(&mut self, frame: &Frame) -> PoseResult<Option<BodyPose>>;

    /// Check if models are loaded
    fn is_initialized(&self) -> bool;

    /// Get model info
    fn get_model_info(&self) -> String;
}

impl<T: PoseEstimator + ?Sized> PoseEstimator for Box<T> {
    fn process_frame(&mut self, frame: &Frame) -> PoseResult<Option<BodyPose>> {
        (**self).process_frame(frame)
    }

    fn is_initialized(&self) -> bool {
        (**self).is_initialized()
    }

    fn get_model_info(&self) -> String {
        (**self).get_model_info()
    }
}
