// Pose estimation platform integration
// Provides the estimator bridge and a recorded-session backend

pub mod estimator;
pub mod replay;

pub use estimator::PoseEstimator;
pub use replay::{Recording, RecordedFrame, ReplayEstimator, ReplaySource};
