// Data models for frames, pose estimation, posture feedback and credentials

pub mod capture;
pub mod credential;
pub mod pose;
pub mod posture;
