// Frame acquisition and pose estimation backends

pub mod capture;
pub mod pose;
