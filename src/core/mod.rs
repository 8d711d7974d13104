pub mod config;
pub mod database;
pub mod credentials;
pub mod password;
pub mod prompt;
pub mod gate;

// Posture analysis
pub mod geometry;
pub mod posture_classifier;
pub mod overlay;
pub mod frame_loop;
