// Data structures for video frame acquisition

/// A frame pulled from a frame source
#[derive(Debug, Clone)]
pub struct Frame {
    pub index: u64,
    pub timestamp: i64,
    pub width: u32,
    pub height: u32,
}

impl Frame {
    pub fn new(index: u64, width: u32, height: u32) -> Self {
        Self {
            index,
            timestamp: chrono::Utc::now().timestamp_millis(),
            width,
            height,
        }
    }
}

/// Error types for frame acquisition
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Frame source closed")]
    SourceClosed,
}

pub type CaptureResult<T> = Result<T, CaptureError>;
