// Recorded-session backend
//
// A recording is a JSON-lines file, one frame per line:
//   {"width": 640, "height": 480, "keypoints": [{"x": 0.5, "y": 0.2}, ...]}
// `keypoints` is null (or missing) for frames where no body was found.
// Blank lines and lines starting with '#' are skipped.

use super::estimator::PoseEstimator;
use crate::models::capture::{CaptureResult, Frame};
use crate::models::pose::{BodyPose, Keypoint3D, PoseError, PoseResult};
use crate::platform::capture::FrameSource;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub keypoints: Option<Vec<Keypoint3D>>,
}

#[derive(Debug, Clone, Default)]
pub struct Recording {
    frames: Vec<RecordedFrame>,
}

impl Recording {
    pub fn new(frames: Vec<RecordedFrame>) -> Self {
        Self { frames }
    }

    pub fn load(path: &Path) -> PoseResult<Self> {
        let file = File::open(path)
            .map_err(|e| PoseError::RecordingLoad(format!("{}: {}", path.display(), e)))?;
        let recording = Self::parse(BufReader::new(file))?;

        info!("Loaded {} frames from {}", recording.len(), path.display());
        Ok(recording)
    }

    pub fn parse<R: BufRead>(reader: R) -> PoseResult<Self> {
        let mut frames = Vec::new();

        for (number, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| PoseError::RecordingLoad(e.to_string()))?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let frame: RecordedFrame = serde_json::from_str(line)
                .map_err(|e| PoseError::RecordingLoad(format!("line {}: {}", number + 1, e)))?;
            frames.push(frame);
        }

        Ok(Self { frames })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Split into a frame source and the estimator that answers for its frames
    pub fn into_replay(self) -> (ReplaySource, ReplayEstimator) {
        let sizes = self.frames.iter().map(|f| (f.width, f.height)).collect();
        let poses = self
            .frames
            .into_iter()
            .map(|f| f.keypoints.map(BodyPose::new))
            .collect();

        (
            ReplaySource { sizes, cursor: 0 },
            ReplayEstimator { poses },
        )
    }
}

/// Yields one pixel-less frame per recorded line
#[derive(Debug)]
pub struct ReplaySource {
    sizes: Vec<(u32, u32)>,
    cursor: usize,
}

impl FrameSource for ReplaySource {
    fn next_frame(&mut self) -> CaptureResult<Option<Frame>> {
        let Some(&(width, height)) = self.sizes.get(self.cursor) else {
            debug!("Replay source exhausted after {} frames", self.cursor);
            return Ok(None);
        };

        let frame = Frame::new(self.cursor as u64, width, height);
        self.cursor += 1;
        Ok(Some(frame))
    }
}

/// Answers with the recorded pose for the frame's index
#[derive(Debug)]
pub struct ReplayEstimator {
    poses: Vec<Option<BodyPose>>,
}

impl PoseEstimator for ReplayEstimator {
    fn process_frame(&mut self, frame: &Frame) -> PoseResult<Option<BodyPose>> {
        self.poses
            .get(frame.index as usize)
            .cloned()
            .ok_or_else(|| {
                PoseError::InferenceFailed(format!("frame {} is not in the recording", frame.index))
            })
    }

    fn is_initialized(&self) -> bool {
        true
    }

    fn get_model_info(&self) -> String {
        format!("recorded session ({} frames)", self.poses.len())
    }
}
