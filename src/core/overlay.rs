use crate::models::capture::Frame;
use crate::models::pose::{PoseError, PoseResult};
use crate::models::posture::{FrameAnalysis, OverlaySegment, PostureAlert, PostureAngles};
use log::{debug, info, warn};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Receives the classifier output for every frame.
/// `analysis` is `None` when no body was detected in the frame.
pub trait OverlayRenderer {
    fn render(&mut self, frame: &Frame, analysis: Option<&FrameAnalysis>) -> PoseResult<()>;

    fn finish(&mut self) -> PoseResult<()> {
        Ok(())
    }
}

// ==============================================================================
// Log Renderer
// ==============================================================================

/// Writes alerts to the log whenever the set of active alerts changes
#[derive(Debug, Default)]
pub struct LogRenderer {
    active: Vec<PostureAlert>,
}

impl OverlayRenderer for LogRenderer {
    fn render(&mut self, frame: &Frame, analysis: Option<&FrameAnalysis>) -> PoseResult<()> {
        let alerts = analysis.map(|a| a.alerts.as_slice()).unwrap_or_default();

        if let Some(analysis) = analysis {
            debug!(
                "Frame {}: arms {:.1}/{:.1}, knees {:.1}/{:.1}",
                frame.index,
                analysis.angles.left_arm.value_degrees,
                analysis.angles.right_arm.value_degrees,
                analysis.angles.left_knee.value_degrees,
                analysis.angles.right_knee.value_degrees,
            );
        }

        if alerts != self.active.as_slice() {
            if alerts.is_empty() {
                info!("Frame {}: posture OK", frame.index);
            }
            for alert in alerts {
                warn!("Frame {}: {}", frame.index, alert.message());
            }
            self.active = alerts.to_vec();
        }

        Ok(())
    }
}

// ==============================================================================
// Annotation Writer
// ==============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct AlertAnnotation {
    pub kind: PostureAlert,
    pub message: &'static str,
    pub position: (i32, i32),
}

impl From<PostureAlert> for AlertAnnotation {
    fn from(alert: PostureAlert) -> Self {
        Self {
            kind: alert,
            message: alert.message(),
            position: alert.position(),
        }
    }
}

/// One JSON line per frame
#[derive(Debug, Clone, Serialize)]
pub struct FrameAnnotation {
    pub frame_index: u64,
    pub timestamp: i64,
    pub body_detected: bool,
    pub angles: Option<PostureAngles>,
    pub alerts: Vec<AlertAnnotation>,
    pub segments: Vec<OverlaySegment>,
}

impl FrameAnnotation {
    pub fn new(frame: &Frame, analysis: Option<&FrameAnalysis>) -> Self {
        Self {
            frame_index: frame.index,
            timestamp: frame.timestamp,
            body_detected: analysis.is_some(),
            angles: analysis.map(|a| a.angles),
            alerts: analysis
                .map(|a| a.alerts.iter().copied().map(AlertAnnotation::from).collect())
                .unwrap_or_default(),
            segments: analysis.map(|a| a.segments.clone()).unwrap_or_default(),
        }
    }
}

/// Writes a `FrameAnnotation` JSON line for every frame
pub struct AnnotationWriter<W: Write> {
    writer: W,
}

impl AnnotationWriter<BufWriter<File>> {
    pub fn create(path: &Path) -> PoseResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PoseError::RenderFailed(e.to_string()))?;
        }
        let file = File::create(path)
            .map_err(|e| PoseError::RenderFailed(format!("{}: {}", path.display(), e)))?;

        info!("Writing overlay annotations to {}", path.display());
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> AnnotationWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> OverlayRenderer for AnnotationWriter<W> {
    fn render(&mut self, frame: &Frame, analysis: Option<&FrameAnalysis>) -> PoseResult<()> {
        let annotation = FrameAnnotation::new(frame, analysis);
        serde_json::to_writer(&mut self.writer, &annotation)
            .map_err(|e| PoseError::RenderFailed(e.to_string()))?;
        self.writer
            .write_all(b"\n")
            .map_err(|e| PoseError::RenderFailed(e.to_string()))
    }

    fn finish(&mut self) -> PoseResult<()> {
        self.writer
            .flush()
            .map_err(|e| PoseError::RenderFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::posture_classifier::analyze;
    use crate::models::posture::{LandmarkSet, Point2D};

    fn crouching() -> LandmarkSet {
        LandmarkSet {
            left_shoulder: Point2D::new(0.2, 0.5),
            right_shoulder: Point2D::new(0.6, 0.2),
            left_hip: Point2D::new(0.2, 0.8),
            right_hip: Point2D::new(0.6, 0.5),
            left_knee: Point2D::new(0.4, 0.8),
            right_knee: Point2D::new(0.6, 0.8),
        }
    }

    #[test]
    fn test_annotation_for_detected_body() {
        let frame = Frame::new(3, 100, 100);
        let analysis = analyze(&crouching(), 100, 100);

        let mut writer = AnnotationWriter::new(Vec::new());
        writer.render(&frame, Some(&analysis)).unwrap();
        writer.finish().unwrap();

        let output = String::from_utf8(writer.into_inner()).unwrap();
        let value: serde_json::Value = serde_json::from_str(output.trim_end()).unwrap();

        assert_eq!(value["frame_index"], 3);
        assert_eq!(value["body_detected"], true);
        assert_eq!(value["alerts"][0]["kind"], "arms_not_raised");
        assert_eq!(value["alerts"][1]["kind"], "crouching");
        assert_eq!(value["alerts"][1]["message"], "You are crouching!");
        assert_eq!(value["alerts"][1]["position"], serde_json::json!([10, 60]));
        assert_eq!(value["segments"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_annotation_without_body() {
        let frame = Frame::new(0, 640, 480);

        let mut writer = AnnotationWriter::new(Vec::new());
        writer.render(&frame, None).unwrap();
        writer.render(&frame, None).unwrap();

        let output = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(output.lines().count(), 2);

        let value: serde_json::Value = serde_json::from_str(output.lines().next().unwrap()).unwrap();
        assert_eq!(value["body_detected"], false);
        assert!(value["angles"].is_null());
        assert!(value["alerts"].as_array().unwrap().is_empty());
        assert!(value["segments"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_log_renderer_tracks_active_alerts() {
        let frame = Frame::new(0, 100, 100);
        let analysis = analyze(&crouching(), 100, 100);
        let mut renderer = LogRenderer::default();

        renderer.render(&frame, Some(&analysis)).unwrap();
        assert_eq!(
            renderer.active,
            vec![PostureAlert::ArmsNotRaised, PostureAlert::Crouching]
        );

        renderer.render(&frame, None).unwrap();
        assert!(renderer.active.is_empty());
    }
}
