// Frame loop
// Pulls frames from a source, runs the estimator and the classifier on each,
// and hands the result to every registered renderer.

use super::overlay::OverlayRenderer;
use super::posture_classifier::analyze_frame;
use crate::models::capture::Frame;
use crate::models::pose::{PoseError, PoseResult};
use crate::models::posture::{FrameAnalysis, LandmarkSet};
use crate::platform::capture::FrameSource;
use crate::platform::pose::PoseEstimator;
use log::{debug, error, info, warn};
use serde::Serialize;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoopStats {
    pub frames: u64,
    pub frames_with_body: u64,
    pub frames_with_alerts: u64,
}

pub struct FrameLoop<S, E> {
    source: S,
    estimator: E,
    renderers: Vec<Box<dyn OverlayRenderer>>,
    frame_interval: Duration,
}

impl<S: FrameSource, E: PoseEstimator> FrameLoop<S, E> {
    pub fn new(source: S, estimator: E, frame_interval: Duration) -> Self {
        Self {
            source,
            estimator,
            renderers: Vec::new(),
            frame_interval,
        }
    }

    pub fn with_renderer(mut self, renderer: Box<dyn OverlayRenderer>) -> Self {
        self.renderers.push(renderer);
        self
    }

    /// Estimate, classify and render a single frame.
    /// Estimator failures are treated as a frame without a body.
    pub fn process_frame(&mut self, frame: &Frame) -> Option<FrameAnalysis> {
        let pose = match self.estimator.process_frame(frame) {
            Ok(pose) => pose,
            Err(e) => {
                warn!("Pose estimation failed on frame {}: {}", frame.index, e);
                None
            }
        };

        let landmarks = pose.as_ref().and_then(LandmarkSet::from_body_pose);
        if pose.is_some() && landmarks.is_none() {
            debug!("Frame {}: incomplete landmarks, skipping", frame.index);
        }

        let analysis = analyze_frame(landmarks.as_ref(), frame.width, frame.height);

        for renderer in &mut self.renderers {
            if let Err(e) = renderer.render(frame, analysis.as_ref()) {
                error!("Render failed on frame {}: {}", frame.index, e);
            }
        }

        analysis
    }

    /// Run until the source is exhausted or `shutdown` resolves.
    /// Refuses to start before the estimator has loaded its models.
    pub async fn run_until<F: Future>(&mut self, shutdown: F) -> PoseResult<LoopStats> {
        if !self.estimator.is_initialized() {
            return Err(PoseError::NotInitialized);
        }
        info!("Starting frame loop ({})", self.estimator.get_model_info());

        let mut stats = LoopStats::default();
        tokio::pin!(shutdown);

        loop {
            let frame = match self.source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    info!("Frame source exhausted");
                    break;
                }
                Err(e) => {
                    error!("Frame capture failed: {}", e);
                    break;
                }
            };

            let analysis = self.process_frame(&frame);
            stats.frames += 1;
            if let Some(analysis) = &analysis {
                stats.frames_with_body += 1;
                if !analysis.alerts.is_empty() {
                    stats.frames_with_alerts += 1;
                }
            }

            let stop = if self.frame_interval.is_zero() {
                tokio::select! {
                    _ = &mut shutdown => true,
                    _ = tokio::task::yield_now() => false,
                }
            } else {
                tokio::select! {
                    _ = &mut shutdown => true,
                    _ = tokio::time::sleep(self.frame_interval) => false,
                }
            };

            if stop {
                info!("Shutdown requested, stopping frame loop");
                break;
            }
        }

        for renderer in &mut self.renderers {
            if let Err(e) = renderer.finish() {
                error!("Failed to finish renderer: {}", e);
            }
        }

        Ok(stats)
    }
}
