/// Example program to classify every frame of a recorded session
/// Run with: cargo run --example classify_recording -- demos/squat.jsonl

use coil_lib::core::posture_classifier::analyze_frame;
use coil_lib::models::posture::LandmarkSet;
use coil_lib::platform::capture::FrameSource;
use coil_lib::platform::pose::{PoseEstimator, Recording};
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("demos/squat.jsonl"));

    println!("=== Classifying {} ===\n", path.display());

    let recording = Recording::load(&path)?;
    let (mut source, mut estimator) = recording.into_replay();

    while let Some(frame) = source.next_frame()? {
        let pose = estimator.process_frame(&frame)?;
        let landmarks = pose.as_ref().and_then(LandmarkSet::from_body_pose);

        match analyze_frame(landmarks.as_ref(), frame.width, frame.height) {
            None => println!("Frame {:>3}: no body", frame.index),
            Some(analysis) => {
                let angles = analysis.angles;
                let alerts: Vec<&str> = analysis.alerts.iter().map(|a| a.message()).collect();
                println!(
                    "Frame {:>3}: arms {:>5.1}/{:>5.1}  knees {:>5.1}/{:>5.1}  {}",
                    frame.index,
                    angles.left_arm.value_degrees,
                    angles.right_arm.value_degrees,
                    angles.left_knee.value_degrees,
                    angles.right_knee.value_degrees,
                    if alerts.is_empty() { "OK".to_string() } else { alerts.join(" ") }
                );
            }
        }
    }

    println!("\n✓ Done");
    Ok(())
}
