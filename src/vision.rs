//! Perception boundary.
//!
//! The engine only requires that something produces zero or more typed
//! [`DetectionResult`]s per evaluation cycle. Real model inference lives
//! behind [`FrameAnalyzer`]; the simulated implementation mirrors the
//! probabilistic stand-in used while the ML pipeline is stubbed out.

use anyhow::Result;
use chrono::Utc;
use rand::Rng;

use crate::models::{DetectionResult, DetectionType, Severity};

/// Minimum confidence for an object detection to be reported at all.
pub const MIN_CONFIDENCE: f64 = 0.7;

/// Produces detections for one frame (or one batch window) of video.
///
/// Implementations must keep `confidence` in [0, 1] and `duration >= 0`;
/// the engine assumes well-formed input and does not re-validate. A failed
/// cycle is an error the caller logs and skips; partial results must never
/// be returned.
pub trait FrameAnalyzer: Send + Sync {
    fn analyze_frame(&self, frame: &[u8]) -> Result<Vec<DetectionResult>>;
}

/// Probabilistic analyzer standing in for the face/gaze/object models.
///
/// Emission rates follow the stubbed perception layer: ~20% chance of a
/// focus-loss observation per cycle, 5% face absence, 2% multiple faces,
/// and rare object sightings, each above [`MIN_CONFIDENCE`].
#[derive(Default)]
pub struct SimulatedAnalyzer;

impl SimulatedAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl FrameAnalyzer for SimulatedAnalyzer {
    fn analyze_frame(&self, _frame: &[u8]) -> Result<Vec<DetectionResult>> {
        let mut rng = rand::thread_rng();
        let now = Utc::now();
        let mut detections = Vec::new();

        if rng.gen::<f64>() > 0.8 {
            detections.push(DetectionResult {
                detection_type: DetectionType::FocusLost,
                confidence: 0.75,
                timestamp: now,
                duration: 2.5,
                description: "Candidate appears to be looking away from screen".to_string(),
                severity: Severity::Medium,
            });
        }

        if rng.gen::<f64>() > 0.95 {
            detections.push(DetectionResult {
                detection_type: DetectionType::FaceAbsent,
                confidence: 0.9,
                timestamp: now,
                duration: 3.0,
                description: "No face detected in frame".to_string(),
                severity: Severity::High,
            });
        }

        if rng.gen::<f64>() > 0.98 {
            detections.push(DetectionResult {
                detection_type: DetectionType::MultipleFaces,
                confidence: 0.88,
                timestamp: now,
                duration: 1.0,
                description: "Multiple faces detected in frame".to_string(),
                severity: Severity::High,
            });
        }

        if rng.gen::<f64>() > 0.97 {
            let (detection_type, description) = match rng.gen_range(0..3) {
                0 => (
                    DetectionType::PhoneDetected,
                    "Mobile phone detected in frame",
                ),
                1 => (
                    DetectionType::NotesDetected,
                    "Books or notes detected in frame",
                ),
                _ => (
                    DetectionType::DeviceDetected,
                    "Unauthorized electronic device detected",
                ),
            };
            detections.push(DetectionResult {
                detection_type,
                confidence: rng.gen_range(MIN_CONFIDENCE..0.95),
                timestamp: now,
                duration: 1.2,
                description: description.to_string(),
                severity: Severity::High,
            });
        }

        Ok(detections)
    }
}
