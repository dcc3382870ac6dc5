use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Closed set of behaviors the perception layer can flag. Not extensible at
/// runtime; the scoring weights and report breakdown key off this enum.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DetectionType {
    FocusLost,
    FaceAbsent,
    MultipleFaces,
    PhoneDetected,
    NotesDetected,
    DeviceDetected,
}

impl DetectionType {
    pub const ALL: [DetectionType; 6] = [
        DetectionType::FocusLost,
        DetectionType::FaceAbsent,
        DetectionType::MultipleFaces,
        DetectionType::PhoneDetected,
        DetectionType::NotesDetected,
        DetectionType::DeviceDetected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionType::FocusLost => "focus_lost",
            DetectionType::FaceAbsent => "face_absent",
            DetectionType::MultipleFaces => "multiple_faces",
            DetectionType::PhoneDetected => "phone_detected",
            DetectionType::NotesDetected => "notes_detected",
            DetectionType::DeviceDetected => "device_detected",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Medium
    }
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

/// Raw output of one analyzer evaluation cycle, before temporal gating.
///
/// For `FocusLost`/`FaceAbsent` the `duration` is the length of the current
/// observation window being reported, not a thresholded total. For the other
/// types it is an estimated event duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    #[serde(rename = "type")]
    pub detection_type: DetectionType,
    /// In [0, 1]; validated at the system boundary, assumed well-formed here.
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
    /// Seconds, >= 0.
    pub duration: f64,
    pub description: String,
    #[serde(default)]
    pub severity: Severity,
}

/// An accepted occurrence, appended to an interview's event log.
///
/// Same shape as [`DetectionResult`], but for gated types `duration` carries
/// the cumulative time that crossed the threshold and `description` states
/// which threshold was crossed. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionEvent {
    #[serde(rename = "type")]
    pub detection_type: DetectionType,
    pub timestamp: DateTime<Utc>,
    pub duration: f64,
    pub confidence: f64,
    pub description: String,
    #[serde(default)]
    pub severity: Severity,
}

impl DetectionEvent {
    /// Accept a raw result as-is (pass-through types).
    pub fn from_result(result: DetectionResult) -> Self {
        Self {
            detection_type: result.detection_type,
            timestamp: result.timestamp,
            duration: result.duration,
            confidence: result.confidence,
            description: result.description,
            severity: result.severity,
        }
    }
}
