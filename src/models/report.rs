use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-type deduction breakdown, count x weight for each detection type.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Deductions {
    pub focus_loss: u32,
    pub face_absence: u32,
    pub multiple_faces: u32,
    pub phone_detections: u32,
    pub notes_detections: u32,
    pub device_detections: u32,
}

impl Deductions {
    pub fn total(&self) -> u32 {
        self.focus_loss
            + self.face_absence
            + self.multiple_faces
            + self.phone_detections
            + self.notes_detections
            + self.device_detections
    }
}

/// Post-interview integrity report. A pure projection of the interview's
/// event log and metadata; regenerating over an unchanged log yields an
/// identical report apart from `generated_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub interview_id: String,
    pub candidate_name: String,
    pub interviewer_name: String,
    /// Minutes.
    pub interview_duration: u32,
    pub total_focus_loss_events: u32,
    pub total_face_absence_events: u32,
    pub total_multiple_faces_events: u32,
    pub total_phone_detections: u32,
    pub total_notes_detections: u32,
    pub total_device_detections: u32,
    pub integrity_score: u8,
    pub deductions: Deductions,
    pub summary: String,
    pub recommendations: Vec<String>,
    pub generated_at: DateTime<Utc>,
}
