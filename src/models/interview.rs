use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::detection::DetectionEvent;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum InterviewStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl InterviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewStatus::Scheduled => "Scheduled",
            InterviewStatus::InProgress => "InProgress",
            InterviewStatus::Completed => "Completed",
            InterviewStatus::Cancelled => "Cancelled",
        }
    }
}

/// A proctored interview session.
///
/// Owns the ordered, append-only detection event log and the integrity score
/// derived from it. The engine only ever appends events and recomputes the
/// score; events are never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interview {
    pub id: String,
    pub title: String,
    pub interviewer: String,
    pub candidate: String,
    pub scheduled_at: DateTime<Utc>,
    /// Planned length in minutes, surfaced in the report summary.
    pub duration_minutes: u32,
    pub status: InterviewStatus,
    /// Insertion order = arrival order.
    pub detection_events: Vec<DetectionEvent>,
    /// In [0, 100]; 100 at creation, recomputed from the full log on append.
    pub integrity_score: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Interview {
    pub fn new(
        title: impl Into<String>,
        interviewer: impl Into<String>,
        candidate: impl Into<String>,
        scheduled_at: DateTime<Utc>,
        duration_minutes: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            interviewer: interviewer.into(),
            candidate: candidate.into(),
            scheduled_at,
            duration_minutes,
            status: InterviewStatus::Scheduled,
            detection_events: Vec::new(),
            integrity_score: 100,
            created_at: now,
            updated_at: now,
        }
    }
}
