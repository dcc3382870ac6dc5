use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};

use crate::models::{DetectionType, InterviewStatus, Severity};

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| anyhow!("invalid {field} datetime '{value}': {err}"))
}

pub fn parse_status(value: &str) -> Result<InterviewStatus> {
    match value {
        "Scheduled" => Ok(InterviewStatus::Scheduled),
        "InProgress" => Ok(InterviewStatus::InProgress),
        "Completed" => Ok(InterviewStatus::Completed),
        "Cancelled" => Ok(InterviewStatus::Cancelled),
        _ => Err(anyhow!("unknown interview status '{value}'")),
    }
}

pub fn parse_detection_type(value: &str) -> Result<DetectionType> {
    match value {
        "focus_lost" => Ok(DetectionType::FocusLost),
        "face_absent" => Ok(DetectionType::FaceAbsent),
        "multiple_faces" => Ok(DetectionType::MultipleFaces),
        "phone_detected" => Ok(DetectionType::PhoneDetected),
        "notes_detected" => Ok(DetectionType::NotesDetected),
        "device_detected" => Ok(DetectionType::DeviceDetected),
        _ => Err(anyhow!("unknown detection type '{value}'")),
    }
}

pub fn parse_severity(value: &str) -> Result<Severity> {
    match value {
        "low" => Ok(Severity::Low),
        "medium" => Ok(Severity::Medium),
        "high" => Ok(Severity::High),
        _ => Err(anyhow!("unknown severity '{value}'")),
    }
}

pub fn to_score(value: i64, field: &str) -> Result<u8> {
    u8::try_from(value)
        .ok()
        .filter(|score| *score <= 100)
        .ok_or_else(|| anyhow!("{field} value {value} outside [0, 100]"))
}
