//! Post-interview report synthesis.
//!
//! Everything here is a pure projection of the interview's event log and
//! metadata. Create-once semantics (return the stored report if one exists)
//! are enforced at the persistence layer, not here, so callers can always
//! regenerate and compare.

use chrono::Utc;

use crate::models::{Deductions, DetectionType, Interview, Report};
use crate::scoring::deduction_for;

/// Build the integrity report for an interview.
///
/// Idempotent over an unchanged event log: counts, deductions, score,
/// summary, and recommendations all come out identical on regeneration.
/// The derived score matches [`crate::scoring::compute_integrity_score`]
/// over the same log because both draw on the same weight table.
pub fn generate_report(interview: &Interview) -> Report {
    let count = |detection_type: DetectionType| -> u32 {
        interview
            .detection_events
            .iter()
            .filter(|e| e.detection_type == detection_type)
            .count() as u32
    };

    let totals = EventTotals {
        focus_loss: count(DetectionType::FocusLost),
        face_absence: count(DetectionType::FaceAbsent),
        multiple_faces: count(DetectionType::MultipleFaces),
        phone: count(DetectionType::PhoneDetected),
        notes: count(DetectionType::NotesDetected),
        device: count(DetectionType::DeviceDetected),
    };

    let deductions = Deductions {
        focus_loss: totals.focus_loss * deduction_for(DetectionType::FocusLost),
        face_absence: totals.face_absence * deduction_for(DetectionType::FaceAbsent),
        multiple_faces: totals.multiple_faces * deduction_for(DetectionType::MultipleFaces),
        phone_detections: totals.phone * deduction_for(DetectionType::PhoneDetected),
        notes_detections: totals.notes * deduction_for(DetectionType::NotesDetected),
        device_detections: totals.device * deduction_for(DetectionType::DeviceDetected),
    };

    let integrity_score = 100u32.saturating_sub(deductions.total()) as u8;

    Report {
        interview_id: interview.id.clone(),
        candidate_name: interview.candidate.clone(),
        interviewer_name: interview.interviewer.clone(),
        interview_duration: interview.duration_minutes,
        total_focus_loss_events: totals.focus_loss,
        total_face_absence_events: totals.face_absence,
        total_multiple_faces_events: totals.multiple_faces,
        total_phone_detections: totals.phone,
        total_notes_detections: totals.notes,
        total_device_detections: totals.device,
        integrity_score,
        deductions,
        summary: build_summary(&totals, integrity_score, interview.duration_minutes),
        recommendations: build_recommendations(&totals, integrity_score),
        generated_at: Utc::now(),
    }
}

struct EventTotals {
    focus_loss: u32,
    face_absence: u32,
    multiple_faces: u32,
    phone: u32,
    notes: u32,
    device: u32,
}

fn build_summary(totals: &EventTotals, integrity_score: u8, duration_minutes: u32) -> String {
    let mut summary = format!(
        "Interview completed with an integrity score of {integrity_score}/100. \
         The interview lasted {duration_minutes} minutes. "
    );

    if totals.focus_loss > 0 {
        summary.push_str(&format!(
            "The candidate lost focus {} times during the interview. ",
            totals.focus_loss
        ));
    }
    if totals.phone > 0 {
        summary.push_str(&format!(
            "A mobile phone was detected {} times. ",
            totals.phone
        ));
    }
    if totals.notes > 0 {
        summary.push_str(&format!(
            "Notes or books were detected {} times. ",
            totals.notes
        ));
    }

    summary.push_str(match integrity_score {
        90..=100 => "Overall, the candidate maintained good integrity throughout the interview.",
        70..=89 => "The candidate showed some concerning behavior but maintained reasonable integrity.",
        _ => "The candidate showed significant integrity concerns during the interview.",
    });

    summary
}

/// Rules are independent and evaluated in a fixed order; every rule that
/// matches contributes, and only an empty result gets the fallback entry.
fn build_recommendations(totals: &EventTotals, integrity_score: u8) -> Vec<String> {
    let mut recommendations = Vec::new();

    if totals.focus_loss > 5 {
        recommendations.push("Consider additional focus training for the candidate".to_string());
    }
    if totals.phone > 0 {
        recommendations.push("Implement stricter phone detection policies".to_string());
    }
    if totals.notes > 0 {
        recommendations.push(
            "Review candidate preparation guidelines regarding study materials".to_string(),
        );
    }
    if totals.face_absence > 3 {
        recommendations.push(
            "Investigate technical issues or candidate behavior during face absence periods"
                .to_string(),
        );
    }
    if integrity_score < 70 {
        recommendations
            .push("Consider additional proctoring measures for future interviews".to_string());
        recommendations.push("Review interview environment setup with the candidate".to_string());
    }

    if recommendations.is_empty() {
        recommendations
            .push("No specific recommendations - candidate maintained good integrity".to_string());
    }

    recommendations
}
