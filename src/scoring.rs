//! Integrity score derivation.
//!
//! One weight table shared by the scorer and the report generator, so the
//! report's deduction breakdown can never drift from the score itself.

use crate::models::{DetectionEvent, DetectionType};

/// Points deducted per accepted event of each type.
pub const fn deduction_for(detection_type: DetectionType) -> u32 {
    match detection_type {
        DetectionType::FocusLost => 2,
        DetectionType::FaceAbsent => 5,
        DetectionType::MultipleFaces => 10,
        DetectionType::PhoneDetected => 15,
        DetectionType::NotesDetected => 20,
        DetectionType::DeviceDetected => 10,
    }
}

/// Compute the integrity score from a full event log.
///
/// Pure and order-independent: `max(0, 100 - sum of per-event deductions)`.
/// Callers recompute from the complete log on every append rather than
/// adjusting a stored score, so the value is always reproducible from the
/// log alone.
pub fn compute_integrity_score(events: &[DetectionEvent]) -> u8 {
    let deductions: u32 = events
        .iter()
        .map(|event| deduction_for(event.detection_type))
        .sum();
    100u32.saturating_sub(deductions) as u8
}
