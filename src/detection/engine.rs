//! Temporal gating for raw detections.
//!
//! Focus-loss and face-absence signals arrive as per-cycle observation
//! windows and only become events once their cumulative time crosses a
//! threshold. Everything else is instantaneous and passes straight through.

use std::sync::Arc;

use crate::models::{DetectionEvent, DetectionResult, DetectionType};

use super::store::{InMemoryTemporalStore, SessionTemporalState, TemporalStateStore};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = false;

use crate::log_info;

/// Cumulative away-time before a focus-loss event is emitted.
pub const FOCUS_LOSS_THRESHOLD_SECS: f64 = 5.0;
/// Cumulative absence time before a face-absence event is emitted.
pub const FACE_ABSENCE_THRESHOLD_SECS: f64 = 10.0;

/// Applies the threshold policy to each batch of raw detections and owns the
/// per-interview temporal state. One engine instance per process; construct
/// it against a custom [`TemporalStateStore`] to share state across
/// instances.
pub struct DetectionEngine {
    store: Arc<dyn TemporalStateStore>,
}

impl Default for DetectionEngine {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl DetectionEngine {
    pub fn in_memory() -> Self {
        Self::with_store(Arc::new(InMemoryTemporalStore::new()))
    }

    pub fn with_store(store: Arc<dyn TemporalStateStore>) -> Self {
        Self { store }
    }

    /// Process one evaluation cycle's detections for `session_id`.
    ///
    /// Gated types (`FocusLost`, `FaceAbsent`) accumulate their reported
    /// window into the session's running total and emit at most one event
    /// per batch, when the total first crosses the threshold. Emission
    /// resets the accumulator, so a single long absence is reported once.
    /// A batch with no detection of a gated type also resets its
    /// accumulator: a gap in the signal clears accumulated time outright
    /// rather than decaying it. Whether partial accumulation should instead
    /// survive gap cycles is an open product question; this matches the
    /// shipped behavior.
    ///
    /// If a batch carries more than one detection of the same gated type,
    /// only the first is used. That is current behavior, not a contract;
    /// analyzers are expected to report each gated signal at most once per
    /// cycle.
    ///
    /// Output order: thresholded focus event, thresholded face-absence
    /// event, then pass-through events in input order.
    ///
    /// No I/O happens here. The caller appends the returned events to the
    /// interview's log, recomputes the score, and persists both.
    pub fn process_detections(
        &self,
        session_id: &str,
        detections: &[DetectionResult],
    ) -> Vec<DetectionEvent> {
        let mut state = self.store.load(session_id);
        let mut events = Vec::new();

        let focus = detections
            .iter()
            .find(|d| d.detection_type == DetectionType::FocusLost);
        let face_absent = detections
            .iter()
            .find(|d| d.detection_type == DetectionType::FaceAbsent);

        if let Some(emitted) = accumulate_gated(
            &mut state.focus_away_secs,
            focus,
            FOCUS_LOSS_THRESHOLD_SECS,
            "Focus lost for more than 5 seconds",
        ) {
            log_info!(
                "session {session_id}: focus-loss threshold crossed at {:.1}s",
                emitted.duration
            );
            events.push(emitted);
        }

        if let Some(emitted) = accumulate_gated(
            &mut state.face_absent_secs,
            face_absent,
            FACE_ABSENCE_THRESHOLD_SECS,
            "Face absent for more than 10 seconds",
        ) {
            log_info!(
                "session {session_id}: face-absence threshold crossed at {:.1}s",
                emitted.duration
            );
            events.push(emitted);
        }

        events.extend(
            detections
                .iter()
                .filter(|d| {
                    d.detection_type != DetectionType::FocusLost
                        && d.detection_type != DetectionType::FaceAbsent
                })
                .cloned()
                .map(DetectionEvent::from_result),
        );

        self.store.save(session_id, state);
        events
    }

    /// Clear both accumulators for `session_id`. Must be called when an
    /// interview ends or restarts so ended sessions don't leave entries
    /// behind in the store.
    pub fn reset(&self, session_id: &str) {
        self.store.reset(session_id);
    }
}

/// Advance one gated accumulator and return the thresholded event, if any.
///
/// `accum` holds the running total going into this batch. With a detection
/// present the total grows by its window; crossing `threshold` emits an
/// event carrying the cumulative duration and zeroes the total. With no
/// detection present the total is zeroed unconditionally.
fn accumulate_gated(
    accum: &mut f64,
    detection: Option<&DetectionResult>,
    threshold: f64,
    crossed_description: &str,
) -> Option<DetectionEvent> {
    let Some(detection) = detection else {
        *accum = 0.0;
        return None;
    };

    let prev = *accum;
    let next = prev + detection.duration;
    *accum = next;

    if prev < threshold && next >= threshold {
        *accum = 0.0;
        let mut event = DetectionEvent::from_result(detection.clone());
        event.duration = next;
        event.description = crossed_description.to_string();
        return Some(event);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;
    use chrono::Utc;

    fn result(detection_type: DetectionType, duration: f64) -> DetectionResult {
        DetectionResult {
            detection_type,
            confidence: 0.85,
            timestamp: Utc::now(),
            duration,
            description: String::from("raw detection"),
            severity: Severity::Medium,
        }
    }

    #[test]
    fn focus_loss_emits_once_when_cumulative_crosses_five_seconds() {
        let engine = DetectionEngine::in_memory();

        assert!(engine
            .process_detections("s1", &[result(DetectionType::FocusLost, 2.0)])
            .is_empty());
        assert!(engine
            .process_detections("s1", &[result(DetectionType::FocusLost, 2.0)])
            .is_empty());

        let events = engine.process_detections("s1", &[result(DetectionType::FocusLost, 2.0)]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].detection_type, DetectionType::FocusLost);
        assert_eq!(events[0].duration, 6.0);
        assert!(events[0].description.contains("5 seconds"));

        // Accumulation restarts from zero after emission.
        assert!(engine
            .process_detections("s1", &[result(DetectionType::FocusLost, 4.0)])
            .is_empty());
    }

    #[test]
    fn face_absence_emits_once_when_cumulative_crosses_ten_seconds() {
        let engine = DetectionEngine::in_memory();

        for _ in 0..2 {
            assert!(engine
                .process_detections("s1", &[result(DetectionType::FaceAbsent, 4.0)])
                .is_empty());
        }

        let events = engine.process_detections("s1", &[result(DetectionType::FaceAbsent, 4.0)]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].detection_type, DetectionType::FaceAbsent);
        assert_eq!(events[0].duration, 12.0);
    }

    #[test]
    fn gap_cycle_resets_accumulated_time() {
        let engine = DetectionEngine::in_memory();

        assert!(engine
            .process_detections("s1", &[result(DetectionType::FocusLost, 4.0)])
            .is_empty());
        // Batch without a focus-loss detection zeroes the accumulator.
        assert!(engine.process_detections("s1", &[]).is_empty());
        // 4s again: starts fresh, stays below the threshold.
        assert!(engine
            .process_detections("s1", &[result(DetectionType::FocusLost, 4.0)])
            .is_empty());
    }

    #[test]
    fn pass_through_is_independent_of_gated_signals() {
        let engine = DetectionEngine::in_memory();

        let events = engine.process_detections(
            "s1",
            &[
                result(DetectionType::PhoneDetected, 2.0),
                result(DetectionType::FocusLost, 1.0),
            ],
        );
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].detection_type, DetectionType::PhoneDetected);
    }

    #[test]
    fn pass_through_preserves_input_order_after_thresholded_events() {
        let engine = DetectionEngine::in_memory();
        engine.process_detections("s1", &[result(DetectionType::FocusLost, 4.0)]);

        let events = engine.process_detections(
            "s1",
            &[
                result(DetectionType::NotesDetected, 1.0),
                result(DetectionType::FocusLost, 2.0),
                result(DetectionType::PhoneDetected, 1.0),
            ],
        );
        let types: Vec<DetectionType> = events.iter().map(|e| e.detection_type).collect();
        assert_eq!(
            types,
            vec![
                DetectionType::FocusLost,
                DetectionType::NotesDetected,
                DetectionType::PhoneDetected,
            ]
        );
    }

    #[test]
    fn exact_threshold_hit_still_emits() {
        let engine = DetectionEngine::in_memory();
        let events = engine.process_detections("s1", &[result(DetectionType::FocusLost, 5.0)]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].duration, 5.0);
    }

    #[test]
    fn sessions_accumulate_independently() {
        let engine = DetectionEngine::in_memory();

        engine.process_detections("a", &[result(DetectionType::FocusLost, 4.0)]);
        // Session b hasn't accumulated anything yet.
        assert!(engine
            .process_detections("b", &[result(DetectionType::FocusLost, 4.0)])
            .is_empty());
        // Session a crosses on its second batch.
        let events = engine.process_detections("a", &[result(DetectionType::FocusLost, 4.0)]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].duration, 8.0);
    }

    #[test]
    fn reset_clears_accumulated_state() {
        let engine = DetectionEngine::in_memory();

        engine.process_detections("s1", &[result(DetectionType::FocusLost, 4.0)]);
        engine.reset("s1");
        assert!(engine
            .process_detections("s1", &[result(DetectionType::FocusLost, 4.0)])
            .is_empty());
    }

    #[test]
    fn unknown_session_is_treated_as_fresh() {
        let engine = DetectionEngine::in_memory();
        // Never an error; accumulation simply starts at zero.
        assert!(engine
            .process_detections("never-seen", &[result(DetectionType::FaceAbsent, 9.0)])
            .is_empty());
    }
}
