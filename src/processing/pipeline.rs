use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;

use crate::db::Database;
use crate::detection::DetectionEngine;
use crate::models::{DetectionEvent, DetectionResult, DetectionType, InterviewStatus, Report};
use crate::realtime::{EventBus, LiveUpdate};
use crate::report::generate_report;
use crate::scoring::compute_integrity_score;
use crate::vision::FrameAnalyzer;

use super::guard::ProcessingGuard;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

/// Duration credited to gated signals for a single live frame when the
/// caller doesn't supply one.
pub const DEFAULT_FRAME_DURATION_SECS: f64 = 1.0;

/// Result of applying one evaluation cycle to an interview.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// Events that survived temporal gating, in emission order.
    pub events: Vec<DetectionEvent>,
    /// The interview's score after this cycle.
    pub integrity_score: u8,
}

/// Ties the pieces together: analyzer output goes through the detection
/// engine, accepted events are persisted with a freshly recomputed score,
/// and each accepted event is published to live subscribers.
///
/// The pipeline itself does no validation; detections are assumed
/// well-formed by the time they reach it.
pub struct Processor {
    engine: Arc<DetectionEngine>,
    db: Database,
    bus: Arc<EventBus>,
    guard: ProcessingGuard,
}

impl Processor {
    pub fn new(db: Database, bus: Arc<EventBus>) -> Self {
        Self::with_engine(Arc::new(DetectionEngine::in_memory()), db, bus)
    }

    pub fn with_engine(engine: Arc<DetectionEngine>, db: Database, bus: Arc<EventBus>) -> Self {
        Self {
            engine,
            db,
            bus,
            guard: ProcessingGuard::new(),
        }
    }

    pub fn engine(&self) -> &DetectionEngine {
        &self.engine
    }

    /// Process a complete uploaded recording as one batch.
    ///
    /// Holds the per-interview processing slot for the whole run; a second
    /// upload for the same interview while this one is in flight is a
    /// conflict. A frame the analyzer fails on is logged and skipped, never
    /// fed partially into the engine.
    pub async fn process_recording<F>(
        &self,
        interview_id: &str,
        analyzer: &dyn FrameAnalyzer,
        frames: F,
    ) -> Result<BatchOutcome>
    where
        F: IntoIterator<Item = Vec<u8>>,
    {
        let _permit = self.guard.try_acquire(interview_id)?;
        log_info!("processing recording for interview {interview_id}");

        let mut detections = Vec::new();
        for (index, frame) in frames.into_iter().enumerate() {
            match analyzer.analyze_frame(&frame) {
                Ok(frame_detections) => detections.extend(frame_detections),
                Err(err) => {
                    log_error!(
                        "analyzer failed on frame {index} of interview {interview_id}: {err:?}"
                    );
                }
            }
        }

        let outcome = self.apply_detections(interview_id, &detections).await?;
        log_info!(
            "recording processed for interview {interview_id}: {} events accepted, score {}",
            outcome.events.len(),
            outcome.integrity_score
        );
        Ok(outcome)
    }

    /// Process one live frame.
    ///
    /// `frame_duration_secs` is how much observed time this frame
    /// represents; it replaces the analyzer's per-detection duration on the
    /// gated types so the accumulators advance by wall-clock coverage.
    pub async fn process_frame(
        &self,
        interview_id: &str,
        analyzer: &dyn FrameAnalyzer,
        frame: &[u8],
        frame_duration_secs: f64,
    ) -> Result<BatchOutcome> {
        let mut detections = analyzer
            .analyze_frame(frame)
            .context("frame analysis failed")?;

        for detection in &mut detections {
            if matches!(
                detection.detection_type,
                DetectionType::FocusLost | DetectionType::FaceAbsent
            ) {
                detection.duration = frame_duration_secs;
            }
        }

        self.apply_detections(interview_id, &detections).await
    }

    /// Append externally produced detections (already gated or instantaneous)
    /// after running them through the engine, recompute the score from the
    /// full log, persist both, and publish every accepted event.
    pub async fn apply_detections(
        &self,
        interview_id: &str,
        detections: &[DetectionResult],
    ) -> Result<BatchOutcome> {
        let accepted = self.engine.process_detections(interview_id, detections);

        let interview = self
            .db
            .get_interview(interview_id)
            .await?
            .with_context(|| format!("interview '{interview_id}' not found"))?;

        if accepted.is_empty() {
            return Ok(BatchOutcome {
                events: accepted,
                integrity_score: interview.integrity_score,
            });
        }

        let mut log = interview.detection_events;
        log.extend(accepted.iter().cloned());
        let integrity_score = compute_integrity_score(&log);

        self.db
            .append_detection_events(interview_id, accepted.clone(), integrity_score, Utc::now())
            .await?;

        for event in &accepted {
            self.bus.publish(LiveUpdate {
                interview_id: interview_id.to_string(),
                event: event.clone(),
                integrity_score,
            });
        }

        Ok(BatchOutcome {
            events: accepted,
            integrity_score,
        })
    }

    pub async fn start_interview(&self, interview_id: &str) -> Result<()> {
        self.db
            .mark_interview_status(interview_id, InterviewStatus::InProgress, Utc::now())
            .await
    }

    /// Mark the interview completed and release its volatile state: the
    /// temporal accumulators and the live channel.
    pub async fn end_interview(&self, interview_id: &str) -> Result<()> {
        self.db
            .mark_interview_status(interview_id, InterviewStatus::Completed, Utc::now())
            .await?;
        self.engine.reset(interview_id);
        self.bus.close(interview_id);
        log_info!("interview {interview_id} completed");
        Ok(())
    }

    /// Report for an interview, create-once: an existing stored report is
    /// returned as-is, otherwise one is generated from the current log and
    /// persisted.
    pub async fn report_for(&self, interview_id: &str) -> Result<Report> {
        if let Some(existing) = self.db.get_report_for_interview(interview_id).await? {
            return Ok(existing);
        }

        let interview = self
            .db
            .get_interview(interview_id)
            .await?
            .with_context(|| format!("interview '{interview_id}' not found"))?;

        let report = generate_report(&interview);
        self.db.insert_report(&report).await?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Interview, Severity};
    use tempfile::TempDir;

    fn raw(detection_type: DetectionType, duration: f64) -> DetectionResult {
        DetectionResult {
            detection_type,
            confidence: 0.9,
            timestamp: Utc::now(),
            duration,
            description: String::from("raw detection"),
            severity: Severity::Medium,
        }
    }

    async fn setup() -> (TempDir, Processor, String) {
        let temp = TempDir::new().unwrap();
        let db = Database::new(temp.path().join("proctor.db")).unwrap();
        let interview = Interview::new("Systems screen", "Dana", "Rory", Utc::now(), 60);
        let interview_id = interview.id.clone();
        db.insert_interview(&interview).await.unwrap();

        let processor = Processor::new(db, Arc::new(EventBus::new()));
        (temp, processor, interview_id)
    }

    #[tokio::test]
    async fn accepted_events_update_the_persisted_score() {
        let (_temp, processor, id) = setup().await;

        let outcome = processor
            .apply_detections(&id, &[raw(DetectionType::PhoneDetected, 1.2)])
            .await
            .unwrap();
        assert_eq!(outcome.events.len(), 1);
        assert_eq!(outcome.integrity_score, 85);

        let stored = processor.db.get_interview(&id).await.unwrap().unwrap();
        assert_eq!(stored.integrity_score, 85);
        assert_eq!(stored.detection_events.len(), 1);
        assert_eq!(
            stored.detection_events[0].detection_type,
            DetectionType::PhoneDetected
        );
    }

    #[tokio::test]
    async fn sub_threshold_cycle_changes_nothing() {
        let (_temp, processor, id) = setup().await;

        let outcome = processor
            .apply_detections(&id, &[raw(DetectionType::FocusLost, 2.0)])
            .await
            .unwrap();
        assert!(outcome.events.is_empty());
        assert_eq!(outcome.integrity_score, 100);

        let stored = processor.db.get_interview(&id).await.unwrap().unwrap();
        assert!(stored.detection_events.is_empty());
        assert_eq!(stored.integrity_score, 100);
    }

    #[tokio::test]
    async fn gated_signal_crosses_threshold_across_cycles() {
        let (_temp, processor, id) = setup().await;

        for _ in 0..2 {
            processor
                .apply_detections(&id, &[raw(DetectionType::FocusLost, 2.0)])
                .await
                .unwrap();
        }
        let outcome = processor
            .apply_detections(&id, &[raw(DetectionType::FocusLost, 2.0)])
            .await
            .unwrap();

        assert_eq!(outcome.events.len(), 1);
        assert_eq!(outcome.events[0].duration, 6.0);
        assert_eq!(outcome.integrity_score, 98);
    }

    #[tokio::test]
    async fn accepted_events_reach_live_subscribers() {
        let (_temp, processor, id) = setup().await;
        let mut rx = processor.bus.subscribe(&id);

        processor
            .apply_detections(&id, &[raw(DetectionType::NotesDetected, 1.0)])
            .await
            .unwrap();

        let update = rx.recv().await.unwrap();
        assert_eq!(update.interview_id, id);
        assert_eq!(update.integrity_score, 80);
        assert_eq!(update.event.detection_type, DetectionType::NotesDetected);
    }

    #[tokio::test]
    async fn unknown_interview_is_an_error() {
        let (_temp, processor, _id) = setup().await;
        let result = processor
            .apply_detections("missing", &[raw(DetectionType::PhoneDetected, 1.0)])
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn report_is_create_once() {
        let (_temp, processor, id) = setup().await;

        processor
            .apply_detections(&id, &[raw(DetectionType::PhoneDetected, 1.0)])
            .await
            .unwrap();

        let first = processor.report_for(&id).await.unwrap();
        assert_eq!(first.integrity_score, 85);
        assert_eq!(first.total_phone_detections, 1);

        // Later events land in the log, but the stored report wins.
        processor
            .apply_detections(&id, &[raw(DetectionType::NotesDetected, 1.0)])
            .await
            .unwrap();
        let second = processor.report_for(&id).await.unwrap();
        assert_eq!(second.integrity_score, 85);
        assert_eq!(second.summary, first.summary);
        assert_eq!(second.generated_at, first.generated_at);
    }

    #[tokio::test]
    async fn report_matches_recomputed_score() {
        let (_temp, processor, id) = setup().await;

        processor
            .apply_detections(
                &id,
                &[
                    raw(DetectionType::PhoneDetected, 1.0),
                    raw(DetectionType::MultipleFaces, 1.0),
                ],
            )
            .await
            .unwrap();

        let stored = processor.db.get_interview(&id).await.unwrap().unwrap();
        let report = processor.report_for(&id).await.unwrap();
        assert_eq!(
            report.integrity_score,
            compute_integrity_score(&stored.detection_events)
        );
        assert_eq!(report.integrity_score, stored.integrity_score);
    }

    #[tokio::test]
    async fn end_interview_marks_completed_and_resets_state() {
        let (_temp, processor, id) = setup().await;

        processor.start_interview(&id).await.unwrap();
        processor
            .apply_detections(&id, &[raw(DetectionType::FocusLost, 4.0)])
            .await
            .unwrap();
        processor.end_interview(&id).await.unwrap();

        let stored = processor.db.get_interview(&id).await.unwrap().unwrap();
        assert_eq!(stored.status, InterviewStatus::Completed);

        // Accumulated focus time was cleared with the session.
        let outcome = processor
            .apply_detections(&id, &[raw(DetectionType::FocusLost, 4.0)])
            .await
            .unwrap();
        assert!(outcome.events.is_empty());
    }

    #[tokio::test]
    async fn failing_analyzer_frames_are_skipped() {
        struct FlakyAnalyzer;
        impl FrameAnalyzer for FlakyAnalyzer {
            fn analyze_frame(&self, frame: &[u8]) -> Result<Vec<DetectionResult>> {
                if frame.is_empty() {
                    anyhow::bail!("empty frame");
                }
                Ok(vec![raw(DetectionType::PhoneDetected, 1.0)])
            }
        }

        let (_temp, processor, id) = setup().await;
        let outcome = processor
            .process_recording(&id, &FlakyAnalyzer, vec![vec![], vec![1u8], vec![]])
            .await
            .unwrap();

        // Only the one analyzable frame contributed.
        assert_eq!(outcome.events.len(), 1);
        assert_eq!(outcome.integrity_score, 85);
    }

    #[tokio::test]
    async fn frame_duration_overrides_gated_detections() {
        struct FocusAnalyzer;
        impl FrameAnalyzer for FocusAnalyzer {
            fn analyze_frame(&self, _frame: &[u8]) -> Result<Vec<DetectionResult>> {
                Ok(vec![raw(DetectionType::FocusLost, 2.5)])
            }
        }

        let (_temp, processor, id) = setup().await;

        // Each frame covers 3 seconds of observation; the analyzer's own
        // 2.5s estimate is replaced, so the second frame crosses at 6.0.
        processor
            .process_frame(&id, &FocusAnalyzer, &[], 3.0)
            .await
            .unwrap();
        let outcome = processor
            .process_frame(&id, &FocusAnalyzer, &[], 3.0)
            .await
            .unwrap();

        assert_eq!(outcome.events.len(), 1);
        assert_eq!(outcome.events[0].duration, 6.0);
    }
}
