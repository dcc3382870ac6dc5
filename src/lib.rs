//! Integrity monitoring for remote video interviews.
//!
//! Raw perceptual signals (gaze, face presence, objects) come in per frame
//! or per batch; the detection engine turns them into debounced events, the
//! scorer derives an integrity score from the accumulated event log, and the
//! report module projects the same log into a human-readable summary.
//! Persistence is SQLite, live fan-out is a broadcast bus, and the actual
//! perception models sit behind the [`vision::FrameAnalyzer`] trait.

pub mod db;
pub mod detection;
pub mod models;
pub mod processing;
pub mod realtime;
pub mod report;
pub mod scoring;
pub mod utils;
pub mod vision;

pub use db::Database;
pub use detection::{DetectionEngine, InMemoryTemporalStore, TemporalStateStore};
pub use models::{
    DetectionEvent, DetectionResult, DetectionType, Interview, InterviewStatus, Report, Severity,
};
pub use processing::{LiveMonitor, Processor};
pub use realtime::{EventBus, LiveUpdate};
pub use report::generate_report;
pub use scoring::compute_integrity_score;
pub use vision::{FrameAnalyzer, SimulatedAnalyzer};
