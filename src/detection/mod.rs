mod engine;
mod store;

pub use engine::{DetectionEngine, FACE_ABSENCE_THRESHOLD_SECS, FOCUS_LOSS_THRESHOLD_SECS};
pub use store::{InMemoryTemporalStore, SessionTemporalState, TemporalStateStore};
