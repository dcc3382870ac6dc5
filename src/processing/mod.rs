mod guard;
mod monitor;
mod pipeline;

pub use guard::{ProcessingGuard, ProcessingPermit};
pub use monitor::LiveMonitor;
pub use pipeline::{BatchOutcome, Processor, DEFAULT_FRAME_DURATION_SECS};
