mod detection;
mod interview;
mod report;

pub use detection::{DetectionEvent, DetectionResult, DetectionType, Severity};
pub use interview::{Interview, InterviewStatus};
pub use report::{Deductions, Report};
