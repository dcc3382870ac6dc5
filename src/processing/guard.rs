use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};

/// Admission control for recording-processing jobs.
///
/// The temporal store and event log assume one in-flight batch per
/// interview, so overlapping jobs for the same interview id are rejected as
/// a conflict. Distinct interviews are admitted freely. The permit releases
/// its slot on drop, including on the error paths.
#[derive(Clone, Default)]
pub struct ProcessingGuard {
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl ProcessingGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self, interview_id: &str) -> Result<ProcessingPermit> {
        let mut in_flight = lock(&self.in_flight);
        if !in_flight.insert(interview_id.to_string()) {
            bail!("video is already being processed for interview {interview_id}");
        }
        Ok(ProcessingPermit {
            in_flight: Arc::clone(&self.in_flight),
            interview_id: interview_id.to_string(),
        })
    }

    pub fn is_processing(&self, interview_id: &str) -> bool {
        lock(&self.in_flight).contains(interview_id)
    }
}

#[derive(Debug)]
pub struct ProcessingPermit {
    in_flight: Arc<Mutex<HashSet<String>>>,
    interview_id: String,
}

impl Drop for ProcessingPermit {
    fn drop(&mut self) {
        lock(&self.in_flight).remove(&self.interview_id);
    }
}

fn lock(set: &Mutex<HashSet<String>>) -> std::sync::MutexGuard<'_, HashSet<String>> {
    match set.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_job_for_same_interview_is_rejected() {
        let guard = ProcessingGuard::new();
        let _permit = guard.try_acquire("iv-1").unwrap();

        let conflict = guard.try_acquire("iv-1");
        assert!(conflict.is_err());
        assert!(conflict
            .unwrap_err()
            .to_string()
            .contains("already being processed"));
    }

    #[test]
    fn distinct_interviews_run_in_parallel() {
        let guard = ProcessingGuard::new();
        let _a = guard.try_acquire("iv-a").unwrap();
        let _b = guard.try_acquire("iv-b").unwrap();
        assert!(guard.is_processing("iv-a"));
        assert!(guard.is_processing("iv-b"));
    }

    #[test]
    fn dropping_the_permit_frees_the_slot() {
        let guard = ProcessingGuard::new();
        {
            let _permit = guard.try_acquire("iv-1").unwrap();
            assert!(guard.is_processing("iv-1"));
        }
        assert!(!guard.is_processing("iv-1"));
        assert!(guard.try_acquire("iv-1").is_ok());
    }
}
