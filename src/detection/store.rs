use std::collections::HashMap;
use std::sync::Mutex;

/// Accumulated away-time for one interview's gated signals.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SessionTemporalState {
    pub focus_away_secs: f64,
    pub face_absent_secs: f64,
}

/// Keyed store for per-interview temporal state.
///
/// The in-process implementation below is the deployment default. It is
/// deliberately a trait seam: the accumulators live outside any persisted
/// record, so running more than one server instance requires swapping this
/// for a shared low-latency store. Single-instance only until then.
pub trait TemporalStateStore: Send + Sync {
    /// State for `session_id`, zeroed if the session has never been seen.
    fn load(&self, session_id: &str) -> SessionTemporalState;

    fn save(&self, session_id: &str, state: SessionTemporalState);

    /// Drop all accumulated state for `session_id`. Called when an interview
    /// ends or restarts; skipping it leaks an entry per ended session.
    fn reset(&self, session_id: &str);
}

/// Mutexed in-process map, one entry per interview with live accumulation.
#[derive(Default)]
pub struct InMemoryTemporalStore {
    sessions: Mutex<HashMap<String, SessionTemporalState>>,
}

impl InMemoryTemporalStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, SessionTemporalState>> {
        match self.sessions.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl TemporalStateStore for InMemoryTemporalStore {
    fn load(&self, session_id: &str) -> SessionTemporalState {
        self.lock().get(session_id).copied().unwrap_or_default()
    }

    fn save(&self, session_id: &str, state: SessionTemporalState) {
        self.lock().insert(session_id.to_string(), state);
    }

    fn reset(&self, session_id: &str) {
        self.lock().remove(session_id);
    }
}
