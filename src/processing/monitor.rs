//! Live monitoring loop for an in-progress interview.
//!
//! Ticks the frame analyzer at a fixed cadence and feeds each cycle through
//! the pipeline. Frame acquisition itself is outside the crate; the analyzer
//! is handed an empty frame reference and is expected to own its capture
//! source.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::vision::FrameAnalyzer;

use super::pipeline::{Processor, DEFAULT_FRAME_DURATION_SECS};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

// One analyzed frame per second of coverage; keep in step with
// DEFAULT_FRAME_DURATION_SECS so accumulated time tracks wall clock.
const FRAME_INTERVAL_SECS: u64 = 1;

/// Starts and stops the per-interview monitor task.
pub struct LiveMonitor {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl Default for LiveMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveMonitor {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
        }
    }

    pub fn start_monitoring(
        &mut self,
        interview_id: String,
        processor: Arc<Processor>,
        analyzer: Arc<dyn FrameAnalyzer>,
    ) -> Result<()> {
        if self.handle.is_some() {
            bail!("monitoring already active");
        }

        let cancel_token = CancellationToken::new();
        let token_clone = cancel_token.clone();

        let handle = tokio::spawn(monitor_loop(interview_id, processor, analyzer, token_clone));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    pub async fn stop_monitoring(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("monitor loop task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}

async fn monitor_loop(
    interview_id: String,
    processor: Arc<Processor>,
    analyzer: Arc<dyn FrameAnalyzer>,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(Duration::from_secs(FRAME_INTERVAL_SECS));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // A failed cycle is skipped outright; the temporal store is
                // only touched by cycles that produced a full result.
                match processor
                    .process_frame(&interview_id, analyzer.as_ref(), &[], DEFAULT_FRAME_DURATION_SECS)
                    .await
                {
                    Ok(outcome) if !outcome.events.is_empty() => {
                        log_info!(
                            "interview {interview_id}: {} event(s) accepted, score now {}",
                            outcome.events.len(),
                            outcome.integrity_score
                        );
                    }
                    Ok(_) => {}
                    Err(err) => {
                        log_error!("monitor cycle failed for interview {interview_id}: {err:?}");
                    }
                }
            }
            _ = cancel_token.cancelled() => {
                log_info!("monitor loop for interview {interview_id} shutting down");
                break;
            }
        }
    }
}
