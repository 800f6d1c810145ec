//! Bounded poll driver for submit/poll/fetch style remote jobs.
//!
//! ```text
//!   submit ──ok──► Running ──poll──► Succeeded ──fetch──► done
//!     │               │  ▲      ├──► Failed
//!    err              │  │      └──► Cancelled
//!     ▼               ▼  │
//!  propagate     deadline? ──no──► wait(interval)
//!                     │
//!                    yes ──► TimedOut (job id returned)
//! ```
//!
//! The wait is the only suspension point. It is cut short by the deadline
//! but not by anything else. There are no retries: a failing submit, poll or
//! fetch step propagates its error immediately.

use crate::types::{JobId, PollConfig, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// State of one driver invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PollState {
    Running,
    Succeeded,
    Failed,
    Cancelled,
    TimedOut,
}

impl PollState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, PollState::Running)
    }
}

/// Status reported by one remote poll step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteStatus {
    Running,
    Succeeded,
    Failed { reason: Option<String> },
    Cancelled { reason: Option<String> },
}

/// A remote job driven by [`run_to_completion`].
#[async_trait]
pub trait RemoteJob: Send {
    type Output: Send;

    /// Start the job and return its identifier.
    async fn submit(&mut self) -> Result<JobId>;

    /// Report the job's current status.
    async fn poll(&mut self, job_id: &JobId) -> Result<RemoteStatus>;

    /// Retrieve final results. Called exactly once, after `Succeeded`.
    async fn fetch(&mut self, job_id: &JobId) -> Result<Self::Output>;
}

/// Terminal outcome of a driver invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome<T> {
    Succeeded { job_id: JobId, output: T },
    Failed { job_id: JobId, reason: Option<String> },
    Cancelled { job_id: JobId, reason: Option<String> },
    /// Deadline reached while the job was still running. The job keeps
    /// running remotely and can be inspected through `job_id`.
    TimedOut { job_id: JobId, elapsed: Duration },
}

impl<T> PollOutcome<T> {
    pub fn state(&self) -> PollState {
        match self {
            PollOutcome::Succeeded { .. } => PollState::Succeeded,
            PollOutcome::Failed { .. } => PollState::Failed,
            PollOutcome::Cancelled { .. } => PollState::Cancelled,
            PollOutcome::TimedOut { .. } => PollState::TimedOut,
        }
    }

    pub fn job_id(&self) -> &JobId {
        match self {
            PollOutcome::Succeeded { job_id, .. }
            | PollOutcome::Failed { job_id, .. }
            | PollOutcome::Cancelled { job_id, .. }
            | PollOutcome::TimedOut { job_id, .. } => job_id,
        }
    }
}

/// Longest span added to an `Instant`; larger configured durations saturate here.
const MAX_SPAN: Duration = Duration::from_secs(30 * 365 * 24 * 60 * 60);

fn offset(base: Instant, span: Duration) -> Instant {
    base.checked_add(span.min(MAX_SPAN)).unwrap_or(base)
}

/// Submit `job`, poll until a terminal status or the deadline, fetch on success.
pub async fn run_to_completion<J: RemoteJob>(
    job: &mut J,
    config: PollConfig,
) -> Result<PollOutcome<J::Output>> {
    let job_id = job.submit().await?;
    let started = Instant::now();
    let deadline_at = offset(started, config.deadline);
    let mut polls: u32 = 0;
    tracing::debug!(%job_id, deadline_ms = config.deadline.as_millis() as u64, "Job submitted");

    loop {
        polls += 1;
        match job.poll(&job_id).await? {
            RemoteStatus::Succeeded => {
                tracing::debug!(%job_id, polls, "Job succeeded");
                let output = job.fetch(&job_id).await?;
                return Ok(PollOutcome::Succeeded { job_id, output });
            }
            RemoteStatus::Failed { reason } => {
                tracing::warn!(%job_id, polls, ?reason, "Job failed");
                return Ok(PollOutcome::Failed { job_id, reason });
            }
            RemoteStatus::Cancelled { reason } => {
                tracing::warn!(%job_id, polls, ?reason, "Job cancelled");
                return Ok(PollOutcome::Cancelled { job_id, reason });
            }
            RemoteStatus::Running => {}
        }

        let elapsed = started.elapsed();
        if elapsed >= config.deadline {
            tracing::warn!(%job_id, polls, elapsed_ms = elapsed.as_millis() as u64, "Job still running at deadline");
            return Ok(PollOutcome::TimedOut { job_id, elapsed });
        }

        let wake_at = offset(Instant::now(), config.interval).min(deadline_at);
        tokio::time::sleep_until(wake_at).await;
    }
}

// =============================================================================
// Tests
// =============================================================================
