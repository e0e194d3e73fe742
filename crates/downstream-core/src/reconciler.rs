//! Waiting on triggered builds.
//!
//! [`StatusReconciler`] polls every triggered build until each reports one of
//! the target statuses. A build that finishes outside the target set aborts
//! the wait immediately; builds still pending at the deadline fail it with a
//! timeout.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use crate::client::BuildClient;
use crate::dispatcher::TriggerRecord;
use crate::error::{DownstreamError, DownstreamResult};
use crate::model::BuildStatus;

/// Delay before the first poll so the server can register new builds.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(30);
/// Delay between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// State of one triggered build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconciliationOutcome {
    /// Still `pending` or `running`.
    Pending,
    /// Reached one of the target statuses.
    Satisfied,
    /// Reached any other status.
    Failed,
}

impl ReconciliationOutcome {
    /// Classify an observed API status against the target set.
    pub fn classify(raw: &str, target_statuses: &[BuildStatus]) -> Self {
        match raw.parse::<BuildStatus>() {
            Ok(status) if target_statuses.contains(&status) => Self::Satisfied,
            Ok(status) if !status.is_terminal() => Self::Pending,
            _ => Self::Failed,
        }
    }
}

pub struct StatusReconciler {
    client: Arc<dyn BuildClient>,
    grace_period: Duration,
    poll_interval: Duration,
}

impl StatusReconciler {
    pub fn new(client: Arc<dyn BuildClient>) -> Self {
        Self {
            client,
            grace_period: DEFAULT_GRACE_PERIOD,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_intervals(mut self, grace_period: Duration, poll_interval: Duration) -> Self {
        self.grace_period = grace_period;
        self.poll_interval = poll_interval;
        self
    }

    /// Block until every build in `triggers` reaches a status in
    /// `target_statuses`, or fail on the first other terminal status, the
    /// first API error, or `timeout`.
    pub async fn reconcile(
        &self,
        triggers: &TriggerRecord,
        target_statuses: &[BuildStatus],
        timeout: Duration,
    ) -> DownstreamResult<()> {
        if triggers.is_empty() {
            return Ok(());
        }

        info!(
            "Waiting on {} triggered builds (timeout {}s)",
            triggers.len(),
            timeout.as_secs()
        );
        sleep(self.grace_period).await;
        let deadline = Instant::now() + timeout;

        // Indexed like `triggers`; build numbers alone can repeat across repos.
        let mut satisfied = vec![false; triggers.len()];
        let mut poll: u32 = 0;

        loop {
            poll += 1;
            for (idx, trigger) in triggers.iter().enumerate() {
                if satisfied[idx] {
                    continue;
                }
                let repo = trigger.target.full_name();
                let build = self
                    .client
                    .get_build(trigger.target.org(), trigger.target.repo(), trigger.number)
                    .await
                    .map_err(|e| {
                        DownstreamError::transport(
                            format!("unable to get build {}/{}", repo, trigger.number),
                            e,
                        )
                    })?;
                debug!(
                    poll,
                    repo = %repo,
                    number = trigger.number,
                    status = %build.status,
                    "polled build"
                );

                match ReconciliationOutcome::classify(&build.status, target_statuses) {
                    ReconciliationOutcome::Satisfied => {
                        info!(
                            "Build {}/{} finished with status {}",
                            repo, trigger.number, build.status
                        );
                        satisfied[idx] = true;
                    }
                    ReconciliationOutcome::Pending => {}
                    ReconciliationOutcome::Failed => {
                        return Err(DownstreamError::BuildFailed {
                            repo,
                            number: trigger.number,
                            status: build.status,
                        });
                    }
                }
            }

            if satisfied.iter().all(|done| *done) {
                info!("All {} triggered builds reached a target status", triggers.len());
                return Ok(());
            }

            if Instant::now() >= deadline {
                let pending = triggers
                    .iter()
                    .zip(&satisfied)
                    .filter(|(_, done)| !**done)
                    .map(|(t, _)| format!("{}/{}", t.target.full_name(), t.number))
                    .collect();
                return Err(DownstreamError::Timeout {
                    timeout_secs: timeout.as_secs(),
                    pending,
                });
            }

            sleep(self.poll_interval).await;
        }
    }
}
