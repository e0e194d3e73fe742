//! Downstream orchestrator: locate, restart, then optionally wait.
//!
//! Targets are processed one at a time in descriptor order and each is
//! restarted at most once per run. Restarts already issued stay triggered
//! when a later target aborts the run.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::client::BuildClient;
use crate::config::BuildSettings;
use crate::dispatcher::{RestartDispatcher, TriggerRecord};
use crate::error::DownstreamResult;
use crate::locator::BuildLocator;
use crate::model::{BuildStatus, MatchCriteria};
use crate::reconciler::StatusReconciler;
use crate::target::Target;

/// Whether and how to wait on triggered builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportConfig {
    pub enabled: bool,
    pub target_statuses: Vec<BuildStatus>,
    pub timeout: Duration,
}

/// Runs one downstream fan-out.
pub struct Orchestrator {
    locator: BuildLocator,
    dispatcher: RestartDispatcher,
    reconciler: StatusReconciler,
    criteria: MatchCriteria,
    report: ReportConfig,
    continue_on_not_found: bool,
}

impl Orchestrator {
    pub fn new(client: Arc<dyn BuildClient>, settings: &BuildSettings) -> Self {
        Self {
            locator: BuildLocator::new(Arc::clone(&client)),
            dispatcher: RestartDispatcher::new(Arc::clone(&client)),
            reconciler: StatusReconciler::new(client),
            criteria: settings.criteria.clone(),
            report: settings.report.clone(),
            continue_on_not_found: settings.continue_on_not_found,
        }
    }

    pub fn with_locator(mut self, locator: BuildLocator) -> Self {
        self.locator = locator;
        self
    }

    pub fn with_reconciler(mut self, reconciler: StatusReconciler) -> Self {
        self.reconciler = reconciler;
        self
    }

    /// Restart the latest matching build of every target and, when reporting
    /// is enabled, wait for the new builds. Returns what was triggered.
    pub async fn run(&self, targets: &[Target]) -> DownstreamResult<TriggerRecord> {
        let mut triggers = TriggerRecord::new();

        for target in targets {
            if let Some(number) = triggers.get(target) {
                warn!("{target} listed more than once; already triggered build {number}");
                continue;
            }

            let located = match self.locator.locate(target, &self.criteria).await {
                Ok(located) => located,
                Err(e) if e.is_not_found() && self.continue_on_not_found => {
                    warn!("{e}; continuing with the next repo");
                    continue;
                }
                Err(e) => return Err(e),
            };

            let number = self.dispatcher.restart(target, located.number).await?;
            triggers.record(target.clone(), number);
        }

        if !self.report.enabled {
            info!("Triggered {} builds; reporting disabled", triggers.len());
            return Ok(triggers);
        }
        if triggers.is_empty() {
            info!("No builds triggered; nothing to wait on");
            return Ok(triggers);
        }

        self.reconciler
            .reconcile(&triggers, &self.report.target_statuses, self.report.timeout)
            .await?;
        Ok(triggers)
    }
}
