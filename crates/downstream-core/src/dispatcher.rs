//! Restart of located builds and the record of what was triggered.
//!
//! A restart creates a new build on the server and is not idempotent, so
//! [`RestartDispatcher::restart`] sends exactly one request and never retries.

use std::sync::Arc;

use tracing::info;

use crate::client::BuildClient;
use crate::error::{ClientError, DownstreamError, DownstreamResult};
use crate::target::Target;

/// A build created by restarting a target's located build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    pub target: Target,
    pub number: u64,
}

/// Builds triggered during one run, keyed by target, in trigger order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerRecord {
    triggers: Vec<Trigger>,
}

impl TriggerRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `number` for `target`, replacing any earlier entry.
    pub fn record(&mut self, target: Target, number: u64) {
        match self.triggers.iter_mut().find(|t| t.target == target) {
            Some(existing) => existing.number = number,
            None => self.triggers.push(Trigger { target, number }),
        }
    }

    pub fn get(&self, target: &Target) -> Option<u64> {
        self.triggers
            .iter()
            .find(|t| &t.target == target)
            .map(|t| t.number)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Trigger> {
        self.triggers.iter()
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }
}

pub struct RestartDispatcher {
    client: Arc<dyn BuildClient>,
}

impl RestartDispatcher {
    pub fn new(client: Arc<dyn BuildClient>) -> Self {
        Self { client }
    }

    /// Restart `target`'s build `number`, returning the new build's number.
    pub async fn restart(&self, target: &Target, number: u64) -> DownstreamResult<u64> {
        let context = || format!("unable to restart build {}/{}", target.full_name(), number);

        info!("Restarting build {}/{}", target.full_name(), number);

        let created = self
            .client
            .restart_build(target.org(), target.repo(), number)
            .await
            .map_err(|e| DownstreamError::transport(context(), e))?;

        if created.number == 0 {
            return Err(DownstreamError::transport(
                context(),
                ClientError::Decode("restart response carried no build number".to_string()),
            ));
        }

        info!("New build created {}/{}", target.full_name(), created.number);
        Ok(created.number)
    }
}
