//! Vela Downstream Core
//!
//! Restarts the latest matching build in each downstream repository and,
//! optionally, waits for the restarted builds to finish.
//!
//! - [`target`]: `org/repo[@branch]` descriptors
//! - [`locator::BuildLocator`]: bounded newest-first history search
//! - [`dispatcher::RestartDispatcher`]: single-shot restarts
//! - [`reconciler::StatusReconciler`]: polling with a deadline
//! - [`orchestrator::Orchestrator`]: sequences the above per run
//!
//! Restarts are not idempotent and are never retried; a failure part-way
//! through a run leaves earlier restarts running.

pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod fakes;
pub mod locator;
pub mod model;
pub mod orchestrator;
pub mod reconciler;
pub mod target;
pub mod telemetry;
pub mod vela;

pub use client::{BuildClient, BuildPage, ListOptions};
pub use config::{
    parse_timeout, BuildConfig, BuildSettings, PluginConfig, RepoConfig, ServerConfig,
    ValidatedConfig,
};
pub use dispatcher::{RestartDispatcher, Trigger, TriggerRecord};
pub use error::{ClientError, ClientResult, DownstreamError, DownstreamResult};
pub use locator::BuildLocator;
pub use model::{BuildEvent, BuildStatus, BuildSummary, LocatedBuild, MatchCriteria, StatusFilter};
pub use orchestrator::{Orchestrator, ReportConfig};
pub use reconciler::{ReconciliationOutcome, StatusReconciler};
pub use target::{parse_targets, Target};
pub use telemetry::{init_tracing, parse_log_level};
pub use vela::{VelaClient, VelaConfig};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
