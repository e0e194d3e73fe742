//! Injectable CI-platform client.
//!
//! Implement [`BuildClient`] to plug in the real Vela API
//! ([`crate::vela::VelaClient`]) or an in-memory stub
//! ([`crate::fakes::ScriptedClient`]).

use async_trait::async_trait;

use crate::error::ClientResult;
use crate::model::{BuildEvent, BuildSummary};

/// Query options for listing a repository's builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions {
    pub branch: Option<String>,
    pub event: Option<BuildEvent>,
    /// 1-based.
    pub page: u32,
    pub per_page: u32,
}

impl ListOptions {
    pub fn first_page(per_page: u32) -> Self {
        Self {
            branch: None,
            event: None,
            page: 1,
            per_page,
        }
    }
}

/// One page of build history, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildPage {
    pub builds: Vec<BuildSummary>,
    /// Zero when there are no more pages.
    pub next_page: u32,
}

#[async_trait]
pub trait BuildClient: Send + Sync {
    /// List builds for `org/repo`, newest first.
    async fn list_builds(
        &self,
        org: &str,
        repo: &str,
        opts: &ListOptions,
    ) -> ClientResult<BuildPage>;

    /// Fetch a single build.
    async fn get_build(&self, org: &str, repo: &str, number: u64) -> ClientResult<BuildSummary>;

    /// Restart a build, returning the newly created build.
    async fn restart_build(
        &self,
        org: &str,
        repo: &str,
        number: u64,
    ) -> ClientResult<BuildSummary>;
}
