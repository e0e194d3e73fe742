//! In-memory fake for the build client (testing only)
//!
//! [`ScriptedClient`] serves seeded build history, numbers restarts
//! sequentially and replays scripted status sequences, without any network.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::client::{BuildClient, BuildPage, ListOptions};
use crate::error::{ClientError, ClientResult};
use crate::model::BuildSummary;

/// Shorthand for a [`BuildSummary`].
pub fn build(number: u64, branch: &str, event: &str, status: &str) -> BuildSummary {
    BuildSummary {
        number,
        branch: branch.to_string(),
        event: event.to_string(),
        status: status.to_string(),
    }
}

fn repo_key(org: &str, repo: &str) -> String {
    format!("{org}/{repo}")
}

fn unavailable() -> ClientError {
    ClientError::Status {
        status: 503,
        body: "service unavailable".to_string(),
    }
}

#[derive(Debug, Default)]
struct State {
    /// Newest first, per `org/repo`.
    history: HashMap<String, Vec<BuildSummary>>,
    /// Status replies per build; the last entry repeats.
    scripts: HashMap<(String, u64), VecDeque<String>>,
    fail_list: HashSet<String>,
    fail_restart: HashSet<String>,
    fail_get: HashSet<(String, u64)>,
    list_calls: Vec<(String, ListOptions)>,
    get_calls: Vec<(String, u64)>,
    restarts: Vec<(String, u64)>,
}

/// Scripted in-memory [`BuildClient`].
///
/// Listing ignores the branch/event filters and pages raw history so callers
/// must do their own matching.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    state: Mutex<State>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `builds` (newest first) to the history of `full_name`.
    pub fn add_builds(&self, full_name: &str, builds: Vec<BuildSummary>) {
        let mut state = self.state.lock().unwrap();
        state
            .history
            .entry(full_name.to_string())
            .or_default()
            .extend(builds);
    }

    /// Replies for successive `get_build` calls on `full_name/number`.
    pub fn script_statuses(&self, full_name: &str, number: u64, statuses: &[&str]) {
        let mut state = self.state.lock().unwrap();
        state.scripts.insert(
            (full_name.to_string(), number),
            statuses.iter().map(|s| s.to_string()).collect(),
        );
    }

    pub fn fail_list(&self, full_name: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_list
            .insert(full_name.to_string());
    }

    pub fn fail_restart(&self, full_name: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_restart
            .insert(full_name.to_string());
    }

    pub fn fail_get(&self, full_name: &str, number: u64) {
        self.state
            .lock()
            .unwrap()
            .fail_get
            .insert((full_name.to_string(), number));
    }

    /// `(full_name, options)` for every list call, in order.
    pub fn list_calls(&self) -> Vec<(String, ListOptions)> {
        self.state.lock().unwrap().list_calls.clone()
    }

    /// `(full_name, number)` for every get call, in order.
    pub fn get_calls(&self) -> Vec<(String, u64)> {
        self.state.lock().unwrap().get_calls.clone()
    }

    /// `(full_name, source build number)` for every restart, in order.
    pub fn restarts(&self) -> Vec<(String, u64)> {
        self.state.lock().unwrap().restarts.clone()
    }
}

#[async_trait]
impl BuildClient for ScriptedClient {
    async fn list_builds(
        &self,
        org: &str,
        repo: &str,
        opts: &ListOptions,
    ) -> ClientResult<BuildPage> {
        let key = repo_key(org, repo);
        let mut state = self.state.lock().unwrap();
        state.list_calls.push((key.clone(), opts.clone()));
        if state.fail_list.contains(&key) {
            return Err(unavailable());
        }

        let history = state.history.get(&key).cloned().unwrap_or_default();
        let per_page = opts.per_page.max(1) as usize;
        let start = (opts.page.max(1) as usize - 1) * per_page;
        let builds: Vec<BuildSummary> =
            history.iter().skip(start).take(per_page).cloned().collect();
        let next_page = if start + per_page < history.len() {
            opts.page + 1
        } else {
            0
        };
        Ok(BuildPage { builds, next_page })
    }

    async fn get_build(&self, org: &str, repo: &str, number: u64) -> ClientResult<BuildSummary> {
        let key = repo_key(org, repo);
        let mut state = self.state.lock().unwrap();
        state.get_calls.push((key.clone(), number));
        if state.fail_get.contains(&(key.clone(), number)) {
            return Err(unavailable());
        }

        let mut found = state
            .history
            .get(&key)
            .and_then(|builds| builds.iter().find(|b| b.number == number))
            .cloned()
            .ok_or_else(|| ClientError::Status {
                status: 404,
                body: format!("build {key}/{number} not found"),
            })?;

        if let Some(script) = state.scripts.get_mut(&(key, number)) {
            let status = if script.len() > 1 {
                script.pop_front()
            } else {
                script.front().cloned()
            };
            if let Some(status) = status {
                found.status = status;
            }
        }
        Ok(found)
    }

    async fn restart_build(
        &self,
        org: &str,
        repo: &str,
        number: u64,
    ) -> ClientResult<BuildSummary> {
        let key = repo_key(org, repo);
        let mut state = self.state.lock().unwrap();
        state.restarts.push((key.clone(), number));
        if state.fail_restart.contains(&key) {
            return Err(unavailable());
        }

        let history = state.history.entry(key.clone()).or_default();
        let source = history
            .iter()
            .find(|b| b.number == number)
            .cloned()
            .ok_or_else(|| ClientError::Status {
                status: 404,
                body: format!("build {key}/{number} not found"),
            })?;
        let next = history.iter().map(|b| b.number).max().unwrap_or(0) + 1;
        let created = BuildSummary {
            number: next,
            status: "pending".to_string(),
            ..source
        };
        history.insert(0, created.clone());
        Ok(created)
    }
}
