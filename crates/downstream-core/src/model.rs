//! Build model: events, statuses, match criteria and API build records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Event that produced a build.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildEvent {
    Comment,
    Deployment,
    PullRequest,
    Push,
    Schedule,
    Tag,
}

impl BuildEvent {
    pub const ALL: [BuildEvent; 6] = [
        BuildEvent::Comment,
        BuildEvent::Deployment,
        BuildEvent::PullRequest,
        BuildEvent::Push,
        BuildEvent::Schedule,
        BuildEvent::Tag,
    ];

    /// Wire value used by the Vela API.
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildEvent::Comment => "comment",
            BuildEvent::Deployment => "deployment",
            BuildEvent::PullRequest => "pull_request",
            BuildEvent::Push => "push",
            BuildEvent::Schedule => "schedule",
            BuildEvent::Tag => "tag",
        }
    }
}

impl fmt::Display for BuildEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildEvent {
    type Err = String;

    /// Case-insensitive; accepts `deploy` and `pull-request` spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "comment" => Ok(BuildEvent::Comment),
            "deploy" | "deployment" => Ok(BuildEvent::Deployment),
            "pull_request" | "pull-request" | "pull" => Ok(BuildEvent::PullRequest),
            "push" => Ok(BuildEvent::Push),
            "schedule" => Ok(BuildEvent::Schedule),
            "tag" => Ok(BuildEvent::Tag),
            other => Err(format!("invalid build event provided: {other}")),
        }
    }
}

/// Status of a build as reported by the API.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStatus {
    Canceled,
    Error,
    Failure,
    Killed,
    Pending,
    Running,
    Success,
}

impl BuildStatus {
    pub const ALL: [BuildStatus; 7] = [
        BuildStatus::Canceled,
        BuildStatus::Error,
        BuildStatus::Failure,
        BuildStatus::Killed,
        BuildStatus::Pending,
        BuildStatus::Running,
        BuildStatus::Success,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BuildStatus::Canceled => "canceled",
            BuildStatus::Error => "error",
            BuildStatus::Failure => "failure",
            BuildStatus::Killed => "killed",
            BuildStatus::Pending => "pending",
            BuildStatus::Running => "running",
            BuildStatus::Success => "success",
        }
    }

    /// Anything other than `pending` and `running`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, BuildStatus::Pending | BuildStatus::Running)
    }
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        BuildStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("invalid build status provided: {wanted}"))
    }
}

/// Sentinel accepted in the status list to disable status filtering.
pub const ANY_STATUS: &str = "any";

/// Set of statuses a located build may have.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    Any,
    Only(Vec<BuildStatus>),
}

impl StatusFilter {
    /// Parse a raw status list. `any` anywhere in the list wins.
    pub fn parse<S: AsRef<str>>(raw: &[S]) -> Result<Self, String> {
        if raw.is_empty() {
            return Err("no build status provided".to_string());
        }
        if raw.iter().any(|s| s.as_ref().trim().eq_ignore_ascii_case(ANY_STATUS)) {
            return Ok(StatusFilter::Any);
        }
        let statuses = raw
            .iter()
            .map(|s| s.as_ref().parse::<BuildStatus>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(StatusFilter::Only(statuses))
    }

    /// `raw` is the API's status string; unknown values never match a set.
    pub fn matches(&self, raw: &str) -> bool {
        match self {
            StatusFilter::Any => true,
            StatusFilter::Only(statuses) => raw
                .parse::<BuildStatus>()
                .map(|status| statuses.contains(&status))
                .unwrap_or(false),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::Any => f.write_str(ANY_STATUS),
            StatusFilter::Only(statuses) => {
                let names: Vec<&str> = statuses.iter().map(BuildStatus::as_str).collect();
                f.write_str(&names.join("|"))
            }
        }
    }
}

/// Predicate applied while scanning build history.
///
/// The branch to match comes from the [`crate::target::Target`] being scanned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchCriteria {
    /// `None` disables event filtering.
    pub event: Option<BuildEvent>,
    pub statuses: StatusFilter,
}

impl MatchCriteria {
    pub fn new(event: BuildEvent, statuses: StatusFilter) -> Self {
        Self {
            event: Some(event),
            statuses,
        }
    }

    /// Whether `build` on `branch` satisfies every criterion.
    pub fn accepts(&self, branch: &str, build: &BuildSummary) -> bool {
        if build.branch != branch {
            return false;
        }
        if let Some(event) = self.event {
            if !build.event.eq_ignore_ascii_case(event.as_str()) {
                return false;
            }
        }
        self.statuses.matches(&build.status)
    }
}

/// Build fields consumed from the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSummary {
    #[serde(default)]
    pub number: u64,
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub status: String,
}

impl BuildSummary {
    pub fn parsed_status(&self) -> Option<BuildStatus> {
        self.status.parse().ok()
    }
}

/// Result of a successful locate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocatedBuild {
    /// Never zero; zero is the API's "no build" value.
    pub number: u64,
    pub status: Option<BuildStatus>,
}
