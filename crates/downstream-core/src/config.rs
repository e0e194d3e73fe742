//! Plugin configuration and its validation.
//!
//! Raw values arrive as strings from flags or the environment. Validation
//! happens once, before any request is made, and yields typed settings.

use std::time::Duration;

use reqwest::Url;
use tracing::{debug, info, trace};

use crate::error::{DownstreamError, DownstreamResult};
use crate::model::{BuildEvent, BuildStatus, MatchCriteria, StatusFilter};
use crate::orchestrator::ReportConfig;
use crate::target::{parse_targets, Target};
use crate::vela::VelaConfig;

pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_EVENT: &str = "push";
pub const DEFAULT_STATUS: &str = "success";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30 * 60);
pub const MAX_TIMEOUT: Duration = Duration::from_secs(90 * 60);

fn invalid(msg: impl Into<String>) -> DownstreamError {
    DownstreamError::ConfigValidation(msg.into())
}

/// Vela server connection.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    pub server: String,
    pub token: String,
}

impl ServerConfig {
    pub fn validate(&self) -> DownstreamResult<VelaConfig> {
        trace!("validating config configuration");

        if self.server.is_empty() {
            return Err(invalid("no config server provided"));
        }
        let url = Url::parse(&self.server)
            .map_err(|e| invalid(format!("invalid config server provided: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!(
                "invalid config server provided: {}",
                self.server
            )));
        }
        if self.token.is_empty() {
            return Err(invalid("no config token provided"));
        }

        Ok(VelaConfig::new(&self.server, &self.token))
    }
}

/// Build selection and reporting options, as bound from flags.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Default branch for descriptors without `@branch`.
    pub branch: String,
    pub event: String,
    pub statuses: Vec<String>,
    pub report: bool,
    pub target_statuses: Vec<String>,
    pub timeout: Duration,
    pub continue_on_not_found: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            branch: DEFAULT_BRANCH.to_string(),
            event: DEFAULT_EVENT.to_string(),
            statuses: vec![DEFAULT_STATUS.to_string()],
            report: false,
            target_statuses: vec![DEFAULT_STATUS.to_string()],
            timeout: DEFAULT_TIMEOUT,
            continue_on_not_found: false,
        }
    }
}

/// Validated [`BuildConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSettings {
    pub default_branch: String,
    pub criteria: MatchCriteria,
    pub report: ReportConfig,
    pub continue_on_not_found: bool,
}

impl BuildConfig {
    pub fn validate(&self) -> DownstreamResult<BuildSettings> {
        trace!("validating build configuration");

        let default_branch = if self.branch.is_empty() {
            debug!("no build branch provided for filtering; using {DEFAULT_BRANCH}");
            DEFAULT_BRANCH.to_string()
        } else {
            self.branch.clone()
        };

        if self.event.is_empty() {
            return Err(invalid("no build event provided"));
        }
        let event: BuildEvent = self.event.parse().map_err(invalid)?;
        let statuses = StatusFilter::parse(&self.statuses).map_err(invalid)?;

        if self.target_statuses.is_empty() {
            return Err(invalid("no target status provided"));
        }
        let target_statuses = self
            .target_statuses
            .iter()
            .map(|s| s.parse::<BuildStatus>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(invalid)?;

        if self.timeout.is_zero() {
            return Err(invalid("timeout must be greater than zero"));
        }
        let timeout = if self.timeout > MAX_TIMEOUT {
            info!("timeout set too high. Using 90 minutes...");
            MAX_TIMEOUT
        } else {
            self.timeout
        };

        Ok(BuildSettings {
            default_branch,
            criteria: MatchCriteria::new(event, statuses),
            report: ReportConfig {
                enabled: self.report,
                target_statuses,
                timeout,
            },
            continue_on_not_found: self.continue_on_not_found,
        })
    }
}

/// Downstream repositories.
#[derive(Debug, Clone, Default)]
pub struct RepoConfig {
    /// `org/repo` or `org/repo@branch` descriptors.
    pub names: Vec<String>,
}

impl RepoConfig {
    pub fn validate(&self) -> DownstreamResult<()> {
        trace!("validating repo configuration");

        if self.names.is_empty() {
            return Err(invalid("no repo names provided"));
        }
        for name in &self.names {
            if name.matches('/').count() != 1 {
                return Err(invalid(format!("invalid <org>/<repo> name provided: {name}")));
            }
        }
        Ok(())
    }
}

/// Everything the plugin is configured with.
#[derive(Debug, Clone, Default)]
pub struct PluginConfig {
    pub server: ServerConfig,
    pub build: BuildConfig,
    pub repos: RepoConfig,
}

/// Output of [`PluginConfig::validate`].
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub vela: VelaConfig,
    pub settings: BuildSettings,
    pub targets: Vec<Target>,
}

impl PluginConfig {
    pub fn validate(&self) -> DownstreamResult<ValidatedConfig> {
        debug!("validating plugin configuration");

        let vela = self.server.validate()?;
        let settings = self.build.validate()?;
        self.repos.validate()?;
        let targets = parse_targets(&self.repos.names, &settings.default_branch)?;

        Ok(ValidatedConfig {
            vela,
            settings,
            targets,
        })
    }
}

/// Parse `90s`, `30m`, `1h`; a bare number is minutes.
pub fn parse_timeout(raw: &str) -> Result<Duration, String> {
    let raw = raw.trim();
    let (digits, unit_secs) = match raw.char_indices().last() {
        Some((idx, 's')) => (&raw[..idx], 1),
        Some((idx, 'm')) => (&raw[..idx], 60),
        Some((idx, 'h')) => (&raw[..idx], 60 * 60),
        Some(_) => (raw, 60),
        None => return Err("empty timeout".to_string()),
    };
    let value: u64 = digits
        .trim()
        .parse()
        .map_err(|_| format!("invalid timeout: {raw}"))?;
    let secs = value
        .checked_mul(unit_secs)
        .ok_or_else(|| format!("invalid timeout: {raw}"))?;
    Ok(Duration::from_secs(secs))
}
