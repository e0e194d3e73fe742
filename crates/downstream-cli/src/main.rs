//! Vela Downstream - plugin for triggering builds in other repos
//!
//! The `vela-downstream` binary restarts the latest matching build of each
//! configured repository and can wait for the restarted builds to finish.
//! Every flag can also be supplied through its `PARAMETER_*` environment
//! variable, and a `.env` file in the working directory is loaded first.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use downstream_core::{
    init_tracing, parse_log_level, parse_timeout, BuildConfig, Orchestrator, PluginConfig,
    RepoConfig, ServerConfig, VelaClient,
};

#[derive(Parser, Debug)]
#[command(name = "vela-downstream")]
#[command(author = "Vela Admins")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Vela Downstream plugin for triggering builds in other repos", long_about = None)]
struct Cli {
    /// Log level: trace, debug, info, warn, error, fatal or panic
    #[arg(long, env = "PARAMETER_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Emit JSON-formatted log lines
    #[arg(long, env = "PARAMETER_JSON")]
    json: bool,

    /// Vela server to authenticate with
    #[arg(long, env = "PARAMETER_SERVER", default_value = "")]
    server: String,

    /// User token to authenticate with the Vela server
    #[arg(long, env = "PARAMETER_TOKEN", default_value = "", hide_env_values = true)]
    token: String,

    /// Default branch for repos given without `@branch`
    #[arg(long, env = "PARAMETER_BRANCH", default_value = "main")]
    branch: String,

    /// Event of the build to restart
    #[arg(long, env = "PARAMETER_EVENT", default_value = "push")]
    event: String,

    /// Acceptable statuses of the build to restart, or `any`
    #[arg(long, env = "PARAMETER_STATUS", value_delimiter = ',', default_value = "success")]
    status: Vec<String>,

    /// Wait for the restarted builds and fail unless they reach a target status
    #[arg(long, env = "PARAMETER_REPORT")]
    report: bool,

    /// Statuses that count as success when reporting
    #[arg(long, env = "PARAMETER_TARGET_STATUS", value_delimiter = ',', default_value = "success")]
    target_status: Vec<String>,

    /// How long to wait when reporting (`90s`, `30m`, `1h`; bare numbers are minutes)
    #[arg(long, env = "PARAMETER_TIMEOUT", default_value = "30m", value_parser = parse_timeout)]
    timeout: Duration,

    /// Skip repos without a matching build instead of failing
    #[arg(long = "continue", env = "PARAMETER_CONTINUE")]
    continue_on_not_found: bool,

    /// `<org>/<repo>` or `<org>/<repo>@<branch>` names to trigger
    #[arg(long, env = "PARAMETER_REPOS", value_delimiter = ',')]
    repos: Vec<String>,
}

impl Cli {
    fn plugin_config(&self) -> PluginConfig {
        PluginConfig {
            server: ServerConfig {
                server: self.server.clone(),
                token: self.token.clone(),
            },
            build: BuildConfig {
                branch: self.branch.clone(),
                event: self.event.clone(),
                statuses: self.status.clone(),
                report: self.report,
                target_statuses: self.target_status.clone(),
                timeout: self.timeout,
                continue_on_not_found: self.continue_on_not_found,
            },
            repos: RepoConfig {
                names: self.repos.clone(),
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.json, parse_log_level(&cli.log_level));

    info!(
        code = "https://github.com/go-vela/vela-downstream",
        docs = "https://go-vela.github.io/docs/plugins/registry/downstream",
        registry = "https://hub.docker.com/r/target/vela-downstream",
        version = downstream_core::VERSION,
        "Vela Downstream Plugin"
    );

    let validated = cli
        .plugin_config()
        .validate()
        .context("Failed to validate plugin configuration")?;

    let client = VelaClient::new(validated.vela.clone())
        .context("Failed to create Vela client")?;

    let triggers = Orchestrator::new(Arc::new(client), &validated.settings)
        .run(&validated.targets)
        .await?;

    info!("Downstream run finished; {} builds triggered", triggers.len());
    Ok(())
}
