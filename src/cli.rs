// Command-line surface and orchestration.
// `run` is what the binary calls: resolve config, read the Jenkinsfile,
// fetch a crumb unless CSRF is disabled, validate, print.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{debug, warn};

use crate::api::{JenkinsClient, ValidationResult};
use crate::config::{Config, Settings};
use crate::error::Error;

pub const PROGRAM: &str = "jflint";

/// Lint a Declarative Jenkinsfile.
///
/// jflint does not lint the Jenkinsfile itself: it sends the file to
/// Jenkins' pipeline model converter, the same way the documented curl
/// approach does, and prints whatever Jenkins answers.
#[derive(Debug, Parser)]
#[command(name = PROGRAM)]
#[command(subcommand_negates_reqs = true, args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Jenkinsfile to validate.
    #[arg(value_name = "JENKINSFILE", required = true)]
    pub jenkinsfile: Option<PathBuf>,

    /// Config file (default is $HOME/.jflintrc).
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Username on Jenkins.
    #[arg(short, long)]
    pub username: Option<String>,

    /// Password or API token on Jenkins.
    #[arg(short, long)]
    pub password: Option<String>,

    /// Jenkins URL.
    #[arg(short, long = "jenkins-url", value_name = "URL")]
    pub jenkins_url: Option<String>,

    /// Set when the CSRF protection setting is disabled on Jenkins.
    #[arg(long)]
    pub csrf_disabled: bool,

    /// HTTP request timeout in seconds.
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print version info.
    Version,
}

impl Cli {
    /// The flag layer. An absent flag stays `None` so it never masks the
    /// environment or the config file.
    pub fn settings(&self) -> Settings {
        Settings {
            username: self.username.clone(),
            password: self.password.clone(),
            jenkins_url: self.jenkins_url.clone(),
            csrf_disabled: self.csrf_disabled.then_some(true),
            timeout: self.timeout,
        }
    }
}

/// `jflint <version>[-<commit>] <os>/<arch> BuildDate=<date>`.
///
/// Commit and build date are picked up from `JFLINT_GIT_COMMIT` and
/// `JFLINT_BUILD_DATE` at compile time.
pub fn version_string() -> String {
    format_version(
        env!("CARGO_PKG_VERSION"),
        option_env!("JFLINT_GIT_COMMIT"),
        option_env!("JFLINT_BUILD_DATE"),
    )
}

fn format_version(version: &str, commit: Option<&str>, build_date: Option<&str>) -> String {
    let mut version = version.to_string();
    if let Some(commit) = commit.filter(|c| !c.is_empty()) {
        version.push('-');
        version.push_str(commit);
    }
    let build_date = build_date.filter(|d| !d.is_empty()).unwrap_or("unknown");
    format!(
        "{PROGRAM} {version} {}/{} BuildDate={build_date}",
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

/// Validate the Jenkinsfile at `path` against the configured Jenkins.
///
/// The crumb is always fetched before the validate call unless CSRF is
/// disabled; if that fails nothing is sent for validation.
pub fn lint(config: &Config, path: &Path) -> Result<ValidationResult, Error> {
    let jenkinsfile = std::fs::read_to_string(path).map_err(|source| Error::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let client = JenkinsClient::new(
        &config.jenkins_url,
        config.credentials.clone(),
        config.timeout,
    )?;

    let crumb = if config.csrf_disabled {
        debug!("CSRF disabled, not requesting a crumb");
        None
    } else {
        Some(client.fetch_crumb()?)
    };

    client.validate(&jenkinsfile, crumb.as_ref())
}

/// Entry point for the binary once flags are parsed.
pub fn run(cli: Cli) -> Result<()> {
    if let Some(Command::Version) = cli.command {
        println!("{}", version_string());
        return Ok(());
    }

    let config = Config::load(cli.settings(), cli.config.as_deref())?;
    let Some(path) = cli.jenkinsfile.as_deref() else {
        anyhow::bail!("exactly one Jenkinsfile argument is required");
    };

    let result = lint(&config, path)?;
    if !result.status.is_success() {
        warn!(status = %result.status, "Jenkins answered with a non-success status");
    }
    println!("{}", result.body);
    Ok(())
}
