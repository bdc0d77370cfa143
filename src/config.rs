// Layered configuration.
// Settings come from command-line flags, `JFLINT_*` environment variables
// and a JSON file (`~/.jflintrc` by default), highest precedence first.
// Each layer is a `Settings` with optional fields; they are merged once at
// startup into a `Config` that is passed to the rest of the program.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::api::Credentials;
use crate::error::{Error, Result};

/// Prefix for environment variables, e.g. `JFLINT_USERNAME`.
pub const ENV_PREFIX: &str = "JFLINT_";

/// File name looked up in the home directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = ".jflintrc";

/// One configuration layer. `None` means "not set here, ask the next layer".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub username: Option<String>,
    pub password: Option<String>,
    pub jenkins_url: Option<String>,
    pub csrf_disabled: Option<bool>,
    /// Request timeout in seconds.
    pub timeout: Option<u64>,
}

impl Settings {
    /// Read the layer from environment variables through `lookup`.
    ///
    /// Empty values count as unset. Values that don't parse are skipped
    /// with a warning.
    pub fn from_env<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(&format!("{ENV_PREFIX}{key}")).filter(|value| !value.is_empty())
        };

        let csrf_disabled = var("CSRFDISABLED").and_then(|raw| {
            let parsed = parse_bool(&raw);
            if parsed.is_none() {
                warn!(value = %raw, "ignoring {ENV_PREFIX}CSRFDISABLED, expected a boolean");
            }
            parsed
        });
        let timeout = var("TIMEOUT").and_then(|raw| match raw.parse() {
            Ok(secs) => Some(secs),
            Err(_) => {
                warn!(value = %raw, "ignoring {ENV_PREFIX}TIMEOUT, expected whole seconds");
                None
            }
        });

        Self {
            username: var("USERNAME"),
            password: var("PASSWORD"),
            jenkins_url: var("JENKINSURL"),
            csrf_disabled,
            timeout,
        }
    }

    /// Fill every unset field from `lower`.
    pub fn or(self, lower: Settings) -> Settings {
        Settings {
            username: self.username.or(lower.username),
            password: self.password.or(lower.password),
            jenkins_url: self.jenkins_url.or(lower.jenkins_url),
            csrf_disabled: self.csrf_disabled.or(lower.csrf_disabled),
            timeout: self.timeout.or(lower.timeout),
        }
    }
}

/// Boolean spellings accepted from the environment.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// `~/.jflintrc`, if a home directory can be found.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(DEFAULT_CONFIG_FILE))
}

/// Load the file layer.
///
/// A missing file yields empty settings. A file that exists but can't be
/// read or parsed is skipped with a warning rather than aborting the run.
pub fn load_file(path: &Path) -> Settings {
    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no config file");
            return Settings::default();
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "skipping unreadable config file");
            return Settings::default();
        }
    };

    match serde_json::from_str(&data) {
        Ok(settings) => {
            info!("Using config file: {}", path.display());
            settings
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "skipping malformed config file");
            Settings::default()
        }
    }
}

/// Fully resolved configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub jenkins_url: String,
    pub credentials: Option<Credentials>,
    pub csrf_disabled: bool,
    pub timeout: Option<Duration>,
}

impl Config {
    /// Merge layers (`flags` > `env` > `file` > defaults) and check that a
    /// Jenkins URL is present.
    pub fn resolve(flags: Settings, env: Settings, file: Settings) -> Result<Self> {
        let merged = flags.or(env).or(file);

        let jenkins_url = merged
            .jenkins_url
            .filter(|url| !url.trim().is_empty())
            .ok_or(Error::MissingJenkinsUrl)?;

        Ok(Self {
            jenkins_url,
            credentials: Credentials::from_parts(
                merged.username.unwrap_or_default(),
                merged.password.unwrap_or_default(),
            ),
            csrf_disabled: merged.csrf_disabled.unwrap_or(false),
            timeout: merged.timeout.map(Duration::from_secs),
        })
    }

    /// Resolve against the real process environment and config file.
    /// `config_path` overrides the default `~/.jflintrc`.
    pub fn load(flags: Settings, config_path: Option<&Path>) -> Result<Self> {
        let file = match config_path.map(Path::to_path_buf).or_else(default_config_path) {
            Some(path) => load_file(&path),
            None => Settings::default(),
        };
        let env = Settings::from_env(|key| std::env::var(key).ok());
        Self::resolve(flags, env, file)
    }
}
