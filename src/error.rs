// Error taxonomy for a lint run.
// Every variant is fatal: nothing here is retried or downgraded, the
// binary prints the message and exits non-zero.

use std::path::PathBuf;

/// Errors raised while resolving configuration or talking to Jenkins.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No Jenkins URL was supplied by any configuration layer.
    #[error("jenkins URL must be specified (--jenkins-url, JFLINT_JENKINSURL or `jenkinsUrl` in the config file)")]
    MissingJenkinsUrl,

    #[error("failed to read Jenkinsfile {}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),

    #[error("failed to fetch jenkins crumb")]
    CrumbTransport(#[source] reqwest::Error),

    /// The crumb issuer answered with something other than `name:value`.
    #[error("failed to parse jenkins crumb header from response {body:?}")]
    CrumbParse { body: String },

    #[error("failed to send Jenkinsfile for validation")]
    ValidateTransport(#[source] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
