// Jenkins API client: the two-step exchange behind a lint run.
// 1. GET the crumb issuer for a CSRF token (skipped when CSRF is disabled).
// 2. POST the Jenkinsfile, form-encoded, to the pipeline model converter.
// Both calls are blocking and share one reqwest client and the same
// optional Basic Auth credentials.

use std::fmt;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::StatusCode;
use tracing::debug;

use crate::error::{Error, Result};

/// Crumb issuer path; the xpath asks Jenkins for `field:crumb` as plain text.
pub const CRUMB_PATH: &str =
    "/crumbIssuer/api/xml?xpath=concat(//crumbRequestField,\":\",//crumb)";

/// Declarative pipeline validation endpoint.
pub const VALIDATE_PATH: &str = "/pipeline-model-converter/validate";

/// Form field Jenkins reads the pipeline text from.
pub const JENKINSFILE_FIELD: &str = "jenkinsfile";

/// HTTP Basic credentials sent on every request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Returns `None` when both parts are empty, which means "no auth".
    pub fn from_parts(username: impl Into<String>, password: impl Into<String>) -> Option<Self> {
        let username = username.into();
        let password = password.into();
        if username.is_empty() && password.is_empty() {
            return None;
        }
        Some(Self { username, password })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// CSRF header Jenkins expects on state-changing requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrumbHeader {
    pub name: String,
    pub value: String,
}

/// Raw outcome of the validate call. The body is Jenkins' message,
/// untouched; the status is kept so callers can be stricter if they want.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub status: StatusCode,
    pub body: String,
}

/// Parse a crumb issuer response of the form `name:value`.
///
/// Surrounding whitespace is ignored. Anything that does not split into
/// exactly two parts on `:`, or that would not make a legal HTTP header,
/// is a [`Error::CrumbParse`] carrying the raw body.
pub fn parse_crumb(body: &str) -> Result<CrumbHeader> {
    let parse_error = || Error::CrumbParse {
        body: body.to_string(),
    };

    let parts: Vec<&str> = body.trim().split(':').collect();
    let [name, value] = parts.as_slice() else {
        return Err(parse_error());
    };

    HeaderName::from_bytes(name.as_bytes()).map_err(|_| parse_error())?;
    HeaderValue::from_str(value).map_err(|_| parse_error())?;

    Ok(CrumbHeader {
        name: name.to_string(),
        value: value.to_string(),
    })
}

/// Blocking client bound to one Jenkins instance.
#[derive(Debug, Clone)]
pub struct JenkinsClient {
    client: Client,
    base_url: String,
    credentials: Option<Credentials>,
}

impl JenkinsClient {
    /// Build a client for `base_url`. Trailing slashes are dropped so the
    /// endpoint paths can be appended directly. `timeout` of `None` keeps
    /// reqwest's default.
    pub fn new(
        base_url: &str,
        credentials: Option<Credentials>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(Error::HttpClient)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn crumb_url(&self) -> String {
        format!("{}{}", self.base_url, CRUMB_PATH)
    }

    pub fn validate_url(&self) -> String {
        format!("{}{}", self.base_url, VALIDATE_PATH)
    }

    /// Attach Basic Auth when credentials are configured.
    fn with_auth(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some(creds) => req.basic_auth(&creds.username, Some(&creds.password)),
            None => req,
        }
    }

    /// Ask the crumb issuer for a CSRF header.
    ///
    /// The status code is not inspected: whatever body comes back is fed
    /// to [`parse_crumb`]. Only transport failures map to
    /// [`Error::CrumbTransport`].
    pub fn fetch_crumb(&self) -> Result<CrumbHeader> {
        let url = self.crumb_url();
        debug!(%url, "fetching crumb");

        let res = self
            .with_auth(self.client.get(&url))
            .send()
            .map_err(Error::CrumbTransport)?;
        let status = res.status();
        let body = res.text().map_err(Error::CrumbTransport)?;
        debug!(%status, "crumb issuer responded");

        parse_crumb(&body)
    }

    /// Send `jenkinsfile` to the validation endpoint and hand back the
    /// response verbatim.
    pub fn validate(
        &self,
        jenkinsfile: &str,
        crumb: Option<&CrumbHeader>,
    ) -> Result<ValidationResult> {
        let url = self.validate_url();
        debug!(%url, bytes = jenkinsfile.len(), crumb = crumb.is_some(), "validating Jenkinsfile");

        // `form` sets Content-Type: application/x-www-form-urlencoded
        let mut req = self
            .client
            .post(&url)
            .form(&[(JENKINSFILE_FIELD, jenkinsfile)]);
        if let Some(crumb) = crumb {
            req = req.header(crumb.name.as_str(), crumb.value.as_str());
        }

        let res = self.with_auth(req).send().map_err(Error::ValidateTransport)?;
        let status = res.status();
        let body = res.text().map_err(Error::ValidateTransport)?;
        debug!(%status, "validation endpoint responded");

        Ok(ValidationResult { status, body })
    }
}
