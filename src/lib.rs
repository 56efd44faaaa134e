//! Jira web form bridge
//!
//! This library turns a generic web form submission (a map of field keys to values)
//! into a Jira issue: it classifies the submission, rewrites its fields into the
//! tracker's schema, creates the issue and uploads any attached files.

pub mod auth;
pub mod classify;
pub mod config;
pub mod error;
pub mod files;
pub mod form;
pub mod logging;
pub mod payload;
pub mod schema;
pub mod tracker;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use classify::{ClassificationDecision, classify};
pub use error::{ConfigError, SchemaViolation, TransportError};
pub use files::{DirectoryResolver, FileResolver, FileSource, ResolvedFile};
pub use payload::{IssuePayload, build_payload};
pub use tracker::{AttachmentResult, RawResponse, SubmissionOutcome, TrackerClient, interpret};

/// Issue type used for every travel services request unless configured otherwise.
pub const DEFAULT_ISSUE_TYPE_ID: &str = "10100";

/// Configuration for the tracker connection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackerConfig {
    /// Issue creation endpoint, e.g. `https://example.atlassian.net/rest/api/2/issue/`
    pub endpoint_url: String,
    /// Per-request timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Authentication credentials
    pub auth: AuthConfig,
    /// Destination projects and issue type
    pub projects: ProjectConfig,
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Username (or account email) for basic authentication
    pub username: String,
    /// Password or API token
    #[serde(default)]
    pub password: String,
}

impl AuthConfig {
    /// Split a colon-joined `user:password` credential string.
    pub fn from_pair(pair: &str) -> Result<Self, ConfigError> {
        let (username, password) = pair
            .split_once(':')
            .ok_or(ConfigError::InvalidCredentialPair)?;
        if username.trim().is_empty() {
            return Err(ConfigError::InvalidCredentialPair);
        }
        Ok(Self {
            username: username.trim().to_string(),
            password: password.to_string(),
        })
    }
}

/// Project identifiers a submission can be routed to
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProjectConfig {
    pub domestic: String,
    pub international: String,
    pub vouchers: String,
    #[serde(default = "default_issue_type")]
    pub issue_type: String,
}

fn default_issue_type() -> String {
    DEFAULT_ISSUE_TYPE_ID.to_string()
}

/// One completed form submission
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Submission {
    /// Title of the form that produced the submission
    pub title: String,
    /// Field keys to values, in the order the form produced them
    pub fields: Map<String, Value>,
}

impl Submission {
    pub fn new(title: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            title: title.into(),
            fields,
        }
    }

    /// Use the `formTitle` field when no explicit title was supplied.
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        let title = fields
            .get(schema::FORM_TITLE_KEY)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Self { title, fields }
    }
}

/// Main submission client
pub struct JiraSubmissionClient {
    config: TrackerConfig,
    tracker: TrackerClient,
}

impl JiraSubmissionClient {
    /// Create a new client; the configuration is read-only from here on.
    pub fn new(config: TrackerConfig) -> Result<Self, ConfigError> {
        let tracker = TrackerClient::new(&config)?;
        Ok(Self { config, tracker })
    }

    /// Classify, build and deliver a submission, then upload its attachments.
    pub async fn submit(
        &self,
        submission: &Submission,
        files: &dyn FileResolver,
    ) -> Result<SubmissionOutcome, SchemaViolation> {
        form::submit(&self.tracker, &self.config, submission, files).await
    }

    /// Classify and build the payload without touching the network.
    pub fn preview(&self, submission: &Submission) -> Result<IssuePayload, SchemaViolation> {
        form::prepare(&self.config, submission).map(|(_, payload)| payload)
    }
}
