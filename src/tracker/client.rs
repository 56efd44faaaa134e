use std::time::Duration;

use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use url::Url;

use crate::error::{ConfigError, TransportError};
use crate::files::ResolvedFile;
use crate::payload::IssuePayload;
use crate::{AuthConfig, TrackerConfig};

/// Status and body of a tracker response, before interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issue creation and attachment upload against one configured endpoint.
///
/// Cloning is cheap and clones share the connection pool.
#[derive(Debug, Clone)]
pub struct TrackerClient {
    client: Client,
    endpoint: String,
    auth: AuthConfig,
}

impl TrackerClient {
    pub fn new(config: &TrackerConfig) -> Result<Self, ConfigError> {
        let url = Url::parse(&config.endpoint_url).map_err(|source| ConfigError::InvalidEndpoint {
            url: config.endpoint_url.clone(),
            source,
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme(config.endpoint_url.clone()));
        }

        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            endpoint: config.endpoint_url.clone(),
            auth: config.auth.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// `{endpoint}/{issue_id}/attachments/`
    pub fn attachments_url(&self, issue_id: &str) -> String {
        format!(
            "{}/{}/attachments/",
            self.endpoint.trim_end_matches('/'),
            issue_id
        )
    }

    /// POST the payload as JSON to the issue creation endpoint.
    pub async fn create_issue(&self, payload: &IssuePayload) -> Result<RawResponse, TransportError> {
        crate::log_info!("Creating issue via {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.auth.username, Some(&self.auth.password))
            .header("Accept", "application/json")
            .json(payload)
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: self.endpoint.clone(),
                source,
            })?;

        read_response(&self.endpoint, response).await
    }

    /// POST one file as a multipart `file` part to the issue's attachment endpoint.
    pub async fn upload_attachment(
        &self,
        issue_id: &str,
        file: &ResolvedFile,
    ) -> Result<RawResponse, TransportError> {
        let url = self.attachments_url(issue_id);
        let bytes = file.read().await?;

        let request_error = |source: reqwest::Error| TransportError::Request {
            url: url.clone(),
            source,
        };
        let part = Part::bytes(bytes)
            .file_name(file.file_name.clone())
            .mime_str(&file.mime_type)
            .map_err(request_error)?;

        crate::log_debug!(
            "Uploading {} ({} bytes, {}) to {}",
            file.file_name,
            file.size,
            file.mime_type,
            url
        );

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.auth.username, Some(&self.auth.password))
            .header("X-Atlassian-Token", "nocheck")
            .multipart(Form::new().part("file", part))
            .send()
            .await
            .map_err(request_error)?;

        read_response(&url, response).await
    }
}

/// Failure statuses are only passed on when the body is JSON the interpreter can read.
async fn read_response(url: &str, response: reqwest::Response) -> Result<RawResponse, TransportError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|source| TransportError::Request {
            url: url.to_string(),
            source,
        })?;

    if !status.is_success() && serde_json::from_str::<Value>(&body).is_err() {
        return Err(TransportError::UnreadableBody {
            status: status.as_u16(),
            body,
        });
    }

    Ok(RawResponse {
        status: status.as_u16(),
        body,
    })
}
