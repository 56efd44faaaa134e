use crate::TrackerConfig;
use anyhow::{Context, Result};
use reqwest::Client;
use url::Url;

/// URL of the "current user" resource on the tracker hosting the issue endpoint.
pub fn myself_url(endpoint_url: &str) -> Result<String> {
    let endpoint = Url::parse(endpoint_url)
        .with_context(|| format!("Invalid endpoint url: {}", endpoint_url))?;
    let myself = endpoint
        .join("/rest/api/2/myself")
        .context("Failed to derive the credential check url")?;
    Ok(myself.to_string())
}

/// Check the configured credentials using HTTP Basic Authentication
/// This makes one read-only call and never creates anything on the tracker
pub async fn verify_credentials(client: &Client, config: &TrackerConfig) -> Result<()> {
    let test_url = myself_url(&config.endpoint_url)?;

    let response = client
        .get(&test_url)
        .basic_auth(&config.auth.username, Some(&config.auth.password))
        .header("Accept", "application/json")
        .send()
        .await
        .context("Failed to test authentication")?;

    if response.status().is_success() {
        crate::log_info!("Authentication successful");
        Ok(())
    } else {
        let status = response.status();
        let error_body = response.text().await.unwrap_or_default();

        if status == 401 {
            Err(anyhow::anyhow!(
                "Authentication failed: Invalid credentials for '{}'. Check the username and password (or API token).",
                config.auth.username
            ))
        } else if status == 403 {
            Err(anyhow::anyhow!(
                "Authentication successful but access denied. The account may be locked or need a CAPTCHA login."
            ))
        } else {
            Err(anyhow::anyhow!(
                "Authentication failed with status: {} - {}",
                status,
                error_body
            ))
        }
    }
}
