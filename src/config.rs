use crate::{AuthConfig, DEFAULT_ISSUE_TYPE_ID, ProjectConfig, TrackerConfig};
use anyhow::{Context, Result};
use std::path::Path;

/// Prefix for environment overrides, e.g. `JIRA_WEBFORM_AUTH__PASSWORD`.
pub const ENV_PREFIX: &str = "JIRA_WEBFORM";

/// Load configuration from a TOML file, then apply environment overrides
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<TrackerConfig> {
    load_config_with_env(path, None)
}

/// Like [`load_config`], reading overrides from `env` instead of the process
/// environment when it is given.
pub fn load_config_with_env<P: AsRef<Path>>(
    path: P,
    env: Option<::config::Map<String, String>>,
) -> Result<TrackerConfig> {
    let path = path.as_ref();
    let settings = ::config::Config::builder()
        .add_source(::config::File::from(path).format(::config::FileFormat::Toml))
        .add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .source(env),
        )
        .build()
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    settings
        .try_deserialize()
        .with_context(|| format!("Invalid configuration in {}", path.display()))
}

/// Save configuration to a file
pub fn save_config<P: AsRef<Path>>(config: &TrackerConfig, path: P) -> Result<()> {
    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

/// Create a default configuration template
pub fn create_default_config() -> TrackerConfig {
    TrackerConfig {
        endpoint_url: "https://your-organization.atlassian.net/rest/api/2/issue/".to_string(),
        auth: AuthConfig {
            username: "".to_string(),
            password: "".to_string(),
        },
        projects: ProjectConfig {
            domestic: "10000".to_string(),
            international: "10001".to_string(),
            vouchers: "10002".to_string(),
            issue_type: DEFAULT_ISSUE_TYPE_ID.to_string(),
        },
        timeout_secs: Some(30),
    }
}
