use anyhow::Context;
use serde_json::{Map, Value};

use crate::classify::{ClassificationDecision, classify};
use crate::error::SchemaViolation;
use crate::files::FileResolver;
use crate::payload::{IssuePayload, build_payload};
use crate::schema::FieldSchema;
use crate::tracker::{SubmissionOutcome, TrackerClient, interpret, upload_all};
use crate::{Submission, TrackerConfig};

/// Merge raw form data: TOML first, then JSON, then `key=value` pairs.
/// Later sources win on duplicate keys. Malformed pairs are logged and skipped.
pub fn collect_fields(
    toml_source: Option<&str>,
    json_source: Option<&str>,
    pairs: &[String],
) -> anyhow::Result<Map<String, Value>> {
    let mut fields = Map::new();

    if let Some(content) = toml_source {
        let toml_value: toml::Value =
            toml::from_str(content).context("Failed to parse TOML form data")?;
        let value = serde_json::to_value(toml_value).context("Failed to convert TOML to JSON")?;
        merge_object(&mut fields, value, "TOML")?;
    }

    if let Some(content) = json_source {
        let value: Value = serde_json::from_str(content).context("Failed to parse JSON form data")?;
        merge_object(&mut fields, value, "JSON")?;
    }

    for item in pairs {
        match item.split_once('=') {
            Some((key, value)) => {
                fields.insert(key.to_string(), Value::String(value.to_string()));
            }
            None => crate::log_warn!("Invalid data format '{}', expected 'key=value'", item),
        }
    }

    Ok(fields)
}

fn merge_object(fields: &mut Map<String, Value>, value: Value, source: &str) -> anyhow::Result<()> {
    match value {
        Value::Object(map) => {
            crate::log_info!("Loaded {} fields from {} form data", map.len(), source);
            fields.extend(map);
            Ok(())
        }
        _ => Err(anyhow::anyhow!(
            "{} form data must contain an object at the root level",
            source
        )),
    }
}

/// Classify the submission and build its payload. No network access.
pub fn prepare(
    config: &TrackerConfig,
    submission: &Submission,
) -> Result<(ClassificationDecision, IssuePayload), SchemaViolation> {
    let decision = classify(&submission.fields, &config.projects);
    crate::log_info!(
        "Routing to {:?} project {} (issue type {})",
        decision.destination,
        decision.project_id,
        decision.issue_type_id
    );

    let payload = build_payload(submission, &decision, FieldSchema::travel())?;
    Ok((decision, payload))
}

/// Create the issue for a submission and attach its files.
///
/// Only a payload that cannot be built is returned as `Err`; every tracker or
/// network problem is reported through the outcome. Attachments are uploaded only
/// after the issue id is known.
#[tracing::instrument(name = "submission", skip_all, fields(title = %submission.title))]
pub async fn submit(
    tracker: &TrackerClient,
    config: &TrackerConfig,
    submission: &Submission,
    files: &dyn FileResolver,
) -> Result<SubmissionOutcome, SchemaViolation> {
    let (_, payload) = prepare(config, submission).inspect_err(|err| {
        crate::log_error!("Refusing to submit: {}", err);
    })?;

    let raw = match tracker.create_issue(&payload).await {
        Ok(raw) => raw,
        Err(err) => {
            if err.is_timeout() {
                crate::log_error!("Issue creation at {} timed out: {}", tracker.endpoint(), err);
            } else {
                crate::log_error!("Issue creation at {} failed: {}", tracker.endpoint(), err);
            }
            return Ok(SubmissionOutcome::TransportError {
                cause: err.to_string(),
            });
        }
    };

    let outcome = match interpret(&raw) {
        SubmissionOutcome::Success {
            issue_id,
            issue_key,
            ..
        } => {
            crate::log_info!(
                "Issue created: id={} key={}",
                issue_id,
                issue_key.as_deref().unwrap_or("-")
            );
            let attachments = upload_all(
                tracker,
                &issue_id,
                &submission.fields,
                FieldSchema::travel(),
                files,
            )
            .await;
            let failed = attachments.iter().filter(|result| !result.uploaded).count();
            if failed > 0 {
                crate::log_warn!("{} of {} attachments failed to upload", failed, attachments.len());
            }
            SubmissionOutcome::Success {
                issue_id,
                issue_key,
                attachments,
            }
        }
        SubmissionOutcome::ValidationError { messages } => {
            crate::log_error!("Tracker rejected the issue: {}", raw.body);
            SubmissionOutcome::ValidationError { messages }
        }
        other => {
            crate::log_error!("Unidentified error: tracker response = {}", raw.body);
            other
        }
    };

    Ok(outcome)
}
