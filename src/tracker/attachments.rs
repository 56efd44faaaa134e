use serde::Serialize;
use serde_json::{Map, Value};

use super::client::TrackerClient;
use crate::files::FileResolver;
use crate::schema::{FILE_MARKER, FieldSchema};

/// Whether one attempted upload was accepted by the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachmentResult {
    pub file_name: String,
    pub uploaded: bool,
}

/// Upload every file referenced by the submission's file fields, one at a time.
///
/// Unresolvable and empty files are skipped without a result. A failed upload is
/// recorded with `uploaded: false` and does not stop the remaining ones.
pub async fn upload_all(
    client: &TrackerClient,
    issue_id: &str,
    fields: &Map<String, Value>,
    schema: &FieldSchema,
    files: &dyn FileResolver,
) -> Vec<AttachmentResult> {
    let mut results = Vec::new();

    for (key, value) in fields {
        if !schema.is_file_field(key) {
            continue;
        }

        for file_id in file_refs(value) {
            let Some(file) = files.resolve(&file_id) else {
                crate::log_warn!("Skipping file {} from {}: not found", file_id, key);
                continue;
            };
            if file.size == 0 {
                crate::log_warn!("Skipping file {} from {}: empty", file.file_name, key);
                continue;
            }

            let uploaded = match client.upload_attachment(issue_id, &file).await {
                Ok(raw) => {
                    crate::log_info!(
                        "Attachment response for {} (HTTP {}): {}",
                        file.file_name,
                        raw.status,
                        raw.body
                    );
                    raw.is_success() && accepted(raw.json())
                }
                Err(err) => {
                    crate::log_error!("Uploading {} failed: {}", file.file_name, err);
                    false
                }
            };

            results.push(AttachmentResult {
                file_name: file.file_name,
                uploaded,
            });
        }
    }

    results
}

/// File ids held by a file field: a list, a single id, or nothing.
pub fn file_refs(value: &Value) -> Vec<String> {
    fn single(value: &Value) -> Option<String> {
        match value {
            Value::String(s) if !s.trim().is_empty() && s != FILE_MARKER => {
                Some(s.trim().to_string())
            }
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    match value {
        Value::Array(items) => items.iter().filter_map(single).collect(),
        other => single(other).into_iter().collect(),
    }
}

/// The tracker answers an accepted upload with the list of created attachments.
fn accepted(body: Option<Value>) -> bool {
    match body {
        Some(Value::Array(records)) => !records.is_empty(),
        _ => false,
    }
}
