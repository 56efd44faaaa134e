use serde::Serialize;
use serde_json::{Map, Value};

use super::attachments::AttachmentResult;
use super::client::RawResponse;

/// Final result of one submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    /// The issue exists; `attachments` lists every upload that was attempted.
    Success {
        issue_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        issue_key: Option<String>,
        attachments: Vec<AttachmentResult>,
    },
    /// The tracker rejected one or more field values.
    ValidationError { messages: Vec<String> },
    /// The tracker answered, but with neither an id nor error messages.
    UnknownError { raw: String },
    /// No usable answer: network failure, timeout or an unreadable error body.
    TransportError { cause: String },
}

impl SubmissionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn issue_id(&self) -> Option<&str> {
        match self {
            Self::Success { issue_id, .. } => Some(issue_id),
            _ => None,
        }
    }

    /// Notification text for the person who filled in the form.
    pub fn user_message(&self) -> String {
        match self {
            Self::Success {
                issue_id,
                issue_key,
                ..
            } => format!(
                "Your request has been submitted ({}).",
                issue_key.as_deref().unwrap_or(issue_id)
            ),
            Self::ValidationError { .. } => {
                "There was an error processing your request. Code-0001".to_string()
            }
            Self::UnknownError { .. } => {
                "There was an error processing your request. Code-0002".to_string()
            }
            Self::TransportError { .. } => {
                "Unable to process request at this time, please try again later.".to_string()
            }
        }
    }
}

/// Classify a create-issue response.
///
/// `errorMessages` (or a non-empty `errors` object) means the tracker rejected the
/// request; otherwise an `id` means the issue was created. Anything else, including
/// a body that is not a JSON object, is reported as an unknown error.
pub fn interpret(raw: &RawResponse) -> SubmissionOutcome {
    let Some(Value::Object(body)) = raw.json() else {
        return SubmissionOutcome::UnknownError {
            raw: raw.body.clone(),
        };
    };

    let field_errors = body
        .get("errors")
        .and_then(Value::as_object)
        .filter(|errors| !errors.is_empty());

    if body.contains_key("errorMessages") || field_errors.is_some() {
        return SubmissionOutcome::ValidationError {
            messages: validation_messages(&body),
        };
    }

    match body.get("id").and_then(id_string) {
        Some(issue_id) => SubmissionOutcome::Success {
            issue_id,
            issue_key: body.get("key").and_then(Value::as_str).map(str::to_string),
            attachments: Vec::new(),
        },
        None => SubmissionOutcome::UnknownError {
            raw: raw.body.clone(),
        },
    }
}

fn id_string(id: &Value) -> Option<String> {
    match id {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn validation_messages(body: &Map<String, Value>) -> Vec<String> {
    let mut messages: Vec<String> = body
        .get("errorMessages")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .map(|message| match message {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect();

    if let Some(errors) = body.get("errors").and_then(Value::as_object) {
        for (field, message) in errors {
            let message = message.as_str().map(str::to_string).unwrap_or_else(|| message.to_string());
            messages.push(format!("{field}: {message}"));
        }
    }
    messages
}
