use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::Submission;
use crate::classify::ClassificationDecision;
use crate::error::SchemaViolation;
use crate::schema::{
    FILE_MARKER, FieldRule, FieldSchema, MERGE_GATE_KEY, NONE_SENTINEL, PROXY_KEY,
    PROXY_TRAVELER_NAME_KEY, SUBMITTER_NAME_KEY, is_control_key,
};

/// Body of a create-issue request: `{"fields": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssuePayload {
    pub fields: Map<String, Value>,
}

impl IssuePayload {
    pub fn summary(&self) -> Option<&str> {
        self.fields.get("summary").and_then(Value::as_str)
    }
}

/// Rewrite a submission into the tracker's field schema.
pub fn build_payload(
    submission: &Submission,
    decision: &ClassificationDecision,
    schema: &FieldSchema,
) -> Result<IssuePayload, SchemaViolation> {
    let mut fields = Map::new();

    for (key, value) in &submission.fields {
        if is_control_key(key) || value.as_str() == Some(FILE_MARKER) {
            continue;
        }

        match schema.rule_for(key) {
            FieldRule::FileField => {}
            FieldRule::Plain => {
                fields.insert(key.clone(), value.clone());
            }
            FieldRule::SingleValueWrap { omit_sentinel } => {
                if omit_sentinel && value.as_str() == Some(NONE_SENTINEL) {
                    crate::log_debug!("Omitting {} (no time selected)", key);
                    continue;
                }
                fields.insert(key.clone(), json!({ "value": value }));
            }
            FieldRule::CheckboxArray => {
                fields.insert(key.clone(), Value::Array(checkbox_entries(value)));
            }
            FieldRule::ConditionalMerge { .. } => {}
        }
    }

    if let Some(merged) = first_merge_source(submission, schema) {
        fields.insert(schema.merge_target.to_string(), merged.clone());
    }

    if submission.fields.get(MERGE_GATE_KEY).and_then(Value::as_str) == Some("Yes") {
        fields.insert(MERGE_GATE_KEY.to_string(), json!({ "value": "Yes" }));
    }

    let mut missing = Vec::new();
    if decision.project_id.trim().is_empty() {
        missing.push("project");
    }
    if decision.issue_type_id.trim().is_empty() {
        missing.push("issuetype");
    }
    let summary = summary(submission);
    if summary.is_none() {
        missing.push("summary");
    }
    if !missing.is_empty() {
        return Err(SchemaViolation { missing });
    }

    fields.insert("project".to_string(), project_reference(&decision.project_id));
    fields.insert(
        "issuetype".to_string(),
        json!({ "id": decision.issue_type_id }),
    );
    if let Some(summary) = summary {
        fields.insert("summary".to_string(), Value::String(summary));
    }

    Ok(IssuePayload { fields })
}

/// `"<form title>: <name>"`, preferring the traveler name on proxy submissions.
///
/// Returns `None` only when there is no title to build from.
pub fn summary(submission: &Submission) -> Option<String> {
    let title = submission.title.trim();
    if title.is_empty() {
        return None;
    }

    let candidates = match submission.fields.get(PROXY_KEY).and_then(Value::as_str) {
        Some("Yes") => [PROXY_TRAVELER_NAME_KEY, SUBMITTER_NAME_KEY],
        _ => [SUBMITTER_NAME_KEY, PROXY_TRAVELER_NAME_KEY],
    };
    let name = candidates
        .iter()
        .filter_map(|key| submission.fields.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|name| !name.is_empty());

    match name {
        Some(name) => Some(format!("{title}: {name}")),
        None => {
            crate::log_warn!("No submitter name found; summary is the bare form title");
            Some(title.to_string())
        }
    }
}

/// Numeric identifiers are project ids, anything else a project key.
fn project_reference(project: &str) -> Value {
    if project.chars().all(|c| c.is_ascii_digit()) {
        json!({ "id": project })
    } else {
        json!({ "key": project })
    }
}

/// Merge sources are checked in declared order; the first non-empty one wins.
/// A value submitted under the target key itself is the last resort.
fn first_merge_source<'a>(submission: &'a Submission, schema: &FieldSchema) -> Option<&'a Value> {
    schema
        .merge_sources
        .iter()
        .chain(std::iter::once(&schema.merge_target))
        .filter_map(|key| submission.fields.get(*key))
        .find(|value| !is_empty(value))
}

fn checkbox_entries(value: &Value) -> Vec<Value> {
    let selected: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(options) => options.values().collect(),
        Value::Null => Vec::new(),
        scalar => vec![scalar],
    };
    selected
        .into_iter()
        .filter(|option| is_selected(option))
        .map(|option| json!({ "value": option }))
        .collect()
}

/// Unticked checkbox options arrive as `0`, `false` or an empty value.
fn is_selected(option: &Value) -> bool {
    match option {
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_i64() != Some(0),
        Value::String(s) => !s.is_empty() && s != "0",
        other => !is_empty(other),
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
