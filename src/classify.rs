use serde_json::{Map, Value};

use crate::ProjectConfig;
use crate::schema::{INTERNATIONAL_KEY, VOUCHER_KEY};

/// Which project family a submission is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    International,
    Vouchers,
    Domestic,
}

type Predicate = fn(&Map<String, Value>) -> bool;

/// Predicates checked in priority order; the first one that holds wins.
const ROUTES: [(Predicate, Destination); 2] = [
    (is_international, Destination::International),
    (is_voucher, Destination::Vouchers),
];

/// Destination project and issue type, fixed once per submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationDecision {
    pub destination: Destination,
    pub project_id: String,
    pub issue_type_id: String,
}

/// Decide where a submission goes. Never fails: domestic is the default.
pub fn classify(fields: &Map<String, Value>, projects: &ProjectConfig) -> ClassificationDecision {
    let destination = ROUTES
        .iter()
        .find(|(predicate, _)| predicate(fields))
        .map(|(_, destination)| *destination)
        .unwrap_or(Destination::Domestic);

    let project_id = match destination {
        Destination::International => &projects.international,
        Destination::Vouchers => &projects.vouchers,
        Destination::Domestic => &projects.domestic,
    };

    ClassificationDecision {
        destination,
        project_id: project_id.clone(),
        issue_type_id: projects.issue_type.clone(),
    }
}

pub fn is_international(fields: &Map<String, Value>) -> bool {
    fields.get(INTERNATIONAL_KEY).is_some_and(is_set)
}

pub fn is_voucher(fields: &Map<String, Value>) -> bool {
    fields.get(VOUCHER_KEY).is_some_and(is_set)
}

/// Whether a form value counts as a ticked/selected indicator.
fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => {
            let s = s.trim();
            !s.is_empty()
                && !["0", "no", "false", "off", "none"]
                    .iter()
                    .any(|falsy| s.eq_ignore_ascii_case(falsy))
        }
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
