//! Field key to transformation rule lookup for the travel services forms.
//!
//! The rule set is plain data: adding a dropdown or checkbox field means adding its
//! key to the matching table, not another branch in the payload builder.

/// Value that marks a file upload field in the raw submission.
pub const FILE_MARKER: &str = "file";
/// Dropdown value meaning "nothing selected".
pub const NONE_SENTINEL: &str = "none";

pub const FORM_TITLE_KEY: &str = "formTitle";
pub const PROXY_KEY: &str = "proxy";
pub const INTERNATIONAL_KEY: &str = "international_travel";
pub const VOUCHER_KEY: &str = "voucher_request";

/// Name of the person submitting for themselves.
pub const SUBMITTER_NAME_KEY: &str = "customfield_10090";
/// Name of the traveler when someone submits on their behalf.
pub const PROXY_TRAVELER_NAME_KEY: &str = "customfield_10331";

/// "Yes/No" gate that shows the alternate approver fields on the form.
pub const MERGE_GATE_KEY: &str = "customfield_10431";

/// Keys consumed by classification and summary building; never sent to the tracker.
pub const CONTROL_KEYS: [&str; 4] = [FORM_TITLE_KEY, PROXY_KEY, INTERNATIONAL_KEY, VOUCHER_KEY];

/// How a submitted value is rewritten into the tracker schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// Copied unchanged.
    Plain,
    /// Wrapped as `{"value": v}`; when `omit_sentinel` is set, `"none"` drops the key.
    SingleValueWrap { omit_sentinel: bool },
    /// Each selected option becomes one `{"value": v}` element.
    CheckboxArray,
    /// File references, uploaded after the issue exists.
    FileField,
    /// One of several alternate keys collapsing onto `target`.
    ConditionalMerge { target: &'static str },
}

/// Static field tables for one family of forms.
#[derive(Debug)]
pub struct FieldSchema {
    pub dropdowns: &'static [&'static str],
    /// Time dropdowns where `"none"` means no time was chosen.
    pub time_sentinels: &'static [&'static str],
    /// Wrapped like dropdowns whether or not they are listed as one.
    pub single_values: &'static [&'static str],
    pub checkboxes: &'static [&'static str],
    pub files: &'static [&'static str],
    /// Alternate source keys, in precedence order. The target itself is also
    /// merged, never copied as a plain field.
    pub merge_sources: &'static [&'static str],
    pub merge_target: &'static str,
}

static TRAVEL_SCHEMA: FieldSchema = FieldSchema {
    dropdowns: &[
        "customfield_10094",
        "customfield_10095",
        "customfield_10097",
        "customfield_10110",
        "customfield_10302",
        "customfield_10316",
        "customfield_10318",
        "customfield_10320",
        "customfield_10322",
        "customfield_10324",
    ],
    time_sentinels: &[
        "customfield_10302",
        "customfield_10316",
        "customfield_10318",
        "customfield_10320",
        "customfield_10322",
        "customfield_10324",
    ],
    single_values: &["customfield_10093", "customfield_10191", MERGE_GATE_KEY],
    checkboxes: &["customfield_10103", "customfield_10200", "customfield_10340"],
    files: &["attachments", "supporting_documents", "passport_copy"],
    merge_sources: &["customfield_10105a", "customfield_10105b", "customfield_10105c"],
    merge_target: "customfield_10105",
};

impl FieldSchema {
    /// Schema shared by the travel authorization and travel request forms.
    pub fn travel() -> &'static FieldSchema {
        &TRAVEL_SCHEMA
    }

    pub fn rule_for(&self, key: &str) -> FieldRule {
        if self.files.contains(&key) {
            FieldRule::FileField
        } else if self.single_values.contains(&key) {
            FieldRule::SingleValueWrap {
                omit_sentinel: false,
            }
        } else if self.dropdowns.contains(&key) {
            FieldRule::SingleValueWrap {
                omit_sentinel: self.time_sentinels.contains(&key),
            }
        } else if self.checkboxes.contains(&key) {
            FieldRule::CheckboxArray
        } else if self.merge_sources.contains(&key) || key == self.merge_target {
            FieldRule::ConditionalMerge {
                target: self.merge_target,
            }
        } else {
            FieldRule::Plain
        }
    }

    pub fn is_file_field(&self, key: &str) -> bool {
        self.rule_for(key) == FieldRule::FileField
    }
}

pub fn is_control_key(key: &str) -> bool {
    CONTROL_KEYS.contains(&key)
}
