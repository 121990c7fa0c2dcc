// === Module Header (agents-tooling) START ===
// purpose: Extract semantic attributes (Type, State, Due Date) from an issue's free-text-named custom fields
// role: extraction/custom-fields
// inputs: IssueRecord custom field list
// outputs: Option<String> display names, Option<NaiveDate> dates
// invariants:
// - Name matching is case-insensitive over a fixed alias list; first matching field wins
// - Absence is a normal outcome; never errors, never panics
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use chrono::{DateTime, NaiveDate};

use crate::ext::serde_json::JsonFetch;
use crate::model::{CustomField, IssueRecord};

/// Bucket name used when an attribute is absent.
pub const UNSPECIFIED: &str = "Unspecified";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Attribute {
  Type,
  State,
  DueDate,
}

impl Attribute {
  pub fn aliases(self) -> &'static [&'static str] {
    match self {
      Attribute::Type => &["type", "issue type", "issuetype"],
      Attribute::State => &["state"],
      Attribute::DueDate => &["due date", "duedate", "due"],
    }
  }

  fn matches(self, field_name: &str) -> bool {
    let n = field_name.trim().to_lowercase();
    self.aliases().iter().any(|a| *a == n)
  }
}

/// First custom field whose name matches one of the attribute's aliases.
pub fn find_field(issue: &IssueRecord, attr: Attribute) -> Option<&CustomField> {
  issue.custom_fields.iter().find(|cf| attr.matches(&cf.name))
}

/// Enum/scalar display name of an attribute (`name`, then `localizedName`).
///
/// A field that is present but holds a non-object value counts as absent.
pub fn extract_name(issue: &IssueRecord, attr: Attribute) -> Option<String> {
  let field = find_field(issue, attr)?;

  match &field.value {
    v @ serde_json::Value::Object(_) => v.first_text(&["name", "localizedName"]),
    // multi-value fields: first named element
    serde_json::Value::Array(items) => items.iter().find_map(|v| v.first_text(&["name", "localizedName"])),
    _ => None,
  }
}

pub fn issue_type(issue: &IssueRecord) -> Option<String> {
  extract_name(issue, Attribute::Type)
}

pub fn issue_state(issue: &IssueRecord) -> Option<String> {
  extract_name(issue, Attribute::State)
}

/// Due date as a UTC calendar date; the tracker stores date fields as epoch millis.
pub fn due_date(issue: &IssueRecord) -> Option<NaiveDate> {
  let field = find_field(issue, Attribute::DueDate)?;
  field.value.as_i64().and_then(millis_to_date)
}

/// Convert epoch milliseconds to a UTC date; zero, negative and out-of-range values yield `None`.
pub fn millis_to_date(ms: i64) -> Option<NaiveDate> {
  if ms <= 0 {
    return None;
  }
  DateTime::from_timestamp_millis(ms).map(|dt| dt.date_naive())
}
