// === Module Header (agents-tooling) START ===
// purpose: Issue projections read from the tracker and the count/deployment shapes emitted in reports
// role: model/types
// outputs: IssueRecord, IssueLink, CustomField, count trees, Diagnostics, DeploymentRecord, LinkedTaskRecord, NameSet
// invariants: Parsing from JSON never fails; missing or malformed members become None/empty; all values are per-request
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::ext::serde_json::JsonFetch;

/// Field list requested for aggregation passes.
pub const ISSUE_FIELDS: &str = "id,idReadable,summary,project(shortName),created,customFields(name,value(name,localizedName))";

/// Field list for deployment issues, embedding their links and the linked issues' own fields.
pub const DEPLOYMENT_FIELDS: &str = "id,idReadable,summary,project(shortName),created,\
customFields(name,value(name,localizedName)),\
links(direction,linkType(name),issues(id,idReadable,summary,project(shortName),created,customFields(name,value(name,localizedName))))";

/// Field list for the per-issue links endpoint.
pub const LINK_FIELDS: &str =
  "direction,linkType(name),issues(id,idReadable,summary,project(shortName),created,customFields(name,value(name,localizedName)))";

#[derive(Debug, Clone, PartialEq)]
pub struct CustomField {
  pub name: String,
  pub value: serde_json::Value,
}

/// Minimal projection of a tracked issue.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueRecord {
  /// Internal database id (e.g. `2-1234`).
  pub id: Option<String>,
  /// Readable key, `PROJECT-NUMBER`.
  pub id_readable: Option<String>,
  pub summary: Option<String>,
  /// Upper-cased project short code.
  pub project: Option<String>,
  /// Creation instant in epoch milliseconds.
  pub created: Option<i64>,
  pub custom_fields: Vec<CustomField>,
  /// Links embedded in the payload, when requested.
  pub links: Vec<IssueLink>,
}

impl IssueRecord {
  pub fn from_json(v: &serde_json::Value) -> Self {
    let custom_fields = v
      .fetch("customFields")
      .items()
      .iter()
      .filter_map(|cf| {
        let name = cf.fetch("name").text()?;
        let value = cf.fetch("value").value().cloned().unwrap_or(serde_json::Value::Null);
        Some(CustomField { name, value })
      })
      .collect();

    Self {
      id: v.fetch("id").text(),
      id_readable: v.fetch("idReadable").text(),
      summary: v.fetch("summary").text(),
      project: v.fetch("project.shortName").text().map(|p| p.to_uppercase()),
      created: v.fetch("created").to::<i64>(),
      custom_fields,
      links: v.fetch("links").items().iter().map(IssueLink::from_json).collect(),
    }
  }

  /// Identifier best suited for logs.
  pub fn display_id(&self) -> &str {
    self.id_readable.as_deref().or(self.id.as_deref()).unwrap_or("<unknown>")
  }
}

/// One link group on an issue: a link type plus the issues on the other end.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueLink {
  pub link_type: Option<String>,
  pub issues: Vec<IssueRecord>,
}

impl IssueLink {
  pub fn from_json(v: &serde_json::Value) -> Self {
    Self {
      link_type: v.fetch("linkType.name").text(),
      issues: v.fetch("issues").items().iter().map(IssueRecord::from_json).collect(),
    }
  }
}

/// state -> count
pub type StateCounts = BTreeMap<String, u64>;
/// type -> state -> count
pub type TypeStateCounts = BTreeMap<String, StateCounts>;
/// project -> type -> state -> count
pub type ProjectCounts = BTreeMap<String, TypeStateCounts>;
/// type -> count
pub type TypeCounts = BTreeMap<String, u64>;
/// "YYYY-MM" -> type -> count
pub type MonthCounts = BTreeMap<String, TypeCounts>;

/// Raw-vs-kept tally exposed alongside every count tree.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Diagnostics {
  pub query: String,
  pub raw: u64,
  pub after_exclude: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LinkedTaskRecord {
  pub id: String,
  pub project: Option<String>,
  #[serde(rename = "type")]
  pub issue_type: Option<String>,
  pub state: Option<String>,
  pub title: String,
  pub created_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DeploymentRecord {
  pub deployment_id: String,
  pub title: String,
  pub due_date: Option<NaiveDate>,
  pub linked: Vec<LinkedTaskRecord>,
}

/// Set of normalized (trimmed, lower-cased) names: excluded issue types, allowed link types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NameSet(BTreeSet<String>);

impl NameSet {
  pub fn from_names<I, S>(names: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    Self(
      names
        .into_iter()
        .map(|n| normalize_name(n.as_ref()))
        .filter(|n| !n.is_empty())
        .collect(),
    )
  }

  pub fn contains(&self, name: &str) -> bool {
    self.0.contains(&normalize_name(name))
  }

  pub fn iter(&self) -> impl Iterator<Item = &str> {
    self.0.iter().map(String::as_str)
  }
}

pub fn normalize_name(name: &str) -> String {
  name.trim().to_lowercase()
}
