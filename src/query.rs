// === Module Header (agents-tooling) START ===
// purpose: Compose tracker search queries and drill-down URLs from projects, period fragments and optional filters
// role: query/builder
// inputs: project codes, date-range fragment, optional type/state values
// outputs: space-separated predicate strings; percent-encoded /issues URLs
// invariants:
// - Project predicates repeat once per project (repetition is OR in the tracker grammar)
// - Subtask exclusion is always present
// - Project codes are caller-controlled and not escaped; type/state values are always brace-wrapped
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use anyhow::{Result, bail};

pub const NO_SUBTASKS: &str = "has: -{subtask of}";

#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
  projects: Vec<String>,
  date_fragment: Option<String>,
  issue_type: Option<String>,
  state: Option<String>,
}

impl QueryBuilder {
  pub fn new<I, S>(projects: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    Self {
      projects: projects
        .into_iter()
        .map(|p| p.as_ref().trim().to_string())
        .filter(|p| !p.is_empty())
        .collect(),
      ..Self::default()
    }
  }

  /// Date-range predicate as produced by the period resolver.
  pub fn period(mut self, fragment: impl Into<String>) -> Self {
    self.date_fragment = Some(fragment.into());
    self
  }

  pub fn issue_type(mut self, value: Option<&str>) -> Self {
    self.issue_type = value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string);
    self
  }

  pub fn state(mut self, value: Option<&str>) -> Self {
    self.state = value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string);
    self
  }

  pub fn build(&self) -> Result<String> {
    if self.projects.is_empty() {
      bail!("query needs at least one project");
    }

    let mut parts: Vec<String> = self.projects.iter().map(|p| format!("project: {{{p}}}")).collect();

    if let Some(frag) = &self.date_fragment {
      parts.push(frag.clone());
    }
    parts.push(NO_SUBTASKS.to_string());

    if let Some(t) = &self.issue_type {
      parts.push(format!("Type: {{{t}}}"));
    }
    if let Some(s) = &self.state {
      parts.push(format!("State: {{{s}}}"));
    }

    Ok(parts.join(" "))
  }
}

/// Browser URL listing the issues a query matches.
pub fn issues_url(base_url: &str, query: &str) -> String {
  let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
  // form encoding turns spaces into '+'; the tracker UI expects %20
  format!("{}/issues?q={}", base_url.trim_end_matches('/'), encoded.replace('+', "%20"))
}
