// === Module Header (agents-tooling) START ===
// purpose: Typed tracker endpoints (issue search page, per-issue links, single issue, admin metadata) over a Transport
// role: tracker/client
// inputs: Box<dyn Transport>
// outputs: raw issue pages, IssueRecord, IssueLink lists, metadata JSON
// invariants:
// - Endpoints expected to return arrays fail with a decode FetchError when they do not
// - Search errors are re-labelled with the query string; lookups with the issue identifier
// - Identifiers placed in a URL path are percent-encoded as single path segments
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use url::Url;

use crate::error::FetchError;
use crate::model::{IssueLink, IssueRecord, LINK_FIELDS};
use crate::tracker::transport::Transport;

/// Absolute API path from `segments`, each percent-encoded as one path segment.
pub fn api_path(segments: &[&str]) -> Result<String, FetchError> {
  let target = segments.join("/");
  let mut url = Url::parse("http://tracker.invalid/").map_err(|e| FetchError::decode(&target, e.to_string()))?;
  url
    .path_segments_mut()
    .map_err(|_| FetchError::decode(&target, "base URL cannot hold a path"))?
    .clear()
    .extend(segments);

  Ok(url.path().to_string())
}

pub struct TrackerClient {
  transport: Box<dyn Transport>,
}

impl TrackerClient {
  pub fn new(transport: Box<dyn Transport>) -> Self {
    Self { transport }
  }

  /// One page of the issue search endpoint.
  pub fn search_page(
    &self,
    query: &str,
    fields: &str,
    top: usize,
    skip: usize,
  ) -> Result<Vec<serde_json::Value>, FetchError> {
    let params = [
      ("query", query.to_string()),
      ("fields", fields.to_string()),
      ("$top", top.to_string()),
      ("$skip", skip.to_string()),
    ];

    self
      .get_array("/api/issues", &params)
      .map_err(|e| e.for_target(query))
  }

  /// Link groups of one issue, addressed by internal id.
  pub fn issue_links(&self, issue_id: &str) -> Result<Vec<IssueLink>, FetchError> {
    let path = api_path(&["api", "issues", issue_id, "links"])?;
    let items = self
      .get_array(&path, &[("fields", LINK_FIELDS.to_string())])
      .map_err(|e| e.for_target(issue_id))?;

    Ok(items.iter().map(IssueLink::from_json).collect())
  }

  /// Single issue lookup by internal or readable id.
  pub fn issue(&self, id: &str, fields: &str) -> Result<IssueRecord, FetchError> {
    let path = api_path(&["api", "issues", id])?;
    let v = self
      .transport
      .get_json(&path, &[("fields", fields.to_string())])
      .map_err(|e| e.for_target(id))?;

    if !v.is_object() {
      return Err(FetchError::decode(id, "expected an issue object"));
    }
    Ok(IssueRecord::from_json(&v))
  }

  pub fn projects(&self) -> Result<Vec<serde_json::Value>, FetchError> {
    self.get_array(
      "/api/admin/projects",
      &[("fields", "shortName,name".to_string()), ("$top", "1000".to_string())],
    )
  }

  pub fn project_custom_fields(&self, project: &str) -> Result<Vec<serde_json::Value>, FetchError> {
    let path = api_path(&["api", "admin", "projects", project, "customFields"])?;
    self.get_array(&path, &[("fields", "field(name),bundle(id)".to_string())])
  }

  /// Values of an enum or state bundle, in bundle order.
  pub fn bundle_values(&self, bundle_kind: &str, bundle_id: &str) -> Result<Vec<serde_json::Value>, FetchError> {
    let path = api_path(&["api", "admin", "customFieldSettings", "bundles", bundle_kind, bundle_id])?;
    let v = self.transport.get_json(&path, &[("fields", "values(name)".to_string())])?;

    match v.get("values").and_then(|vals| vals.as_array()) {
      Some(vals) => Ok(vals.clone()),
      None => Err(FetchError::decode(path, "bundle without values")),
    }
  }

  pub fn users_page(&self, top: usize, skip: usize) -> Result<Vec<serde_json::Value>, FetchError> {
    self.get_array(
      "/api/users",
      &[
        ("fields", "login,name".to_string()),
        ("$top", top.to_string()),
        ("$skip", skip.to_string()),
      ],
    )
  }

  fn get_array(&self, path: &str, params: &[(&str, String)]) -> Result<Vec<serde_json::Value>, FetchError> {
    match self.transport.get_json(path, params)? {
      serde_json::Value::Array(items) => Ok(items),
      // some proxies answer an empty body as null
      serde_json::Value::Null => Ok(Vec::new()),
      _ => Err(FetchError::decode(path, "expected a JSON array")),
    }
  }
}
