// === Module Header (agents-tooling) START ===
// purpose: Cached reference metadata: projects and their synonyms, Type/State values per project, assignee logins
// role: tracker/metadata
// inputs: TrackerClient; TTL for the caches
// outputs: ProjectMap, Vec<String> of types/states, assignee map
// side_effects: Admin API calls on cache miss
// invariants:
// - Each public lookup is cached by (function, arguments) for the TTL
// - Types are sorted; states keep bundle order
// - A project without the requested field yields an empty list, not an error
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

use crate::error::FetchError;
use crate::ext::serde_json::JsonFetch;
use crate::tracker::cache::{TtlCache, cache_key};
use crate::tracker::client::TrackerClient;

/// Project short code -> lower-cased synonyms (short code, full name, name tokens).
pub type ProjectMap = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProjectField {
  pub field: String,
  pub bundle_id: Option<String>,
}

pub struct Metadata<'a> {
  client: &'a TrackerClient,
  projects: TtlCache<ProjectMap>,
  fields: TtlCache<Vec<ProjectField>>,
  values: TtlCache<Vec<String>>,
  assignees: TtlCache<BTreeMap<String, String>>,
}

impl<'a> Metadata<'a> {
  pub fn new(client: &'a TrackerClient, ttl: Duration) -> Self {
    Self {
      client,
      projects: TtlCache::new(ttl),
      fields: TtlCache::new(ttl),
      values: TtlCache::new(ttl),
      assignees: TtlCache::new(ttl),
    }
  }

  pub fn projects(&self) -> Result<ProjectMap, FetchError> {
    self
      .projects
      .get_or_try_insert_with(cache_key("fetch_projects", &[]), || {
        Ok(build_project_map(&self.client.projects()?))
      })
  }

  /// Type values for `project`, sorted.
  pub fn task_types(&self, project: &str) -> Result<Vec<String>, FetchError> {
    let key = cache_key("fetch_task_types", &[project]);

    self.values.get_or_try_insert_with(key, || {
      let mut names = self.bundle_names(project, "Type", "enum")?;
      names.sort();
      Ok(names)
    })
  }

  /// State values for `project`, in workflow order.
  pub fn task_states(&self, project: &str) -> Result<Vec<String>, FetchError> {
    let key = cache_key("fetch_task_states", &[project]);
    self
      .values
      .get_or_try_insert_with(key, || self.bundle_names(project, "State", "state"))
  }

  /// Lower-cased login and full name -> login, across every user page.
  pub fn assignees(&self, max_users: usize, page_size: usize) -> Result<BTreeMap<String, String>, FetchError> {
    let key = cache_key("fetch_assignees", &[&max_users.to_string()]);

    self.assignees.get_or_try_insert_with(key, || {
      let page_size = page_size.max(1);
      let mut mapping = BTreeMap::new();
      let mut skip = 0usize;

      while skip < max_users {
        let users = self.client.users_page(page_size, skip)?;

        for user in &users {
          let Some(login) = user.fetch("login").text().map(|l| l.to_lowercase()) else {
            continue;
          };
          if let Some(name) = user.fetch("name").text().map(|n| n.to_lowercase()) {
            if name != login {
              mapping.insert(name, login.clone());
            }
          }
          mapping.insert(login.clone(), login);
        }

        if users.len() < page_size {
          break;
        }
        skip += users.len();
      }

      Ok(mapping)
    })
  }

  /// Drop every cached entry; the next access refetches.
  #[allow(dead_code)]
  pub fn clear(&self) {
    self.projects.clear();
    self.fields.clear();
    self.values.clear();
    self.assignees.clear();
  }

  fn project_fields(&self, project: &str) -> Result<Vec<ProjectField>, FetchError> {
    let key = cache_key("project_custom_fields", &[project]);

    self.fields.get_or_try_insert_with(key, || {
      let raw = self.client.project_custom_fields(project)?;
      Ok(
        raw
          .iter()
          .filter_map(|f| {
            Some(ProjectField {
              field: f.fetch("field.name").text()?,
              bundle_id: f.fetch("bundle.id").text(),
            })
          })
          .collect(),
      )
    })
  }

  fn bundle_names(&self, project: &str, field: &str, bundle_kind: &str) -> Result<Vec<String>, FetchError> {
    let bundle_id = self
      .project_fields(project)?
      .into_iter()
      .find(|f| f.field.eq_ignore_ascii_case(field))
      .and_then(|f| f.bundle_id);

    let Some(bundle_id) = bundle_id else {
      tracing::debug!(project, field, "project has no bundle for field");
      return Ok(Vec::new());
    };

    let values = self.client.bundle_values(bundle_kind, &bundle_id)?;
    Ok(values.iter().filter_map(|v| v.fetch("name").text()).collect())
  }
}

fn build_project_map(projects: &[serde_json::Value]) -> ProjectMap {
  let mut map = ProjectMap::new();

  for p in projects {
    let Some(short) = p.fetch("shortName").text() else { continue };

    let mut synonyms = vec![short.to_lowercase()];
    if let Some(name) = p.fetch("name").text().map(|n| n.to_lowercase()) {
      synonyms.extend(name.split_whitespace().map(str::to_string));
      synonyms.insert(1, name);
    }

    let mut seen = std::collections::HashSet::new();
    synonyms.retain(|s| seen.insert(s.clone()));
    map.insert(short, synonyms);
  }

  map
}
