// === Module Header (agents-tooling) START ===
// purpose: Resolve deployment issues to the tasks they ship via typed links, with ordered fallbacks and per-entry backfill
// role: links/resolver
// inputs: TrackerClient; deployment IssueRecords (with embedded links); allowed link-type NameSet
// outputs: DeploymentRecord list, observed link-type names, lookup failure count
// side_effects: Per-issue links and single-issue lookups on fallback/backfill
// invariants:
// - Sources are tried in order (embedded payload, then links endpoint) until one yields a usable link
// - Link groups outside the allowed set are discarded but their type names are still recorded
// - An entry missing project/type/state or holding a malformed key is backfilled (internal id, then readable id);
//   the first successful lookup ends the chain
// - Entries whose key is still malformed after backfill are dropped; keys are unique per deployment
// - Fallback/backfill failures are logged and counted, never propagated; the deployment search itself propagates
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::{BTreeSet, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::error::FetchError;
use crate::fields::{self, millis_to_date};
use crate::model::{DeploymentRecord, ISSUE_FIELDS, IssueLink, IssueRecord, LinkedTaskRecord, NameSet};
use crate::tracker::client::TrackerClient;
use crate::tracker::pager::IssuePager;

/// `PROJECT-123`: an uppercase letter, then uppercase letters/digits/underscores, a dash, digits.
pub fn is_valid_readable_id(id: &str) -> bool {
  static RE_READABLE_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z][A-Z0-9_]*-\d+$").unwrap());
  RE_READABLE_ID.is_match(id)
}

/// A linked issue as far as it is known.
#[derive(Debug, Clone, Default, PartialEq)]
struct Candidate {
  internal_id: Option<String>,
  readable_id: Option<String>,
  title: Option<String>,
  project: Option<String>,
  issue_type: Option<String>,
  state: Option<String>,
  created: Option<i64>,
}

impl Candidate {
  fn from_issue(issue: &IssueRecord) -> Self {
    Self {
      internal_id: issue.id.clone(),
      readable_id: issue.id_readable.clone(),
      title: issue.summary.clone(),
      project: issue.project.clone(),
      issue_type: fields::issue_type(issue),
      state: fields::issue_state(issue),
      created: issue.created,
    }
  }

  fn has_valid_key(&self) -> bool {
    self.readable_id.as_deref().is_some_and(is_valid_readable_id)
  }

  fn is_complete(&self) -> bool {
    self.has_valid_key() && self.project.is_some() && self.issue_type.is_some() && self.state.is_some()
  }

  /// Fill gaps from `other`; a malformed key is replaced only by a well-formed one.
  fn absorb(&mut self, other: Candidate) {
    if !self.has_valid_key() && other.has_valid_key() {
      self.readable_id = other.readable_id;
    }
    self.internal_id = self.internal_id.take().or(other.internal_id);
    self.title = self.title.take().or(other.title);
    self.project = self.project.take().or(other.project);
    self.issue_type = self.issue_type.take().or(other.issue_type);
    self.state = self.state.take().or(other.state);
    self.created = self.created.filter(|ms| *ms > 0).or(other.created);
  }

  fn into_record(self) -> Option<LinkedTaskRecord> {
    let id = self.readable_id.filter(|id| is_valid_readable_id(id))?;

    Some(LinkedTaskRecord {
      id,
      project: self.project,
      issue_type: self.issue_type,
      state: self.state,
      title: self.title.unwrap_or_default(),
      created_on: self.created.and_then(millis_to_date),
    })
  }
}

/// Where a deployment's link groups come from.
pub trait LinkSource {
  fn name(&self) -> &'static str;
  fn links(&self, deployment: &IssueRecord) -> Result<Vec<IssueLink>, FetchError>;
}

/// Links embedded in the search payload; no round trip.
pub struct EmbeddedLinks;

impl LinkSource for EmbeddedLinks {
  fn name(&self) -> &'static str {
    "embedded"
  }

  fn links(&self, deployment: &IssueRecord) -> Result<Vec<IssueLink>, FetchError> {
    Ok(deployment.links.clone())
  }
}

/// The per-issue links endpoint, by internal id.
pub struct LinksEndpoint<'a> {
  pub client: &'a TrackerClient,
}

impl LinkSource for LinksEndpoint<'_> {
  fn name(&self) -> &'static str {
    "links_endpoint"
  }

  fn links(&self, deployment: &IssueRecord) -> Result<Vec<IssueLink>, FetchError> {
    match deployment.id.as_deref() {
      Some(id) => self.client.issue_links(id),
      None => Ok(Vec::new()),
    }
  }
}

/// A direct issue lookup able to fill a candidate's missing fields.
trait Backfill {
  fn name(&self) -> &'static str;
  /// `None` when the candidate lacks the identifier this lookup needs.
  fn lookup(&self, cand: &Candidate) -> Option<Result<IssueRecord, FetchError>>;
}

struct ByInternalId<'a> {
  client: &'a TrackerClient,
}

impl Backfill for ByInternalId<'_> {
  fn name(&self) -> &'static str {
    "internal_id"
  }

  fn lookup(&self, cand: &Candidate) -> Option<Result<IssueRecord, FetchError>> {
    let id = cand.internal_id.as_deref()?;
    Some(self.client.issue(id, ISSUE_FIELDS))
  }
}

struct ByReadableId<'a> {
  client: &'a TrackerClient,
}

impl Backfill for ByReadableId<'_> {
  fn name(&self) -> &'static str {
    "readable_id"
  }

  fn lookup(&self, cand: &Candidate) -> Option<Result<IssueRecord, FetchError>> {
    let id = cand.readable_id.as_deref()?;
    Some(self.client.issue(id, ISSUE_FIELDS))
  }
}

/// Linked tasks of one deployment plus what was observed while resolving them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
  pub linked: Vec<LinkedTaskRecord>,
  pub seen_link_types: BTreeSet<String>,
  pub lookup_failures: u64,
  /// Name of the source that supplied the links, if any did.
  pub source: Option<&'static str>,
}

pub struct LinkResolver<'a> {
  sources: Vec<Box<dyn LinkSource + 'a>>,
  backfills: Vec<Box<dyn Backfill + 'a>>,
  link_types: &'a NameSet,
}

impl<'a> LinkResolver<'a> {
  pub fn new(client: &'a TrackerClient, link_types: &'a NameSet) -> Self {
    Self {
      sources: vec![Box::new(EmbeddedLinks), Box::new(LinksEndpoint { client })],
      backfills: vec![Box::new(ByInternalId { client }), Box::new(ByReadableId { client })],
      link_types,
    }
  }

  pub fn resolve(&self, deployment: &IssueRecord) -> Resolution {
    let mut res = Resolution::default();
    let candidates = self.collect_candidates(deployment, &mut res);

    let mut seen_keys: HashSet<String> = HashSet::new();

    for cand in candidates {
      let cand = self.backfill(deployment, cand, &mut res);

      let Some(record) = cand.into_record() else {
        tracing::debug!(deployment = deployment.display_id(), "linked issue without a usable key dropped");
        continue;
      };

      if seen_keys.insert(record.id.clone()) {
        res.linked.push(record);
      }
    }

    res
  }

  fn collect_candidates(&self, deployment: &IssueRecord, res: &mut Resolution) -> Vec<Candidate> {
    for source in &self.sources {
      let groups = match source.links(deployment) {
        Ok(g) => g,
        Err(e) => {
          res.lookup_failures += 1;
          tracing::warn!(deployment = deployment.display_id(), source = source.name(), error = %e, "link source failed");
          continue;
        }
      };

      let mut candidates = Vec::new();

      for group in &groups {
        let Some(type_name) = group.link_type.as_deref() else { continue };
        res.seen_link_types.insert(type_name.to_string());

        if self.link_types.contains(type_name) {
          candidates.extend(group.issues.iter().map(Candidate::from_issue));
        }
      }

      if !candidates.is_empty() {
        res.source = Some(source.name());
        return candidates;
      }
    }

    Vec::new()
  }

  fn backfill(&self, deployment: &IssueRecord, mut cand: Candidate, res: &mut Resolution) -> Candidate {
    for lookup in &self.backfills {
      if cand.is_complete() {
        break;
      }

      match lookup.lookup(&cand) {
        None => continue,
        Some(Ok(issue)) => {
          // the issue itself may lack a field; another lookup would not add it
          cand.absorb(Candidate::from_issue(&issue));
          break;
        }
        Some(Err(e)) => {
          res.lookup_failures += 1;
          tracing::warn!(
            deployment = deployment.display_id(),
            lookup = lookup.name(),
            error = %e,
            "linked issue backfill failed; keeping partial record"
          );
        }
      }
    }

    cand
  }
}

/// Deployments matching a query, each resolved to its linked tasks.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct DeploymentBatch {
  pub deployments: Vec<DeploymentRecord>,
  pub seen_link_types: BTreeSet<String>,
  pub lookup_failures: u64,
}

/// Resolve every deployment yielded by `pager`.
///
/// A failure of the deployment search itself propagates; per-deployment link
/// failures only increment `lookup_failures`.
pub fn collect_deployments(
  client: &TrackerClient,
  pager: IssuePager<'_>,
  link_types: &NameSet,
) -> Result<DeploymentBatch, FetchError> {
  let resolver = LinkResolver::new(client, link_types);
  let mut batch = DeploymentBatch::default();
  tracing::debug!(query = pager.query(), "collecting deployments");

  for issue in pager {
    let issue = issue?;
    let res = resolver.resolve(&issue);

    tracing::debug!(
      deployment = issue.display_id(),
      linked = res.linked.len(),
      source = res.source.unwrap_or("none"),
      "deployment resolved"
    );

    batch.seen_link_types.extend(res.seen_link_types);
    batch.lookup_failures += res.lookup_failures;
    batch.deployments.push(DeploymentRecord {
      deployment_id: issue.display_id().to_string(),
      title: issue.summary.clone().unwrap_or_default(),
      due_date: fields::due_date(&issue),
      linked: res.linked,
    });
  }

  Ok(batch)
}
