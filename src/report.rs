// === Module Header (agents-tooling) START ===
// purpose: Assemble the JSON views (summary, monthly, deployments, metadata) from the tracker for one configuration
// role: report/orchestrator
// inputs: EffectiveConfig; TrackerClient
// outputs: serde_json::Value per view
// side_effects: Network calls through the client; logs per-view totals
// invariants:
// - Every count view carries the exact query it ran under debug (monthly: one query per month key)
// - Summary cards sort by descending total then type; states by descending count then state
// - Deployment rows sort by deploy date descending (undated last) then task id descending
// - An empty match set yields an empty report, never an error
// errors: Top-level search failures propagate with the view and query as context
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::aggregate::{self, MonthlySummary};
use crate::cli::{EffectiveConfig, View};
use crate::fields::UNSPECIFIED;
use crate::links::{self, DeploymentBatch};
use crate::model::{
  DEPLOYMENT_FIELDS, DeploymentRecord, Diagnostics, ISSUE_FIELDS, ProjectCounts, TypeCounts, TypeStateCounts,
};
use crate::period::{self, PeriodKey, ResolvedPeriod};
use crate::query::{QueryBuilder, issues_url};
use crate::tracker::cache::DEFAULT_TTL;
use crate::tracker::client::TrackerClient;
use crate::tracker::metadata::{Metadata, ProjectMap};
use crate::tracker::pager;

/// Field the summary and monthly views filter on.
pub const CREATED_FIELD: &str = "created";
/// Field deployments are scheduled by.
pub const DUE_DATE_FIELD: &str = "Due Date";
/// Upper bound on users read for the assignee map.
pub const MAX_USERS: usize = 5000;

/// KPI order for deployed task types; unlisted types follow alphabetically.
pub const PREFERRED_TYPE_ORDER: &[&str] = &[
  "Bug",
  "Change Request",
  "New Requirement",
  "Enhancement",
  "System Understanding",
  "Tech Task",
  "Exceptional Cases",
  "External Dependency",
  "End User Mistake",
];

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StateLine {
  pub state: String,
  pub count: u64,
  pub href: String,
}

/// One project/type tile of the summary view.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Card {
  pub project: String,
  #[serde(rename = "type")]
  pub issue_type: String,
  pub total: u64,
  pub href: String,
  pub states: Vec<StateLine>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
  pub view: &'static str,
  pub period: ResolvedPeriod,
  pub projects: Vec<String>,
  pub per_project: ProjectCounts,
  pub overall: TypeStateCounts,
  pub type_totals: TypeCounts,
  pub cards: Vec<Card>,
  pub debug: Diagnostics,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyReport {
  pub view: &'static str,
  pub project: String,
  pub year: i32,
  pub through_month: u32,
  #[serde(flatten)]
  pub summary: MonthlySummary,
}

/// A deployment/task pair, flattened for tabular display.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DeploymentRow {
  pub deployment_id: String,
  pub task_id: String,
  pub title: String,
  #[serde(rename = "type")]
  pub issue_type: String,
  pub state: String,
  pub created_on: Option<NaiveDate>,
  pub deployed_on: Option<NaiveDate>,
  pub href: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TypeKpi {
  #[serde(rename = "type")]
  pub issue_type: String,
  pub count: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DeploymentKpis {
  pub total_deployments: usize,
  pub deployed_tasks: usize,
  pub by_type: Vec<TypeKpi>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeploymentDebug {
  pub query: String,
  pub lookup_failures: u64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub discovered_link_types: Option<BTreeSet<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeploymentsReport {
  pub view: &'static str,
  pub project: String,
  pub period: ResolvedPeriod,
  pub link_types: Vec<String>,
  pub deployments: Vec<DeploymentRecord>,
  pub rows: Vec<DeploymentRow>,
  pub kpis: DeploymentKpis,
  pub debug: DeploymentDebug,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectReference {
  pub types: Vec<String>,
  pub states: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetadataReport {
  pub view: &'static str,
  pub projects: ProjectMap,
  pub fields: BTreeMap<String, ProjectReference>,
  pub assignees: BTreeMap<String, String>,
}

/// Build the configured view.
pub fn run(cfg: &EffectiveConfig, client: &TrackerClient) -> Result<serde_json::Value> {
  let value = match cfg.view {
    View::Summary => serde_json::to_value(summary(cfg, client, cfg.period)?)?,
    View::Monthly => serde_json::to_value(monthly(cfg, client, &cfg.project, cfg.year.unwrap_or(cfg.today.year()))?)?,
    View::Deployments => serde_json::to_value(deployments(cfg, client, &cfg.project, cfg.period)?)?,
    View::Metadata => serde_json::to_value(metadata(cfg, client)?)?,
  };

  Ok(value)
}

pub fn summary(cfg: &EffectiveConfig, client: &TrackerClient, key: PeriodKey) -> Result<SummaryReport> {
  let period = ResolvedPeriod::new(key, cfg.today);
  let fragment = period.fragment(CREATED_FIELD);
  let query = QueryBuilder::new(&cfg.projects).period(fragment.as_str()).build()?;

  let issues = pager::fetch(client, &query, ISSUE_FIELDS, cfg.page_size);
  let mut counts = aggregate::aggregate_by_project(issues, &cfg.excluded_types, &cfg.projects)
    .with_context(|| format!("summary for {key} failed"))?;
  counts.debug.query = query;

  tracing::info!(period = %key, raw = counts.debug.raw, kept = counts.debug.after_exclude, "summary built");

  let cards = build_cards(&cfg.base_url, &fragment, &counts.per_project)?;

  Ok(SummaryReport {
    view: "summary",
    type_totals: aggregate::type_totals(&counts.overall),
    period,
    projects: cfg.projects.clone(),
    per_project: counts.per_project,
    overall: counts.overall,
    cards,
    debug: counts.debug,
  })
}

/// Cards for every project/type pair, each with drill-down links filtered down to that type (and state).
pub fn build_cards(base_url: &str, fragment: &str, per_project: &ProjectCounts) -> Result<Vec<Card>> {
  let mut cards = Vec::new();

  for (project, types) in per_project {
    let mut project_cards = Vec::new();

    for (itype, states) in types {
      let href_for = |state: Option<&str>| -> Result<String> {
        let q = QueryBuilder::new([project])
          .period(fragment)
          .issue_type(Some(itype.as_str()))
          .state(state)
          .build()?;
        Ok(issues_url(base_url, &q))
      };

      let mut lines = states
        .iter()
        .map(|(state, count)| {
          Ok(StateLine {
            state: state.clone(),
            count: *count,
            href: href_for(Some(state.as_str()))?,
          })
        })
        .collect::<Result<Vec<_>>>()?;
      lines.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.state.cmp(&b.state)));

      project_cards.push(Card {
        project: project.clone(),
        issue_type: itype.clone(),
        total: states.values().sum(),
        href: href_for(None)?,
        states: lines,
      });
    }

    project_cards.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.issue_type.cmp(&b.issue_type)));
    cards.extend(project_cards);
  }

  Ok(cards)
}

/// Type counts per month of `year` for one project, one query per month.
pub fn monthly(cfg: &EffectiveConfig, client: &TrackerClient, project: &str, year: i32) -> Result<MonthlyReport> {
  let through_month = aggregate::months_through(year, cfg.today);
  let mut summary = MonthlySummary::seeded(year, through_month);

  for month in 1..=through_month {
    let (start, end) = period::month_bounds(year, month).context("month out of range")?;
    let query = QueryBuilder::new([project])
      .period(period::date_range_fragment(CREATED_FIELD, start, end))
      .build()?;

    let issues = pager::fetch(client, &query, ISSUE_FIELDS, cfg.page_size);
    summary
      .count_month(year, month, query, issues, &cfg.excluded_types)
      .with_context(|| format!("monthly trend for {project} {} failed", aggregate::month_key(year, month)))?;
  }

  tracing::info!(project, year, through_month, kept = summary.debug.after_exclude, "monthly trend built");

  Ok(MonthlyReport {
    view: "monthly",
    project: project.to_string(),
    year,
    through_month,
    summary,
  })
}

pub fn deployments(cfg: &EffectiveConfig, client: &TrackerClient, project: &str, key: PeriodKey) -> Result<DeploymentsReport> {
  let period = ResolvedPeriod::new(key, cfg.today);
  let query = QueryBuilder::new([project])
    .period(period.fragment(DUE_DATE_FIELD))
    .issue_type(Some(cfg.deployment_type.as_str()))
    .build()?;

  let issues = pager::fetch(client, &query, DEPLOYMENT_FIELDS, cfg.page_size);
  let DeploymentBatch {
    deployments,
    seen_link_types,
    lookup_failures,
  } = links::collect_deployments(client, issues, &cfg.link_types)
    .with_context(|| format!("deployments for {project} failed"))?;

  let rows = deployment_rows(&cfg.base_url, &deployments);
  let kpis = deployment_kpis(deployments.len(), &rows);

  tracing::info!(
    project,
    deployments = kpis.total_deployments,
    tasks = kpis.deployed_tasks,
    lookup_failures,
    "deployments built"
  );

  Ok(DeploymentsReport {
    view: "deployments",
    project: project.to_string(),
    period,
    link_types: cfg.link_types.iter().map(str::to_string).collect(),
    deployments,
    rows,
    kpis,
    debug: DeploymentDebug {
      query,
      lookup_failures,
      discovered_link_types: cfg.discover_link_types.then_some(seen_link_types),
    },
  })
}

pub fn issue_url(base_url: &str, key: &str) -> String {
  format!("{}/issue/{}", base_url.trim_end_matches('/'), key)
}

pub fn deployment_rows(base_url: &str, deployments: &[DeploymentRecord]) -> Vec<DeploymentRow> {
  let mut rows: Vec<DeploymentRow> = deployments
    .iter()
    .flat_map(|dep| {
      dep.linked.iter().map(move |task| DeploymentRow {
        deployment_id: dep.deployment_id.clone(),
        task_id: task.id.clone(),
        title: task.title.clone(),
        issue_type: task.issue_type.clone().unwrap_or_else(|| UNSPECIFIED.to_string()),
        state: task.state.clone().unwrap_or_default(),
        created_on: task.created_on,
        deployed_on: dep.due_date,
        href: issue_url(base_url, &task.id),
      })
    })
    .collect();

  // None sorts below Some, so undated rows land last when descending
  rows.sort_by(|a, b| (b.deployed_on, &b.task_id).cmp(&(a.deployed_on, &a.task_id)));
  rows
}

pub fn deployment_kpis(total_deployments: usize, rows: &[DeploymentRow]) -> DeploymentKpis {
  let mut counts: BTreeMap<String, u64> = BTreeMap::new();
  for row in rows {
    *counts.entry(row.issue_type.clone()).or_default() += 1;
  }

  let mut by_type: Vec<TypeKpi> = PREFERRED_TYPE_ORDER
    .iter()
    .filter_map(|t| {
      counts.remove(*t).map(|count| TypeKpi {
        issue_type: t.to_string(),
        count,
      })
    })
    .collect();
  // what is left is already alphabetical
  by_type.extend(counts.into_iter().map(|(issue_type, count)| TypeKpi { issue_type, count }));

  DeploymentKpis {
    total_deployments,
    deployed_tasks: rows.len(),
    by_type,
  }
}

pub fn metadata(cfg: &EffectiveConfig, client: &TrackerClient) -> Result<MetadataReport> {
  let meta = Metadata::new(client, DEFAULT_TTL);

  let projects = meta.projects().context("loading projects")?;

  let mut fields = BTreeMap::new();
  for project in &cfg.projects {
    let reference = ProjectReference {
      types: meta.task_types(project).with_context(|| format!("loading types for {project}"))?,
      states: meta.task_states(project).with_context(|| format!("loading states for {project}"))?,
    };
    fields.insert(project.clone(), reference);
  }

  let assignees = meta.assignees(MAX_USERS, cfg.page_size).context("loading assignees")?;

  tracing::info!(projects = projects.len(), assignees = assignees.len(), "metadata loaded");

  Ok(MetadataReport {
    view: "metadata",
    projects,
    fields,
    assignees,
  })
}
