// === Module Header (agents-tooling) START ===
// purpose: Fold issue streams into nested count trees (project/type/state and month/type) with type exclusion
// role: aggregation/counts
// inputs: Iterator of Result<IssueRecord, FetchError>; exclusion NameSet; seed projects or target year
// outputs: ProjectSummary, MonthlySummary (each with raw/kept diagnostics; monthly also keeps the query per month)
// invariants:
// - Excluded types never appear in any bucket but are counted in `raw`
// - Every leaf equals the number of kept issues with that exact key path
// - Monthly trees hold every month key Jan..through_month, empty when no issues matched
// - A month's bucket counts exactly what that month's query returned; creation timestamps are not re-bucketed
// - The first stream error aborts the fold and propagates
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::error::FetchError;
use crate::fields::{self, UNSPECIFIED};
use crate::model::{Diagnostics, IssueRecord, MonthCounts, NameSet, ProjectCounts, TypeCounts, TypeStateCounts};

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ProjectSummary {
  pub per_project: ProjectCounts,
  pub overall: TypeStateCounts,
  pub debug: Diagnostics,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct MonthlyDiagnostics {
  /// month key -> query its bucket was counted from
  pub queries: BTreeMap<String, String>,
  pub raw: u64,
  pub after_exclude: u64,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct MonthlySummary {
  pub months: MonthCounts,
  pub debug: MonthlyDiagnostics,
}

impl MonthlySummary {
  /// Every month key of `year` from January through `through_month`, each empty.
  pub fn seeded(year: i32, through_month: u32) -> Self {
    let mut out = Self::default();
    for m in 1..=through_month.min(12) {
      out.months.insert(month_key(year, m), TypeCounts::new());
    }
    out
  }

  /// Count one month's query result into that month's bucket.
  pub fn count_month<I>(&mut self, year: i32, month: u32, query: String, issues: I, exclusions: &NameSet) -> Result<(), FetchError>
  where
    I: IntoIterator<Item = Result<IssueRecord, FetchError>>,
  {
    let key = month_key(year, month);
    let bucket = self.months.entry(key.clone()).or_default();

    for issue in issues {
      let issue = issue?;
      self.debug.raw += 1;

      let Some(itype) = counted_type(&issue, exclusions) else { continue };
      *bucket.entry(itype).or_default() += 1;
      self.debug.after_exclude += 1;
    }

    self.debug.queries.insert(key, query);
    Ok(())
  }
}

/// Type name for counting, or `None` when the type is excluded.
fn counted_type(issue: &IssueRecord, exclusions: &NameSet) -> Option<String> {
  let itype = fields::issue_type(issue).unwrap_or_else(|| UNSPECIFIED.to_string());
  (!exclusions.contains(&itype)).then_some(itype)
}

/// project -> type -> state counts plus an overall type -> state tree.
///
/// `seed_projects` get an (empty) entry even when nothing matched, so callers can
/// distinguish "configured but idle" from "unknown project".
pub fn aggregate_by_project<I>(issues: I, exclusions: &NameSet, seed_projects: &[String]) -> Result<ProjectSummary, FetchError>
where
  I: IntoIterator<Item = Result<IssueRecord, FetchError>>,
{
  let mut out = ProjectSummary::default();
  for p in seed_projects {
    out.per_project.entry(p.clone()).or_default();
  }

  for issue in issues {
    let issue = issue?;
    out.debug.raw += 1;

    let Some(itype) = counted_type(&issue, exclusions) else { continue };
    let istate = fields::issue_state(&issue).unwrap_or_else(|| UNSPECIFIED.to_string());

    let Some(project) = issue.project.clone() else {
      tracing::debug!(issue = issue.display_id(), "issue without project skipped");
      continue;
    };

    *out
      .per_project
      .entry(project)
      .or_default()
      .entry(itype.clone())
      .or_default()
      .entry(istate.clone())
      .or_default() += 1;
    *out.overall.entry(itype).or_default().entry(istate).or_default() += 1;

    out.debug.after_exclude += 1;
  }

  Ok(out)
}

/// Collapse a type -> state tree into type -> total.
pub fn type_totals(tree: &TypeStateCounts) -> TypeCounts {
  tree
    .iter()
    .map(|(t, states)| (t.clone(), states.values().sum()))
    .collect()
}

/// Months covered for `year` as seen from `today`: Jan..current month for the
/// current year, all twelve for past years, none for future years.
pub fn months_through(year: i32, today: NaiveDate) -> u32 {
  match year.cmp(&today.year()) {
    std::cmp::Ordering::Less => 12,
    std::cmp::Ordering::Equal => today.month(),
    std::cmp::Ordering::Greater => 0,
  }
}

pub fn month_key(year: i32, month: u32) -> String {
  format!("{year:04}-{month:02}")
}
