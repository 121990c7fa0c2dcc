use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};

use crate::model::NameSet;
use crate::period::PeriodKey;
use crate::tracker::transport::RetryPolicy;
use crate::util;

pub const ENV_URL: &str = "YOUTRACK_URL";
pub const ENV_TOKEN: &str = "YOUTRACK_TOKEN";

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
  /// Per-project type/state counts with drill-down cards
  Summary,
  /// Per-month type counts for one project and year
  Monthly,
  /// Deployments and the tasks they shipped
  Deployments,
  /// Projects, type/state values and assignees
  Metadata,
}

#[derive(Parser, Debug)]
#[command(
    name = "youtrack-activity-report",
    version,
    about = "Export YouTrack issue activity (counts, monthly trend, deployments) to JSON",
    long_about = None
)]
pub struct Cli {
  /// Which report to produce
  #[arg(long, value_enum, default_value_t = View::Summary)]
  pub view: View,

  /// Period key: current_month, previous_month, last_6_months, last_1_year
  #[arg(long, default_value = "current_month")]
  pub period: String,

  /// Project for the deployments and monthly views (default: first of --projects)
  #[arg(long)]
  pub project: Option<String>,

  /// Project short codes counted by the summary and metadata views
  #[arg(long, value_delimiter = ',', default_value = "APLUS,AT,AC")]
  pub projects: Vec<String>,

  /// Issue types left out of every count
  #[arg(long, value_delimiter = ',', default_value = "Deployment")]
  pub exclude_types: Vec<String>,

  /// Link types that tie a task to a deployment
  #[arg(long, value_delimiter = ',', default_value = "relates,subtask")]
  pub link_types: Vec<String>,

  /// Issue type that marks a deployment
  #[arg(long, default_value = "Deployment")]
  pub deployment_type: String,

  /// Year for the monthly view (default: current year)
  #[arg(long)]
  pub year: Option<i32>,

  /// Issues requested per page
  #[arg(long, default_value_t = 100)]
  pub page_size: usize,

  /// Per-request timeout in seconds
  #[arg(long, default_value_t = 20)]
  pub timeout_secs: u64,

  /// Retries for transient HTTP failures (429/5xx, connection errors)
  #[arg(long, default_value_t = 3)]
  pub retries: u32,

  /// Tracker base URL (falls back to $YOUTRACK_URL)
  #[arg(long)]
  pub base_url: Option<String>,

  /// Permanent token (falls back to $YOUTRACK_TOKEN)
  #[arg(long)]
  pub token: Option<String>,

  /// Include every link type seen while resolving deployments
  #[arg(long)]
  pub discover_link_types: bool,

  /// Output file path (default stdout "-")
  #[arg(long, default_value = "-")]
  pub out: String,

  /// Reference date YYYY-MM-DD used instead of today (hidden; tests only)
  #[arg(long, hide = true)]
  pub today: Option<String>,

  /// Emit a troff man page to stdout (internal; for packaging)
  #[arg(long, hide = true)]
  pub gen_man: bool,
}

/// Immutable run configuration, built once and passed by reference.
#[derive(Debug, Clone)]
pub struct EffectiveConfig {
  pub view: View,
  pub period: PeriodKey,
  pub projects: Vec<String>,
  pub project: String,
  pub excluded_types: NameSet,
  pub link_types: NameSet,
  pub deployment_type: String,
  pub year: Option<i32>,
  pub page_size: usize,
  pub base_url: String,
  pub token: String,
  pub timeout: Duration,
  pub retry: RetryPolicy,
  pub discover_link_types: bool,
  pub out: String,
  pub today: NaiveDate,
}

pub fn normalize(cli: Cli) -> Result<EffectiveConfig> {
  let period: PeriodKey = cli.period.parse()?;

  let projects: Vec<String> = cli
    .projects
    .iter()
    .map(|p| p.trim().to_uppercase())
    .filter(|p| !p.is_empty())
    .collect();
  if projects.is_empty() {
    bail!("--projects needs at least one project code");
  }

  let project = match cli.project.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
    Some(p) => p.to_uppercase(),
    None => projects[0].clone(),
  };

  if cli.page_size == 0 {
    bail!("--page-size must be at least 1");
  }

  let base_url = flag_or_env(cli.base_url, ENV_URL).map(|u| u.trim_end_matches('/').to_string());
  let token = flag_or_env(cli.token, ENV_TOKEN);
  let (Some(base_url), Some(token)) = (base_url.filter(|u| !u.is_empty()), token) else {
    bail!("tracker connection not configured: set {ENV_URL} and {ENV_TOKEN} (or pass --base-url/--token)");
  };

  let today_override = cli
    .today
    .as_deref()
    .map(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").with_context(|| format!("invalid --today {s:?}")))
    .transpose()?;

  Ok(EffectiveConfig {
    view: cli.view,
    period,
    projects,
    project,
    excluded_types: NameSet::from_names(&cli.exclude_types),
    link_types: NameSet::from_names(&cli.link_types),
    deployment_type: cli.deployment_type.trim().to_string(),
    year: cli.year,
    page_size: cli.page_size,
    base_url,
    token,
    timeout: Duration::from_secs(cli.timeout_secs),
    retry: RetryPolicy {
      max_retries: cli.retries,
      ..RetryPolicy::default()
    },
    discover_link_types: cli.discover_link_types,
    out: cli.out,
    today: util::effective_today(today_override),
  })
}

fn flag_or_env(flag: Option<String>, var: &str) -> Option<String> {
  flag
    .or_else(|| std::env::var(var).ok())
    .map(|v| v.trim().to_string())
    .filter(|v| !v.is_empty())
}
