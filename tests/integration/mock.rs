use chrono::{DateTime, NaiveDate};
use regex::Regex;
use serde_json::Value;
use test_support::{MockTracker, RecordedRequest, cmd_bin, error_status, json_ok, read_fixture_json};

pub const BIN: &str = "youtrack-activity-report";
pub const TOKEN: &str = "perm:test-token";

/// Tracker serving the JSON fixtures, paged by `$top`/`$skip`.
pub fn tracker() -> MockTracker {
  MockTracker::start(route)
}

/// Tracker answering every request with `status`.
pub fn failing_tracker(status: u16) -> MockTracker {
  MockTracker::start(move |_| error_status(status))
}

fn route(req: &RecordedRequest) -> (u16, String) {
  match req.path.as_str() {
    "/api/issues" => {
      let query = req.param("query").unwrap_or_default();
      let fixture = if query.contains("Type: {Deployment}") {
        "deployments.json"
      } else {
        "summary_issues.json"
      };
      let all: Vec<Value> = read_fixture_json(fixture);
      page(all.into_iter().filter(|issue| matches_query(issue, query)).collect(), req)
    }
    "/api/issues/2-101/links" => json_ok(&read_fixture_json::<Value, _>("links_2-101.json")),
    "/api/issues/2-12" => json_ok(&read_fixture_json::<Value, _>("issue_2-12.json")),
    _ => error_status(404),
  }
}

/// Apply the query's project and `created:` predicates to a fixture issue.
fn matches_query(issue: &Value, query: &str) -> bool {
  let projects: Vec<&str> = Regex::new(r"project: \{([A-Z0-9_]+)\}")
    .unwrap()
    .captures_iter(query)
    .filter_map(|c| c.get(1).map(|m| m.as_str()))
    .collect();
  let project = issue["project"]["shortName"].as_str().unwrap_or_default();
  if !projects.is_empty() && !projects.contains(&project) {
    return false;
  }

  let range = Regex::new(r"created: \{(\d{4}-\d{2}-\d{2})\} \.\. \{(\d{4}-\d{2}-\d{2})\}")
    .unwrap()
    .captures(query)
    .map(|c| (c[1].parse::<NaiveDate>().unwrap(), c[2].parse::<NaiveDate>().unwrap()));
  let Some((start, end)) = range else { return true };

  issue["created"]
    .as_i64()
    .and_then(DateTime::from_timestamp_millis)
    .map(|t| t.date_naive())
    .is_some_and(|d| start <= d && d <= end)
}

fn page(all: Vec<Value>, req: &RecordedRequest) -> (u16, String) {
  let skip: usize = req.param("$skip").and_then(|s| s.parse().ok()).unwrap_or(0);
  let top: usize = req.param("$top").and_then(|s| s.parse().ok()).unwrap_or(100);
  let slice: Vec<Value> = all.into_iter().skip(skip).take(top).collect();
  json_ok(&Value::Array(slice))
}

/// The binary pointed at `tracker`, with a pinned reference date and no retries.
pub fn report_cmd(tracker: &MockTracker, args: &[&str]) -> assert_cmd::Command {
  let mut cmd = cmd_bin(BIN);
  cmd
    .env_remove("YOUTRACK_URL")
    .env_remove("YOUTRACK_TOKEN")
    .args(["--base-url", &tracker.base_url(), "--token", TOKEN])
    .args(["--today", "2025-08-15", "--retries", "0"])
    .args(args);
  cmd
}

pub fn stdout_json(cmd: &mut assert_cmd::Command) -> Value {
  let out = cmd.assert().success().get_output().stdout.clone();
  serde_json::from_slice(&out).expect("stdout is JSON")
}
