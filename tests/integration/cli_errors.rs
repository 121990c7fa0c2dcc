use predicates::prelude::*;
use serial_test::serial;
use test_support::{cmd_bin, with_env};

use crate::mock::{self, BIN, TOKEN};

#[test]
fn unknown_period_lists_valid_keys() {
  let tracker = mock::tracker();
  mock::report_cmd(&tracker, &["--period", "fortnight"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("unknown period key \"fortnight\""))
    .stderr(predicate::str::contains("current_month, previous_month, last_6_months, last_1_year"));

  assert!(tracker.requests().is_empty());
}

#[test]
fn missing_connection_settings_name_both_variables() {
  cmd_bin(BIN)
    .env_remove("YOUTRACK_URL")
    .env_remove("YOUTRACK_TOKEN")
    .assert()
    .failure()
    .stderr(predicate::str::contains("YOUTRACK_URL").and(predicate::str::contains("YOUTRACK_TOKEN")));
}

#[test]
#[serial]
fn connection_settings_fall_back_to_environment() {
  let tracker = mock::tracker();
  let base = tracker.base_url();
  let _env = with_env(&[("YOUTRACK_URL", base.as_str()), ("YOUTRACK_TOKEN", TOKEN)]);

  cmd_bin(BIN)
    .args(["--today", "2025-08-15", "--projects", "AT"])
    .assert()
    .success();

  let reqs = tracker.requests();
  assert_eq!(reqs.len(), 1);
  assert_eq!(reqs[0].authorization.as_deref(), Some("Bearer perm:test-token"));
}

#[test]
fn top_level_fetch_failure_exits_non_zero_with_query() {
  let tracker = mock::failing_tracker(500);
  mock::report_cmd(&tracker, &["--projects", "AT"])
    .assert()
    .failure()
    .stdout(predicate::str::is_empty())
    .stderr(predicate::str::contains("HTTP 500"))
    .stderr(predicate::str::contains("project: {AT} created: {2025-08-01} .. {2025-08-31}"));
}
