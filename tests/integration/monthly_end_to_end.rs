use serde_json::json;

use crate::mock;

#[test]
fn monthly_has_every_month_through_today() {
  let tracker = mock::tracker();
  let v = mock::stdout_json(&mut mock::report_cmd(&tracker, &["--view", "monthly", "--projects", "AT,AC"]));

  assert_eq!(v["project"], "AT");
  assert_eq!(v["year"], 2025);
  assert_eq!(v["through_month"], 8);
  let months = v["months"].as_object().unwrap();
  assert_eq!(
    months.keys().map(String::as_str).collect::<Vec<_>>(),
    ["2025-01", "2025-02", "2025-03", "2025-04", "2025-05", "2025-06", "2025-07", "2025-08"]
  );
  assert_eq!(months["2025-03"], json!({}));
  assert_eq!(months["2025-08"], json!({ "Bug": 2, "New Requirement": 1 }));
  assert_eq!(
    v["debug"]["queries"]["2025-08"],
    "project: {AT} created: {2025-08-01} .. {2025-08-31} has: -{subtask of}"
  );

  let searches = tracker.requests().into_iter().filter(|r| r.path == "/api/issues").count();
  assert_eq!(searches, 8);
}

#[test]
fn project_flag_selects_the_trend_project() {
  let tracker = mock::tracker();
  let v = mock::stdout_json(&mut mock::report_cmd(
    &tracker,
    &["--view", "monthly", "--projects", "AT,AC", "--project", "ac"],
  ));

  assert_eq!(v["project"], "AC");
  // the Deployment-typed AC issue stays excluded
  assert_eq!(v["months"]["2025-08"], json!({ "Unspecified": 1 }));
  assert_eq!((v["debug"]["raw"].as_u64(), v["debug"]["after_exclude"].as_u64()), (Some(2), Some(1)));
}

#[test]
fn past_year_covers_all_twelve_months() {
  let tracker = mock::tracker();
  let v = mock::stdout_json(&mut mock::report_cmd(&tracker, &["--view", "monthly", "--year", "2024"]));

  assert_eq!(v["through_month"], 12);
  assert_eq!(v["months"].as_object().unwrap().len(), 12);
  // fixture issues are all from 2025
  assert_eq!(v["debug"]["after_exclude"], 0);
}

#[test]
fn future_year_is_empty_without_requests() {
  let tracker = mock::tracker();
  let v = mock::stdout_json(&mut mock::report_cmd(&tracker, &["--view", "monthly", "--year", "2026"]));

  assert_eq!(v["months"], json!({}));
  assert!(tracker.requests().is_empty());
}
