use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::error::UnknownPeriodKey;

// Period keys and the calendar arithmetic behind them live here so the
// query and aggregation layers only ever see concrete dates.

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum PeriodKey {
  CurrentMonth,
  PreviousMonth,
  Last6Months,
  Last1Year,
}

impl PeriodKey {
  pub const ALL: [PeriodKey; 4] = [
    PeriodKey::CurrentMonth,
    PeriodKey::PreviousMonth,
    PeriodKey::Last6Months,
    PeriodKey::Last1Year,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      PeriodKey::CurrentMonth => "current_month",
      PeriodKey::PreviousMonth => "previous_month",
      PeriodKey::Last6Months => "last_6_months",
      PeriodKey::Last1Year => "last_1_year",
    }
  }

  /// Display label used by dashboards for dropdowns.
  pub fn label(self) -> &'static str {
    match self {
      PeriodKey::CurrentMonth => "Current Month",
      PeriodKey::PreviousMonth => "Previous Month",
      PeriodKey::Last6Months => "Last 6 Months",
      PeriodKey::Last1Year => "Last 1 Year",
    }
  }

  pub fn valid_keys() -> Vec<&'static str> {
    Self::ALL.iter().map(|k| k.as_str()).collect()
  }

  /// Inclusive `(start, end)` for this key relative to `today`.
  pub fn range(self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let (y, m) = (today.year(), today.month());
    let end_of_this = month_end(y, m);

    match self {
      PeriodKey::CurrentMonth => (month_start(y, m), end_of_this),
      PeriodKey::PreviousMonth => {
        let (py, pm) = shift_month(y, m, -1);
        (month_start(py, pm), month_end(py, pm))
      }
      PeriodKey::Last6Months => {
        let (sy, sm) = shift_month(y, m, -5);
        (month_start(sy, sm), end_of_this)
      }
      PeriodKey::Last1Year => (month_start(y - 1, m), end_of_this),
    }
  }
}

impl fmt::Display for PeriodKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for PeriodKey {
  type Err = UnknownPeriodKey;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let wanted = s.trim().to_lowercase();

    PeriodKey::ALL
      .into_iter()
      .find(|k| k.as_str() == wanted)
      .ok_or_else(|| UnknownPeriodKey {
        key: s.to_string(),
        valid: PeriodKey::valid_keys(),
      })
  }
}

impl Serialize for PeriodKey {
  fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(self.as_str())
  }
}

/// Resolved period, carried into reports so consumers can label output.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ResolvedPeriod {
  pub key: PeriodKey,
  pub label: &'static str,
  pub start: NaiveDate,
  pub end: NaiveDate,
}

impl ResolvedPeriod {
  pub fn new(key: PeriodKey, today: NaiveDate) -> Self {
    let (start, end) = key.range(today);
    Self {
      key,
      label: key.label(),
      start,
      end,
    }
  }

  /// Query fragment restricting `field` to this period.
  pub fn fragment(&self, field: &str) -> String {
    date_range_fragment(field, self.start, self.end)
  }
}

/// Resolve a period key string to an inclusive date range.
pub fn resolve(period_key: &str, today: NaiveDate) -> Result<(NaiveDate, NaiveDate), UnknownPeriodKey> {
  Ok(period_key.parse::<PeriodKey>()?.range(today))
}

/// Build `field: {start} .. {end}` for the given key, anchored at today's local date.
#[allow(dead_code)]
pub fn field_filter(field: &str, period_key: &str) -> Result<String, UnknownPeriodKey> {
  field_filter_at(field, period_key, Local::now().date_naive())
}

/// Like [`field_filter`] with an explicit reference date.
pub fn field_filter_at(field: &str, period_key: &str, today: NaiveDate) -> Result<String, UnknownPeriodKey> {
  let (start, end) = resolve(period_key, today)?;
  Ok(date_range_fragment(field, start, end))
}

pub fn date_range_fragment(field: &str, start: NaiveDate, end: NaiveDate) -> String {
  format!("{}: {{{}}} .. {{{}}}", field, start.format("%Y-%m-%d"), end.format("%Y-%m-%d"))
}

/// Parse a fragment produced by [`date_range_fragment`] back into `(field, start, end)`.
#[allow(dead_code)]
pub fn parse_range_fragment(fragment: &str) -> Option<(String, NaiveDate, NaiveDate)> {
  static RE_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.+?):\s*\{(\d{4}-\d{2}-\d{2})\}\s*\.\.\s*\{(\d{4}-\d{2}-\d{2})\}$").unwrap()
  });

  let caps = RE_RANGE.captures(fragment.trim())?;
  let field = caps.get(1)?.as_str().trim().to_string();
  let start = NaiveDate::parse_from_str(caps.get(2)?.as_str(), "%Y-%m-%d").ok()?;
  let end = NaiveDate::parse_from_str(caps.get(3)?.as_str(), "%Y-%m-%d").ok()?;

  Some((field, start, end))
}

/// Inclusive bounds of a calendar month.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
  if !(1..=12).contains(&month) {
    return None;
  }
  Some((month_start(year, month), month_end(year, month)))
}

fn month_start(year: i32, month: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

fn month_end(year: i32, month: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(year, month, last_day_of_month(year, month)).unwrap_or(NaiveDate::MAX)
}

pub fn last_day_of_month(year: i32, month: u32) -> u32 {
  // Advance to first day of next month, subtract one day
  let (ny, nm) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
  NaiveDate::from_ymd_opt(ny, nm, 1)
    .and_then(|first_next| first_next.pred_opt())
    .map(|last| last.day())
    .unwrap_or(28)
}

/// Move `(year, month)` by `delta` months, rolling over year boundaries.
pub fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
  let total = year * 12 + month as i32 - 1 + delta;
  (total.div_euclid(12), (total.rem_euclid(12) + 1) as u32)
}
