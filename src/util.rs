// === Module Header (agents-tooling) START ===
// purpose: Small helpers shared by the CLI: reference date, report output, man page rendering
// role: utilities/helpers
// inputs: Optional date override; JSON values; output target; clap CommandFactory
// outputs: NaiveDate; files or stdout bytes; man page text
// side_effects: write_output creates parent directories and writes files or stdout
// invariants:
// - "-" always means stdout; any other target is a file path whose parent is created on demand
// - JSON is written pretty-printed with a trailing newline
// errors: IO errors bubble with the target path as context
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::CommandFactory;

/// Returns the effective "today" given an optional override.
///
/// Period windows are computed from this date, so tests pin it instead of
/// reading the clock.
pub fn effective_today(override_today: Option<NaiveDate>) -> NaiveDate {
  override_today.unwrap_or_else(|| Local::now().date_naive())
}

/// Write `report` as pretty JSON to `out` ("-" for stdout).
pub fn write_output(out: &str, report: &serde_json::Value) -> Result<()> {
  let mut bytes = serde_json::to_vec_pretty(report)?;
  bytes.push(b'\n');

  if out == "-" {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&bytes)?;
    stdout.flush()?;
    return Ok(());
  }

  let path = Path::new(out);
  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
  }
  std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
  tracing::info!(path = %path.display(), "report written");

  Ok(())
}

/// Render a section-1 man page for a clap `CommandFactory` implementor.
/// Returns the troff content as a UTF-8 string.
pub fn render_man_page<T: CommandFactory>() -> anyhow::Result<String> {
  let cmd = T::command();
  let man = clap_mangen::Man::new(cmd);
  let mut buf: Vec<u8> = Vec::new();

  man.render(&mut buf)?;

  Ok(String::from_utf8_lossy(&buf).to_string())
}
