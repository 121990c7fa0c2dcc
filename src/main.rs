use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod aggregate;
mod cli;
mod error;
mod ext;
mod fields;
mod links;
mod model;
mod period;
mod query;
mod report;
mod tracker;
mod util;

use crate::cli::{Cli, normalize};

fn main() -> Result<()> {
  // stdout carries the JSON report; diagnostics go to stderr
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  if cli.gen_man {
    let page = util::render_man_page::<Cli>()?;
    print!("{}", page);
    return Ok(());
  }

  // Phase 1: normalize CLI + environment into one snapshot
  let cfg = normalize(cli)?;

  // Phase 2: build the requested view
  let client = tracker::connect(&cfg);
  let report = report::run(&cfg, &client)?;

  // Phase 3: emit
  util::write_output(&cfg.out, &report)
}
