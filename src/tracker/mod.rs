// === Module Header (agents-tooling) START ===
// purpose: Namespace for the tracker REST integration (transport, typed client, pager, metadata cache)
// role: tracker/namespace
// outputs: connect() building the retrying HTTP client from the effective config
// invariants: Components receive configuration explicitly; nothing here reads the environment
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

pub mod cache;
pub mod client;
pub mod metadata;
pub mod pager;
pub mod transport;

#[cfg(test)]
pub mod testing;

use crate::cli::EffectiveConfig;
use client::TrackerClient;
use transport::{HttpTransport, RetryingTransport};

/// HTTP client for the configured tracker, with the configured retry policy below it.
pub fn connect(cfg: &EffectiveConfig) -> TrackerClient {
  let http = HttpTransport::new(&cfg.base_url, &cfg.token, cfg.timeout);
  TrackerClient::new(Box::new(RetryingTransport::new(http, cfg.retry.clone())))
}
