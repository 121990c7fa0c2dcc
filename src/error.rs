// === Module Header (agents-tooling) START ===
// purpose: Typed errors for period resolution and tracker fetches
// role: errors/types
// outputs: UnknownPeriodKey, FetchError
// invariants: FetchError always names the query or identifier that failed; status only when the server answered
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use thiserror::Error;

/// A period key outside the recognized enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown period key {key:?}; expected one of: {}", .valid.join(", "))]
pub struct UnknownPeriodKey {
  pub key: String,
  pub valid: Vec<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
  /// Server answered with a non-2xx status.
  Status,
  /// Connect, DNS, TLS or timeout failure; no response.
  Transport,
  /// Response arrived but was not the JSON shape expected.
  Decode,
}

/// Network, transport, non-2xx or decode failure at a tracker endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("fetch failed for {target}{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
pub struct FetchError {
  /// Query string or issue identifier the request was made for.
  pub target: String,
  pub kind: FetchErrorKind,
  pub status: Option<u16>,
  pub message: String,
}

impl FetchError {
  pub fn status(target: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
    Self {
      target: target.into(),
      kind: FetchErrorKind::Status,
      status: Some(status),
      message: message.into(),
    }
  }

  pub fn transport(target: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      target: target.into(),
      kind: FetchErrorKind::Transport,
      status: None,
      message: message.into(),
    }
  }

  pub fn decode(target: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      target: target.into(),
      kind: FetchErrorKind::Decode,
      status: None,
      message: format!("unexpected response body: {}", message.into()),
    }
  }

  /// Re-label an error with the caller-facing target (e.g. the search query
  /// instead of the request path).
  pub fn for_target(mut self, target: impl Into<String>) -> Self {
    self.target = target.into();
    self
  }
}
