// === Module Header (agents-tooling) START ===
// purpose: Plain authenticated GET-to-JSON against the tracker REST API, plus a retry wrapper for transient failures
// role: tracker/transport
// inputs: base URL, bearer token, timeout; request path and query parameters
// outputs: serde_json::Value bodies or FetchError
// side_effects: Network calls; RetryingTransport sleeps between attempts
// invariants:
// - Every request carries `Authorization: Bearer` and `Accept: application/json`
// - Retries only GETs answering with a status in the policy set, or failing at the transport level
// - Decode failures and non-listed statuses are returned after the first attempt
// errors: FetchError carrying the request path and HTTP status when the server answered
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::time::Duration;

use crate::error::{FetchError, FetchErrorKind};

/// Seam between the tracker client and the wire.
pub trait Transport {
  fn get_json(&self, path: &str, params: &[(&str, String)]) -> Result<serde_json::Value, FetchError>;
}

pub struct HttpTransport {
  agent: ureq::Agent,
  base_url: String,
  token: String,
}

impl HttpTransport {
  pub fn new(base_url: &str, token: &str, timeout: Duration) -> Self {
    let agent = ureq::AgentBuilder::new()
      .timeout(timeout)
      .user_agent(concat!("youtrack-activity-report/", env!("CARGO_PKG_VERSION")))
      .build();

    Self {
      agent,
      base_url: base_url.trim_end_matches('/').to_string(),
      token: token.to_string(),
    }
  }

  fn url_for(&self, path: &str) -> String {
    format!("{}/{}", self.base_url, path.trim_start_matches('/'))
  }
}

impl Transport for HttpTransport {
  fn get_json(&self, path: &str, params: &[(&str, String)]) -> Result<serde_json::Value, FetchError> {
    let mut req = self
      .agent
      .get(&self.url_for(path))
      .set("Accept", "application/json")
      .set("Authorization", &format!("Bearer {}", self.token));

    for (k, v) in params {
      req = req.query(k, v);
    }

    match req.call() {
      Ok(resp) => resp
        .into_json::<serde_json::Value>()
        .map_err(|e| FetchError::decode(path, e.to_string())),
      Err(ureq::Error::Status(code, resp)) => Err(FetchError::status(path, code, resp.status_text().to_string())),
      Err(ureq::Error::Transport(t)) => Err(FetchError::transport(path, t.to_string())),
    }
  }
}

/// Which failures are retried, how often, and how long to wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
  pub max_retries: u32,
  /// Delay before retry `n` is `backoff * 2^(n-1)`.
  pub backoff: Duration,
  pub statuses: Vec<u16>,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_retries: 3,
      backoff: Duration::from_millis(500),
      statuses: vec![429, 500, 502, 503, 504],
    }
  }
}

impl RetryPolicy {
  pub fn none() -> Self {
    Self {
      max_retries: 0,
      ..Self::default()
    }
  }

  pub fn should_retry(&self, err: &FetchError) -> bool {
    match err.kind {
      FetchErrorKind::Status => err.status.is_some_and(|s| self.statuses.contains(&s)),
      FetchErrorKind::Transport => true,
      FetchErrorKind::Decode => false,
    }
  }

  pub fn delay_for(&self, retry: u32) -> Duration {
    self.backoff.saturating_mul(1u32 << retry.saturating_sub(1).min(16))
  }
}

pub struct RetryingTransport<T> {
  inner: T,
  policy: RetryPolicy,
}

impl<T: Transport> RetryingTransport<T> {
  pub fn new(inner: T, policy: RetryPolicy) -> Self {
    Self { inner, policy }
  }
}

impl<T: Transport> Transport for RetryingTransport<T> {
  fn get_json(&self, path: &str, params: &[(&str, String)]) -> Result<serde_json::Value, FetchError> {
    let mut retry = 0u32;

    loop {
      match self.inner.get_json(path, params) {
        Ok(v) => return Ok(v),
        Err(e) if retry < self.policy.max_retries && self.policy.should_retry(&e) => {
          retry += 1;
          let delay = self.policy.delay_for(retry);
          tracing::debug!(path, retry, ?delay, error = %e, "retrying tracker request");
          std::thread::sleep(delay);
        }
        Err(e) => return Err(e),
      }
    }
  }
}
