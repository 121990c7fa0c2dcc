// === Module Header (agents-tooling) START ===
// purpose: Time-bounded memo for slow-changing reference data, keyed by function name + arguments
// role: tracker/cache
// outputs: TtlCache<V>
// invariants:
// - An entry older than the TTL is never returned; it is recomputed on next access
// - Failed computations are not stored
// - clear() drops every entry
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::cell::RefCell;
use std::collections::HashMap;
use std::time::{Duration, Instant};

pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

/// Cache key for a memoized call: `func(arg1,arg2)`.
#[inline]
pub fn cache_key(func: &str, args: &[&str]) -> String {
  format!("{}({})", func, args.join(","))
}

pub struct TtlCache<V> {
  ttl: Duration,
  entries: RefCell<HashMap<String, (Instant, V)>>,
}

impl<V: Clone> TtlCache<V> {
  pub fn new(ttl: Duration) -> Self {
    Self {
      ttl,
      entries: RefCell::new(HashMap::new()),
    }
  }

  /// Cached value for `key` when still fresh, else the result of `compute` (stored on success).
  pub fn get_or_try_insert_with<E>(&self, key: String, compute: impl FnOnce() -> Result<V, E>) -> Result<V, E> {
    if let Some((at, v)) = self.entries.borrow().get(&key) {
      if at.elapsed() < self.ttl {
        return Ok(v.clone());
      }
    }

    let v = compute()?;
    self.entries.borrow_mut().insert(key, (Instant::now(), v.clone()));

    Ok(v)
  }

  pub fn clear(&self) {
    self.entries.borrow_mut().clear();
  }
}

impl<V: Clone> Default for TtlCache<V> {
  fn default() -> Self {
    Self::new(DEFAULT_TTL)
  }
}
