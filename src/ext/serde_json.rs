// === Module Header (agents-tooling) START ===
// purpose: Tolerant nested access into tracker JSON payloads via dotted paths, with typed and trimmed-text extraction
// role: extension/serde_json
// outputs: JsonFetch trait and JsonFetched wrapper
// invariants: No panics; missing paths, nulls and wrong shapes yield None; text accessors never return empty strings
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use serde::de::DeserializeOwned;

/// A location inside a JSON document, resolved lazily to a concrete type.
pub struct JsonFetched<'a> {
  inner: Option<&'a serde_json::Value>,
}

impl<'a> JsonFetched<'a> {
  /// Attempt to deserialize the fetched value as `T`.
  pub fn to<T>(&self) -> Option<T>
  where
    T: DeserializeOwned,
  {
    self.inner.and_then(|v| serde_json::from_value::<T>(v.clone()).ok())
  }

  /// Trimmed string value; `None` for non-strings and blank strings.
  pub fn text(&self) -> Option<String> {
    self
      .inner
      .and_then(|v| v.as_str())
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(str::to_string)
  }

  /// Elements when the location holds an array; empty otherwise.
  pub fn items(&self) -> &'a [serde_json::Value] {
    self.inner.and_then(|v| v.as_array()).map(Vec::as_slice).unwrap_or(&[])
  }

  pub fn value(&self) -> Option<&'a serde_json::Value> {
    self.inner.filter(|v| !v.is_null())
  }
}

/// Extension to fetch nested values via dotted paths like "project.shortName".
pub trait JsonFetch {
  fn fetch(&self, path: &str) -> JsonFetched<'_>;

  /// First non-blank text among `paths`, in order.
  fn first_text(&self, paths: &[&str]) -> Option<String> {
    paths.iter().find_map(|p| self.fetch(p).text())
  }
}

impl JsonFetch for serde_json::Value {
  fn fetch(&self, path: &str) -> JsonFetched<'_> {
    if path.is_empty() {
      return JsonFetched { inner: Some(self) };
    }

    let mut cur = self;

    for key in path.split('.') {
      let next = match cur {
        serde_json::Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => cur.get(key),
      };

      match next {
        Some(n) => cur = n,
        None => return JsonFetched { inner: None },
      }
    }

    JsonFetched { inner: Some(cur) }
  }
}
