// === Module Header (agents-tooling) START ===
// purpose: Lazy, forward-only iteration over every issue a search query matches, page by page
// role: tracker/pager
// inputs: TrackerClient, query, field spec, page size
// outputs: Iterator<Item = Result<IssueRecord, FetchError>>
// side_effects: One search request per page, issued only when the previous page is drained
// invariants:
// - Pages are requested strictly in offset order: $skip = 0, n, 2n, ...
// - A short page or an empty page ends iteration; no total count is assumed
// - After an error is yielded the iterator is exhausted
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use crate::error::FetchError;
use crate::model::IssueRecord;
use crate::tracker::client::TrackerClient;

pub struct IssuePager<'a> {
  client: &'a TrackerClient,
  query: String,
  fields: String,
  page_size: usize,
  skip: usize,
  buffer: std::vec::IntoIter<serde_json::Value>,
  exhausted: bool,
}

impl<'a> IssuePager<'a> {
  pub fn new(client: &'a TrackerClient, query: &str, fields: &str, page_size: usize) -> Self {
    Self {
      client,
      query: query.to_string(),
      fields: fields.to_string(),
      page_size: page_size.max(1),
      skip: 0,
      buffer: Vec::new().into_iter(),
      exhausted: false,
    }
  }

  pub fn query(&self) -> &str {
    &self.query
  }
}

impl Iterator for IssuePager<'_> {
  type Item = Result<IssueRecord, FetchError>;

  fn next(&mut self) -> Option<Self::Item> {
    if let Some(v) = self.buffer.next() {
      return Some(Ok(IssueRecord::from_json(&v)));
    }
    if self.exhausted {
      return None;
    }

    tracing::debug!(query = %self.query, skip = self.skip, top = self.page_size, "fetching issue page");

    match self.client.search_page(&self.query, &self.fields, self.page_size, self.skip) {
      Ok(batch) => {
        if batch.len() < self.page_size {
          self.exhausted = true;
        }
        self.skip += self.page_size;
        self.buffer = batch.into_iter();
        self.buffer.next().map(|v| Ok(IssueRecord::from_json(&v)))
      }
      Err(e) => {
        self.exhausted = true;
        Some(Err(e))
      }
    }
  }
}

/// Iterate every issue matching `query`.
pub fn fetch<'a>(client: &'a TrackerClient, query: &str, fields: &str, page_size: usize) -> IssuePager<'a> {
  IssuePager::new(client, query, fields, page_size)
}
