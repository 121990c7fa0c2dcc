//! In-memory transport for unit tests: a routing closure plus a log of every request.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::FetchError;
use crate::tracker::transport::Transport;

type Handler = Box<dyn Fn(&str, &[(&str, String)]) -> Result<serde_json::Value, FetchError>>;

pub struct FakeTransport {
  handler: Handler,
  calls: Rc<RefCell<Vec<String>>>,
}

impl FakeTransport {
  pub fn new<F>(handler: F) -> Self
  where
    F: Fn(&str, &[(&str, String)]) -> Result<serde_json::Value, FetchError> + 'static,
  {
    Self {
      handler: Box::new(handler),
      calls: Rc::new(RefCell::new(Vec::new())),
    }
  }

  /// Shared handle to the request log (`path?k=v&...`, unencoded).
  pub fn calls(&self) -> Rc<RefCell<Vec<String>>> {
    Rc::clone(&self.calls)
  }
}

impl Transport for FakeTransport {
  fn get_json(&self, path: &str, params: &[(&str, String)]) -> Result<serde_json::Value, FetchError> {
    let line = if params.is_empty() {
      path.to_string()
    } else {
      let qs: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
      format!("{}?{}", path, qs.join("&"))
    };
    self.calls.borrow_mut().push(line);

    (self.handler)(path, params)
  }
}

/// Look up a query parameter by name.
pub fn param<'a>(params: &'a [(&str, String)], name: &str) -> Option<&'a str> {
  params.iter().find(|(k, _)| *k == name).map(|(_, v)| v.as_str())
}
