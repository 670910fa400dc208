//! Request and response model for intercepted traffic.
//!
//! Requests are immutable once built: the router only reads method, URL and
//! mode. Responses are plain snapshots (status + headers + body) so they can
//! be stored in a cache generation and replayed byte-for-byte.

use url::Url;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
  Get,
  Head,
  Post,
  Put,
  Patch,
  Delete,
  Options,
}

impl Method {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Get => "GET",
      Self::Head => "HEAD",
      Self::Post => "POST",
      Self::Put => "PUT",
      Self::Patch => "PATCH",
      Self::Delete => "DELETE",
      Self::Options => "OPTIONS",
    }
  }

  pub fn is_get(&self) -> bool {
    matches!(self, Self::Get)
  }
}

/// How the page initiated the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
  /// Top-level document navigation
  Navigate,
  /// Subresource request from a controlled page
  SameOrigin,
  /// Cross-origin request with CORS
  Cors,
  /// Cross-origin request without CORS (scripts, images)
  NoCors,
}

/// An intercepted network request.
#[derive(Debug, Clone)]
pub struct Request {
  pub method: Method,
  pub url: Url,
  pub mode: RequestMode,
}

impl Request {
  pub fn new(method: Method, url: Url) -> Self {
    Self {
      method,
      url,
      mode: RequestMode::SameOrigin,
    }
  }

  /// A plain GET for the given URL.
  pub fn get(url: Url) -> Self {
    Self::new(Method::Get, url)
  }

  /// A page navigation (GET with navigate mode).
  pub fn navigation(url: Url) -> Self {
    Self::get(url).with_mode(RequestMode::Navigate)
  }

  pub fn with_mode(mut self, mode: RequestMode) -> Self {
    self.mode = mode;
    self
  }

  pub fn is_navigation(&self) -> bool {
    self.mode == RequestMode::Navigate
  }

  /// File extension of the URL path, if the last segment has one.
  pub fn extension(&self) -> Option<&str> {
    let segment = self.url.path().rsplit('/').next()?;
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
      return None;
    }
    Some(ext)
  }
}

/// A response snapshot: status, headers and body bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
  pub status: u16,
  pub headers: Vec<(String, String)>,
  pub body: Vec<u8>,
}

impl Response {
  pub fn new(status: u16) -> Self {
    Self {
      status,
      headers: Vec::new(),
      body: Vec::new(),
    }
  }

  pub fn with_header(mut self, name: &str, value: &str) -> Self {
    self.headers.push((name.to_string(), value.to_string()));
    self
  }

  pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
    self.body = body.into();
    self
  }

  /// Whether the status is in the successful range (2xx).
  pub fn ok(&self) -> bool {
    (200..300).contains(&self.status)
  }

  /// First header with the given name, case-insensitive.
  pub fn header(&self, name: &str) -> Option<&str> {
    self
      .headers
      .iter()
      .find(|(n, _)| n.eq_ignore_ascii_case(name))
      .map(|(_, v)| v.as_str())
  }

  /// Body interpreted as UTF-8, lossily.
  pub fn body_text(&self) -> String {
    String::from_utf8_lossy(&self.body).into_owned()
  }

  /// Synthetic 503 for a static asset that is neither cached nor reachable.
  pub fn offline_text() -> Self {
    Self::new(503)
      .with_header("Content-Type", "text/plain")
      .with_body("Offline")
  }

  /// Synthetic 503 for backend traffic with no cached fallback.
  pub fn offline_json() -> Self {
    let body = serde_json::json!({ "error": "Offline" }).to_string();
    Self::new(503)
      .with_header("Content-Type", "application/json")
      .with_body(body)
  }
}
