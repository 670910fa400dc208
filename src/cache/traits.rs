//! Core traits and types for the caching system.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::http::{Request, Response};

/// Trait for values that address a cache entry.
///
/// Keys must be stable across runs so persisted generations stay addressable.
pub trait CacheKey {
  /// Stable, fixed-length entry key.
  fn cache_key(&self) -> String;
}

/// Requests are keyed by method + full URL.
impl CacheKey for Request {
  fn cache_key(&self) -> String {
    // SHA256 hash for stable, fixed-length keys
    let mut hasher = Sha256::new();
    hasher.update(self.method.as_str().as_bytes());
    hasher.update(b" ");
    hasher.update(self.url.as_str().as_bytes());
    hex::encode(hasher.finalize())
  }
}

/// A response snapshot retrieved from a cache generation.
#[derive(Debug, Clone)]
pub struct CachedResponse {
  /// The stored response
  pub response: Response,
  /// When the entry was written
  pub cached_at: DateTime<Utc>,
}

/// Indicates where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeSource {
  /// Fresh data from the network
  Network,
  /// Served from a cache generation
  Cache,
  /// Network unavailable, serving the last-known-good cached copy
  Offline,
  /// Network unavailable, serving the offline fallback page
  Fallback,
  /// Synthesized error response, nothing cached and no network
  Synthetic,
}

/// Result of running a serving strategy, with provenance.
#[derive(Debug)]
pub struct Served {
  /// The response handed back to the host
  pub response: Response,
  /// Where the bytes came from
  pub source: ServeSource,
  /// When the data was cached (if it came from a generation)
  pub cached_at: Option<DateTime<Utc>>,
}

impl Served {
  /// A live response straight from the network.
  pub fn from_network(response: Response) -> Self {
    Self {
      response,
      source: ServeSource::Network,
      cached_at: None,
    }
  }

  /// A cache hit served without consulting the network.
  pub fn from_cache(hit: CachedResponse) -> Self {
    Self {
      response: hit.response,
      source: ServeSource::Cache,
      cached_at: Some(hit.cached_at),
    }
  }

  /// A cached copy served because the network failed.
  pub fn offline(hit: CachedResponse) -> Self {
    Self {
      response: hit.response,
      source: ServeSource::Offline,
      cached_at: Some(hit.cached_at),
    }
  }

  /// The offline fallback page, served for a failed navigation.
  pub fn fallback(hit: CachedResponse) -> Self {
    Self {
      response: hit.response,
      source: ServeSource::Fallback,
      cached_at: Some(hit.cached_at),
    }
  }

  /// A synthesized error response.
  pub fn synthetic(response: Response) -> Self {
    Self {
      response,
      source: ServeSource::Synthetic,
      cached_at: None,
    }
  }
}
