//! Serving strategies that blend cache generations with the network.

use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::Config;
use crate::fetch::Fetcher;
use crate::http::{Request, Response};

use super::storage::CacheStorage;
use super::traits::{CachedResponse, Served};

/// Executes the serving strategies against a storage backend and a fetcher.
///
/// Strategies do not fail: network and storage errors degrade into cached or
/// synthetic responses. Each intercepted request runs as its own task; the
/// only shared state is the storage backend, which synchronizes internally.
pub struct CacheLayer<S: CacheStorage, F: Fetcher> {
  storage: Arc<S>,
  fetcher: Arc<F>,
  config: Arc<Config>,
  /// Handles of revalidation tasks, retained so a refresh outlives the
  /// response it runs behind
  background: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl<S, F> CacheLayer<S, F>
where
  S: CacheStorage + 'static,
  F: Fetcher + 'static,
{
  /// Create a new cache layer over the given storage and fetcher.
  pub fn new(storage: Arc<S>, fetcher: Arc<F>, config: Arc<Config>) -> Self {
    Self {
      storage,
      fetcher,
      config,
      background: Arc::new(Mutex::new(Vec::new())),
    }
  }

  /// Serve immutable assets: cache wins outright, the network only fills
  /// misses.
  ///
  /// 1. Cache hit → return it, no network attempt, no freshness check
  /// 2. Miss → fetch; successful responses are stored into the static
  ///    generation before returning
  /// 3. Fetch failure → synthetic 503 with a plain-text body
  pub async fn cache_first(&self, request: &Request) -> Served {
    if let Some(hit) = self.lookup(request) {
      return Served::from_cache(hit);
    }

    match self.fetcher.fetch(request).await {
      Ok(response) => {
        self.store(&self.config.caches.static_assets, request, &response);
        Served::from_network(response)
      }
      Err(err) => {
        debug!("Cache-first fetch failed for {}: {}", request.url, err);
        Served::synthetic(Response::offline_text())
      }
    }
  }

  /// Serve backend traffic: always prefer live data, degrade to
  /// last-known-good when offline.
  ///
  /// 1. Fetch; successful responses are stored into the dynamic generation
  ///    and returned live
  /// 2. Fetch failure → cached copy if present
  /// 3. Neither → synthetic 503 with a JSON error body
  pub async fn network_first(&self, request: &Request) -> Served {
    match self.fetcher.fetch(request).await {
      Ok(response) => {
        self.store(&self.config.caches.dynamic, request, &response);
        Served::from_network(response)
      }
      Err(err) => {
        debug!("Network-first fetch failed for {}: {}", request.url, err);
        match self.lookup(request) {
          Some(hit) => Served::offline(hit),
          None => Served::synthetic(Response::offline_json()),
        }
      }
    }
  }

  /// Serve navigations: instant response from cache while refreshing in the
  /// background.
  ///
  /// A cache hit is returned immediately and a revalidation task is spawned;
  /// its handle is retained so the refresh is not dropped with the response.
  /// On a miss the caller waits for the network; a failed navigation resolves
  /// to the cached offline page, anything else unresolvable yields `None` and
  /// the host surfaces its own network error.
  pub async fn stale_while_revalidate(&self, request: &Request) -> Option<Served> {
    if let Some(hit) = self.lookup(request) {
      let layer = self.clone();
      let request = request.clone();
      let handle = tokio::spawn(async move {
        let _ = layer.revalidate(&request).await;
      });
      self.keep_alive(handle);
      return Some(Served::from_cache(hit));
    }

    self.revalidate(request).await
  }

  /// Network refresh backing stale-while-revalidate.
  async fn revalidate(&self, request: &Request) -> Option<Served> {
    match self.fetcher.fetch(request).await {
      Ok(response) => {
        self.store(&self.config.caches.dynamic, request, &response);
        Some(Served::from_network(response))
      }
      Err(err) => {
        debug!("Revalidation failed for {}: {}", request.url, err);
        if request.is_navigation() {
          if let Some(fallback) = self.config.offline_request() {
            if let Some(hit) = self.lookup(&fallback) {
              return Some(Served::fallback(hit));
            }
          }
        }
        None
      }
    }
  }

  /// Cache lookup across generations. Storage errors count as misses.
  fn lookup(&self, request: &Request) -> Option<CachedResponse> {
    match self.storage.match_any(request) {
      Ok(hit) => hit,
      Err(err) => {
        warn!("Cache lookup failed for {}: {}", request.url, err);
        None
      }
    }
  }

  /// Store a successful response. Write errors never block serving.
  fn store(&self, generation: &str, request: &Request, response: &Response) {
    if !response.ok() {
      return;
    }
    if let Err(err) = self.storage.put(generation, request, response) {
      warn!("Failed to cache {} in {}: {}", request.url, generation, err);
    }
  }

  fn keep_alive(&self, handle: JoinHandle<()>) {
    if let Ok(mut tasks) = self.background.lock() {
      tasks.retain(|task| !task.is_finished());
      tasks.push(handle);
    }
  }

  /// Wait for all spawned revalidation tasks to settle.
  pub async fn await_background(&self) {
    let tasks: Vec<JoinHandle<()>> = match self.background.lock() {
      Ok(mut tasks) => tasks.drain(..).collect(),
      Err(_) => return,
    };
    let _ = futures::future::join_all(tasks).await;
  }
}

impl<S: CacheStorage, F: Fetcher> Clone for CacheLayer<S, F> {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
      fetcher: Arc::clone(&self.fetcher),
      config: Arc::clone(&self.config),
      background: Arc::clone(&self.background),
    }
  }
}
