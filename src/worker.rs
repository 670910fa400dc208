//! The coordinator: wires the router, the strategies and the lifecycle to
//! host events.

use color_eyre::Result;
use std::sync::Arc;
use tracing::{debug, info};

use crate::cache::{CacheLayer, CacheStorage, Served};
use crate::config::Config;
use crate::event::{Event, NotificationClick, PushMessage, SyncEvent};
use crate::fetch::Fetcher;
use crate::http::Request;
use crate::lifecycle::{self, ActivationReport, InstallReport};
use crate::notify::{Host, Notification, SyncTarget};
use crate::router::{Router, Strategy};

/// What became of an intercepted fetch.
#[derive(Debug)]
pub enum FetchOutcome {
  /// Not a request the coordinator handles; the host performs it untouched
  PassThrough,
  /// A response was produced
  Served(Served),
  /// Nothing to serve; the host surfaces its own network error
  NoResponse,
}

/// Event-driven coordinator over one storage backend and one fetcher.
///
/// Each event is handled independently; concurrent fetches share nothing but
/// the storage backend.
pub struct ServiceWorker<S: CacheStorage, F: Fetcher> {
  config: Arc<Config>,
  router: Router,
  cache: CacheLayer<S, F>,
  storage: Arc<S>,
  fetcher: Arc<F>,
  host: Arc<dyn Host>,
  sync: Arc<dyn SyncTarget>,
}

impl<S, F> ServiceWorker<S, F>
where
  S: CacheStorage + 'static,
  F: Fetcher + 'static,
{
  pub fn new(
    config: Config,
    storage: S,
    fetcher: F,
    host: Arc<dyn Host>,
    sync: Arc<dyn SyncTarget>,
  ) -> Self {
    let config = Arc::new(config);
    let storage = Arc::new(storage);
    let fetcher = Arc::new(fetcher);
    let router = Router::from_config(&config);
    let cache = CacheLayer::new(
      Arc::clone(&storage),
      Arc::clone(&fetcher),
      Arc::clone(&config),
    );
    Self {
      config,
      router,
      cache,
      storage,
      fetcher,
      host,
      sync,
    }
  }

  /// Replace the standard classification table.
  pub fn with_router(mut self, router: Router) -> Self {
    self.router = router;
    self
  }

  /// Route one host event to its handler.
  pub async fn on_event(&self, event: Event) -> Result<Option<FetchOutcome>> {
    match event {
      Event::Install => {
        self.install().await?;
        Ok(None)
      }
      Event::Activate => {
        self.activate()?;
        Ok(None)
      }
      Event::Fetch(request) => Ok(Some(self.handle_fetch(&request).await)),
      Event::Push(message) => {
        self.handle_push(&message)?;
        Ok(None)
      }
      Event::NotificationClick(click) => {
        self.handle_notification_click(&click)?;
        Ok(None)
      }
      Event::Sync(sync) => {
        self.handle_sync(&sync).await?;
        Ok(None)
      }
    }
  }

  /// Seed the static generation; on success the host skips waiting.
  pub async fn install(&self) -> Result<InstallReport> {
    let report = lifecycle::install(self.storage.as_ref(), self.fetcher.as_ref(), &self.config).await?;
    self.host.skip_waiting();
    Ok(report)
  }

  /// Sweep superseded generations, then claim all open pages.
  pub fn activate(&self) -> Result<ActivationReport> {
    let report = lifecycle::activate(self.storage.as_ref(), &self.config)?;
    self.host.claim_clients();
    Ok(report)
  }

  /// Classify one intercepted request and run its strategy.
  pub async fn handle_fetch(&self, request: &Request) -> FetchOutcome {
    if !Router::should_intercept(request) {
      return FetchOutcome::PassThrough;
    }

    let strategy = self.router.classify(request);
    debug!("{} {} -> {:?}", request.method.as_str(), request.url, strategy);

    match strategy {
      Strategy::CacheFirst => FetchOutcome::Served(self.cache.cache_first(request).await),
      Strategy::NetworkFirst => FetchOutcome::Served(self.cache.network_first(request).await),
      Strategy::StaleWhileRevalidate => {
        match self.cache.stale_while_revalidate(request).await {
          Some(served) => FetchOutcome::Served(served),
          None => FetchOutcome::NoResponse,
        }
      }
    }
  }

  /// Show a notification for a push message.
  pub fn handle_push(&self, message: &PushMessage) -> Result<()> {
    let notification = Notification::for_push(&self.config.push, message);
    self.host.show_notification(&notification)
  }

  /// Close the notification; the configured open action also opens its page.
  pub fn handle_notification_click(&self, click: &NotificationClick) -> Result<()> {
    self.host.close_notification();
    if click.action.as_deref() == Some(self.config.push.open_action.as_str()) {
      self.host.open_window(&self.config.push.open_url)?;
    }
    Ok(())
  }

  /// Dispatch the recognized sync tag to the reconciliation collaborator.
  pub async fn handle_sync(&self, sync: &SyncEvent) -> Result<()> {
    if sync.tag == self.config.sync_tag {
      info!("Dispatching background sync for {}", sync.tag);
      self.sync.sync_progress().await?;
    }
    Ok(())
  }

  /// Wait for background revalidations to settle.
  pub async fn await_background(&self) {
    self.cache.await_background().await;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{MemoryStorage, ServeSource};
  use crate::fetch::testing::MockFetcher;
  use crate::http::{Method, Response};
  use async_trait::async_trait;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Mutex;
  use url::Url;

  /// Host that records everything it is asked to do.
  #[derive(Default)]
  struct RecordingHost {
    shown: Mutex<Vec<Notification>>,
    opened: Mutex<Vec<String>>,
    closed: AtomicUsize,
    claimed: AtomicUsize,
    skipped: AtomicUsize,
  }

  impl Host for RecordingHost {
    fn skip_waiting(&self) {
      self.skipped.fetch_add(1, Ordering::SeqCst);
    }

    fn claim_clients(&self) {
      self.claimed.fetch_add(1, Ordering::SeqCst);
    }

    fn show_notification(&self, notification: &Notification) -> Result<()> {
      self.shown.lock().expect("lock").push(notification.clone());
      Ok(())
    }

    fn close_notification(&self) {
      self.closed.fetch_add(1, Ordering::SeqCst);
    }

    fn open_window(&self, url: &str) -> Result<()> {
      self.opened.lock().expect("lock").push(url.to_string());
      Ok(())
    }
  }

  #[derive(Default)]
  struct RecordingSync {
    runs: AtomicUsize,
  }

  #[async_trait]
  impl SyncTarget for RecordingSync {
    async fn sync_progress(&self) -> Result<()> {
      self.runs.fetch_add(1, Ordering::SeqCst);
      Ok(())
    }
  }

  struct Fixture {
    worker: ServiceWorker<MemoryStorage, MockFetcher>,
    host: Arc<RecordingHost>,
    sync: Arc<RecordingSync>,
  }

  fn fixture() -> Fixture {
    let host = Arc::new(RecordingHost::default());
    let sync = Arc::new(RecordingSync::default());
    let config = Config::for_origin(Url::parse("https://example.org").expect("test URL"));
    let worker = ServiceWorker::new(
      config,
      MemoryStorage::new(),
      MockFetcher::new(),
      Arc::clone(&host) as Arc<dyn Host>,
      Arc::clone(&sync) as Arc<dyn SyncTarget>,
    );
    Fixture { worker, host, sync }
  }

  fn url(path: &str) -> Url {
    Url::parse(&format!("https://example.org{}", path)).expect("test URL")
  }

  fn seed_manifest(fetcher: &MockFetcher) {
    for path in ["/", "/index.html", "/manifest.json", "/offline.html"] {
      fetcher.respond(
        &format!("https://example.org{}", path),
        Response::new(200).with_body(format!("content of {}", path)),
      );
    }
  }

  #[tokio::test]
  async fn test_install_then_activate_controls_the_pages() {
    let f = fixture();
    seed_manifest(&f.worker.fetcher);
    f.worker.storage.open("old-static-v0").expect("open");

    f.worker.install().await.expect("install");
    assert_eq!(f.host.skipped.load(Ordering::SeqCst), 1);

    let report = f.worker.activate().expect("activate");
    assert_eq!(report.removed, vec!["old-static-v0"]);
    assert_eq!(f.host.claimed.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_non_get_and_non_http_pass_through() {
    let f = fixture();

    let post = Request::new(Method::Post, url("/api/progress"));
    assert!(matches!(f.worker.handle_fetch(&post).await, FetchOutcome::PassThrough));

    let extension = Request::get(Url::parse("chrome-extension://abc/script.js").expect("test URL"));
    assert!(matches!(
      f.worker.handle_fetch(&extension).await,
      FetchOutcome::PassThrough
    ));
  }

  #[tokio::test]
  async fn test_fetch_routes_to_the_right_strategy() {
    let f = fixture();
    f.worker
      .fetcher
      .respond("https://example.org/api/progress", Response::new(200).with_body("{}"));

    // API traffic hits the network even with a cached copy present
    let api = Request::get(url("/api/progress"));
    f.worker
      .storage
      .put("app-dynamic-v1", &api, &Response::new(200).with_body("old"))
      .expect("seed");
    match f.worker.handle_fetch(&api).await {
      FetchOutcome::Served(served) => {
        assert_eq!(served.source, ServeSource::Network);
        assert_eq!(served.response.body, b"{}");
      }
      other => panic!("expected a served response, got {:?}", other),
    }

    // Static assets come from cache without touching the network
    let css = Request::get(url("/styles/main.css"));
    f.worker
      .storage
      .put("app-static-v1", &css, &Response::new(200).with_body("cached"))
      .expect("seed");
    let calls_before = f.worker.fetcher.call_count();
    match f.worker.handle_fetch(&css).await {
      FetchOutcome::Served(served) => assert_eq!(served.source, ServeSource::Cache),
      other => panic!("expected a served response, got {:?}", other),
    }
    assert_eq!(f.worker.fetcher.call_count(), calls_before);
  }

  #[tokio::test]
  async fn test_offline_api_call_degrades_to_json_503() {
    let f = fixture();
    f.worker.fetcher.set_offline(true);

    match f.worker.handle_fetch(&Request::get(url("/api/progress"))).await {
      FetchOutcome::Served(served) => {
        assert_eq!(served.response.status, 503);
        assert_eq!(served.response.header("Content-Type"), Some("application/json"));
      }
      other => panic!("expected a served response, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn test_push_shows_a_notification() {
    let f = fixture();
    f.worker
      .handle_push(&PushMessage {
        payload: Some("Build finished".to_string()),
      })
      .expect("push");

    let shown = f.host.shown.lock().expect("lock");
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].body, "Build finished");
  }

  #[tokio::test]
  async fn test_notification_click_opens_only_the_open_action() {
    let f = fixture();

    f.worker
      .handle_notification_click(&NotificationClick {
        action: Some("close".to_string()),
      })
      .expect("click");
    f.worker
      .handle_notification_click(&NotificationClick {
        action: Some("explore".to_string()),
      })
      .expect("click");

    assert_eq!(f.host.closed.load(Ordering::SeqCst), 2);
    assert_eq!(*f.host.opened.lock().expect("lock"), vec!["/dashboard"]);
  }

  #[tokio::test]
  async fn test_sync_dispatches_only_the_recognized_tag() {
    let f = fixture();

    f.worker
      .handle_sync(&SyncEvent {
        tag: "something-else".to_string(),
      })
      .await
      .expect("sync");
    assert_eq!(f.sync.runs.load(Ordering::SeqCst), 0);

    f.worker
      .handle_sync(&SyncEvent {
        tag: "sync-progress".to_string(),
      })
      .await
      .expect("sync");
    assert_eq!(f.sync.runs.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_on_event_covers_the_whole_surface() {
    let f = fixture();
    seed_manifest(&f.worker.fetcher);

    f.worker.on_event(Event::Install).await.expect("install");
    f.worker.on_event(Event::Activate).await.expect("activate");

    let outcome = f
      .worker
      .on_event(Event::Fetch(Request::get(url("/index.html"))))
      .await
      .expect("fetch");
    assert!(matches!(outcome, Some(FetchOutcome::Served(_))));

    f.worker
      .on_event(Event::Push(PushMessage::default()))
      .await
      .expect("push");
    assert_eq!(f.host.shown.lock().expect("lock").len(), 1);
  }
}
