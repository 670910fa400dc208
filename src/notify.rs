//! Notification surface and host-side hooks.
//!
//! None of this is caching logic. The coordinator only shapes the payloads;
//! displaying notifications, claiming pages and opening windows belong to the
//! host runtime behind the [`Host`] trait, and the reconciliation work behind
//! background sync lives behind [`SyncTarget`].

use async_trait::async_trait;
use color_eyre::Result;

use crate::config::PushConfig;
use crate::event::PushMessage;

/// A visible notification handed to the host's display API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
  pub title: String,
  pub body: String,
  pub icon: String,
  pub badge: String,
  pub vibrate: Vec<u32>,
  pub actions: Vec<NotificationAction>,
}

/// One actionable choice on a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationAction {
  pub action: String,
  pub title: String,
}

impl Notification {
  /// Build the notification for a push message: payload text wins, the
  /// configured default body otherwise.
  pub fn for_push(config: &PushConfig, message: &PushMessage) -> Self {
    Self {
      title: config.title.clone(),
      body: message
        .payload
        .clone()
        .unwrap_or_else(|| config.default_body.clone()),
      icon: config.icon.clone(),
      badge: config.badge.clone(),
      vibrate: config.vibrate.clone(),
      actions: config
        .actions
        .iter()
        .map(|a| NotificationAction {
          action: a.action.clone(),
          title: a.title.clone(),
        })
        .collect(),
    }
  }
}

/// Platform operations the coordinator delegates back to the host runtime.
pub trait Host: Send + Sync {
  /// Take control without waiting for old pages to close.
  fn skip_waiting(&self);

  /// Claim all open pages immediately.
  fn claim_clients(&self);

  /// Display a notification.
  fn show_notification(&self, notification: &Notification) -> Result<()>;

  /// Close the clicked notification.
  fn close_notification(&self);

  /// Open a page in a new client window.
  fn open_window(&self, url: &str) -> Result<()>;
}

/// Host that does nothing. For embedders without a notification surface, and
/// for tests.
pub struct NoopHost;

impl Host for NoopHost {
  fn skip_waiting(&self) {}

  fn claim_clients(&self) {}

  fn show_notification(&self, _notification: &Notification) -> Result<()> {
    Ok(())
  }

  fn close_notification(&self) {}

  fn open_window(&self, _url: &str) -> Result<()> {
    Ok(())
  }
}

/// Reconciliation collaborator behind the background-sync hook. The remote
/// progress-tracking API lives on the other side of this trait.
#[async_trait]
pub trait SyncTarget: Send + Sync {
  async fn sync_progress(&self) -> Result<()>;
}

/// Sync target that does nothing.
pub struct NoopSync;

#[async_trait]
impl SyncTarget for NoopSync {
  async fn sync_progress(&self) -> Result<()> {
    Ok(())
  }
}
