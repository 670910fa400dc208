//! Events delivered by the host runtime.

use crate::http::Request;

/// Lifecycle and runtime events the coordinator responds to.
#[derive(Debug, Clone)]
pub enum Event {
  /// A new coordinator version is being installed
  Install,
  /// This version is taking control
  Activate,
  /// A network fetch was intercepted
  Fetch(Request),
  /// A push message arrived
  Push(PushMessage),
  /// The user clicked a displayed notification
  NotificationClick(NotificationClick),
  /// A registered background sync fired
  Sync(SyncEvent),
}

/// Payload of a push message.
#[derive(Debug, Clone, Default)]
pub struct PushMessage {
  /// Text payload, if the message carried one
  pub payload: Option<String>,
}

/// A click on a displayed notification.
#[derive(Debug, Clone, Default)]
pub struct NotificationClick {
  /// Action tag the user chose, if any
  pub action: Option<String>,
}

/// A background sync firing.
#[derive(Debug, Clone)]
pub struct SyncEvent {
  pub tag: String,
}
