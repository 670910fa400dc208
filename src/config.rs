//! Coordinator configuration.
//!
//! Everything the coordinator needs to know is configuration: the generation
//! names, the precache manifest, the classification constants and the push
//! presentation. Defaults cover all of it; a YAML file can override any part.

use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

use crate::http::Request;

/// Coordinator configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Origin that relative paths (precache manifest, offline page) resolve
  /// against.
  pub origin: Url,
  pub caches: CacheNames,
  /// Paths seeded into the static generation during install.
  pub precache: Vec<String>,
  /// Page served when a navigation fails and nothing else is cached.
  pub offline_page: String,
  /// Path extensions classified as immutable static assets.
  pub static_extensions: Vec<String>,
  /// Path prefix that marks backend API traffic.
  pub api_prefix: String,
  /// Host substring that marks backend API traffic.
  pub api_host_marker: String,
  pub push: PushConfig,
  /// The one background-sync tag the coordinator dispatches on.
  pub sync_tag: String,
}

/// Names of the cache generations.
///
/// Bumping a version tag here retires the previous generation on the next
/// activate; no other invalidation exists.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheNames {
  /// Reserved identifier; no strategy reads or writes it.
  pub general: String,
  pub static_assets: String,
  pub dynamic: String,
}

impl Default for CacheNames {
  fn default() -> Self {
    Self {
      general: "app-v1".to_string(),
      static_assets: "app-static-v1".to_string(),
      dynamic: "app-dynamic-v1".to_string(),
    }
  }
}

/// Presentation of push notifications.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PushConfig {
  pub title: String,
  /// Body used when the push payload carries no text.
  pub default_body: String,
  pub icon: String,
  pub badge: String,
  pub vibrate: Vec<u32>,
  pub actions: Vec<ActionConfig>,
  /// Action tag that opens a page when clicked.
  pub open_action: String,
  /// Page opened for `open_action`.
  pub open_url: String,
}

/// One actionable choice on a notification.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionConfig {
  pub action: String,
  pub title: String,
}

impl Default for PushConfig {
  fn default() -> Self {
    Self {
      title: "Notification".to_string(),
      default_body: "You have a new notification".to_string(),
      icon: "/icons/icon-192.png".to_string(),
      badge: "/icons/badge-72.png".to_string(),
      vibrate: vec![100, 50, 100],
      actions: vec![
        ActionConfig {
          action: "explore".to_string(),
          title: "Open".to_string(),
        },
        ActionConfig {
          action: "close".to_string(),
          title: "Dismiss".to_string(),
        },
      ],
      open_action: "explore".to_string(),
      open_url: "/dashboard".to_string(),
    }
  }
}

impl Default for Config {
  fn default() -> Self {
    Self {
      origin: Url::parse("http://localhost").expect("valid origin literal"),
      caches: CacheNames::default(),
      precache: vec![
        "/".to_string(),
        "/index.html".to_string(),
        "/manifest.json".to_string(),
        "/offline.html".to_string(),
      ],
      offline_page: "/offline.html".to_string(),
      static_extensions: [
        "js", "css", "png", "jpg", "jpeg", "gif", "svg", "woff", "woff2", "ttf",
      ]
      .iter()
      .map(|s| s.to_string())
      .collect(),
      api_prefix: "/api".to_string(),
      api_host_marker: "supabase".to_string(),
      push: PushConfig::default(),
      sync_tag: "sync-progress".to_string(),
    }
  }
}

impl Config {
  /// Default configuration resolved against the given origin.
  pub fn for_origin(origin: Url) -> Self {
    Self {
      origin,
      ..Self::default()
    }
  }

  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./swkit.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/swkit/config.yaml
  ///
  /// Falls back to the defaults when no file exists.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("swkit.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("swkit").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Request for the offline fallback page, if the path resolves.
  pub fn offline_request(&self) -> Option<Request> {
    self.origin.join(&self.offline_page).ok().map(Request::get)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults_cover_the_full_manifest() {
    let config = Config::default();
    assert_eq!(config.precache.len(), 4);
    assert!(config.precache.contains(&"/offline.html".to_string()));
    assert_eq!(config.caches.static_assets, "app-static-v1");
    assert_eq!(config.caches.dynamic, "app-dynamic-v1");
    assert_eq!(config.sync_tag, "sync-progress");
  }

  #[test]
  fn test_offline_request_resolves_against_origin() {
    let config = Config::for_origin(Url::parse("https://example.org").expect("test URL"));
    let request = config.offline_request().expect("offline request");
    assert_eq!(request.url.as_str(), "https://example.org/offline.html");
  }

  #[test]
  fn test_yaml_overrides_merge_with_defaults() {
    let yaml = r#"
origin: "https://shop.example"
caches:
  static_assets: "shop-static-v2"
api_prefix: "/backend"
"#;
    let config: Config = serde_yaml::from_str(yaml).expect("parse");
    assert_eq!(config.origin.as_str(), "https://shop.example/");
    assert_eq!(config.caches.static_assets, "shop-static-v2");
    // Unset fields keep their defaults
    assert_eq!(config.caches.dynamic, "app-dynamic-v1");
    assert_eq!(config.api_prefix, "/backend");
    assert_eq!(config.offline_page, "/offline.html");
  }
}
