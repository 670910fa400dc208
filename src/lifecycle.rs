//! Install and activate: seeding and retiring cache generations.

use color_eyre::{eyre::eyre, Result};
use tracing::info;

use crate::cache::CacheStorage;
use crate::config::Config;
use crate::fetch::Fetcher;
use crate::http::Request;

/// Outcome of a successful install.
#[derive(Debug)]
pub struct InstallReport {
  /// Generation the manifest was seeded into
  pub generation: String,
  /// URLs now present in it
  pub seeded: Vec<url::Url>,
}

/// Outcome of activation.
#[derive(Debug)]
pub struct ActivationReport {
  /// Generation names swept away
  pub removed: Vec<String>,
}

/// Seed the static generation from the precache manifest.
///
/// All manifest responses are fetched before the first write, so a failed
/// fetch leaves no partial shell behind. Any fetch failure, non-ok status or
/// write error fails the whole install; the host must not promote this
/// version.
pub async fn install<S, F>(storage: &S, fetcher: &F, config: &Config) -> Result<InstallReport>
where
  S: CacheStorage,
  F: Fetcher,
{
  info!("Installing, seeding {}", config.caches.static_assets);

  let mut entries = Vec::with_capacity(config.precache.len());
  for path in &config.precache {
    let url = config
      .origin
      .join(path)
      .map_err(|e| eyre!("Invalid precache path {}: {}", path, e))?;
    let request = Request::get(url);

    let response = fetcher
      .fetch(&request)
      .await
      .map_err(|e| eyre!("Failed to fetch precache asset {}: {}", request.url, e))?;
    if !response.ok() {
      return Err(eyre!(
        "Precache asset {} returned status {}",
        request.url,
        response.status
      ));
    }

    entries.push((request, response));
  }

  storage.open(&config.caches.static_assets)?;
  let mut seeded = Vec::with_capacity(entries.len());
  for (request, response) in &entries {
    storage.put(&config.caches.static_assets, request, response)?;
    seeded.push(request.url.clone());
  }

  info!("Installed with {} precached assets", seeded.len());
  Ok(InstallReport {
    generation: config.caches.static_assets.clone(),
    seeded,
  })
}

/// Sweep every generation whose name is not one of the two live identifiers.
pub fn activate<S: CacheStorage>(storage: &S, config: &Config) -> Result<ActivationReport> {
  let mut removed = Vec::new();
  for name in storage.list_generations()? {
    if name != config.caches.static_assets && name != config.caches.dynamic {
      info!("Removing old cache generation {}", name);
      storage.delete_generation(&name)?;
      removed.push(name);
    }
  }
  Ok(ActivationReport { removed })
}
