//! Cache storage trait, in-memory and SQLite implementations.

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection};
use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::http::{Request, Response};

use super::traits::{CacheKey, CachedResponse};

/// Trait for cache storage backends.
///
/// A backend holds named generations of request→response snapshots. Per-entry
/// puts are atomic (last write for a key wins); there are no cross-entry
/// transactions.
pub trait CacheStorage: Send + Sync {
  /// Create a generation if it does not exist yet.
  fn open(&self, generation: &str) -> Result<()>;

  /// Store a response snapshot, creating the generation on first write.
  fn put(&self, generation: &str, request: &Request, response: &Response) -> Result<()>;

  /// Look up a request in a single generation.
  fn match_in(&self, generation: &str, request: &Request) -> Result<Option<CachedResponse>>;

  /// Look up a request across all generations, oldest generation first.
  fn match_any(&self, request: &Request) -> Result<Option<CachedResponse>>;

  /// Delete a generation and everything in it. Returns whether it existed.
  fn delete_generation(&self, generation: &str) -> Result<bool>;

  /// Names of all generations currently present, in creation order.
  fn list_generations(&self) -> Result<Vec<String>>;
}

/// In-memory storage backend.
///
/// Holds everything in a mutex-guarded map; the substitutable backend for
/// tests and for embedders that do not want persistence.
#[derive(Default)]
pub struct MemoryStorage {
  // Vec keeps generation creation order, which match_any relies on.
  generations: Mutex<Vec<(String, BTreeMap<String, CachedResponse>)>>,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }
}

impl CacheStorage for MemoryStorage {
  fn open(&self, generation: &str) -> Result<()> {
    let mut generations = self
      .generations
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    if !generations.iter().any(|(name, _)| name == generation) {
      generations.push((generation.to_string(), BTreeMap::new()));
    }
    Ok(())
  }

  fn put(&self, generation: &str, request: &Request, response: &Response) -> Result<()> {
    let mut generations = self
      .generations
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    let entry = CachedResponse {
      response: response.clone(),
      cached_at: Utc::now(),
    };
    match generations.iter_mut().find(|(name, _)| name == generation) {
      Some((_, entries)) => {
        entries.insert(request.cache_key(), entry);
      }
      None => {
        let mut entries = BTreeMap::new();
        entries.insert(request.cache_key(), entry);
        generations.push((generation.to_string(), entries));
      }
    }
    Ok(())
  }

  fn match_in(&self, generation: &str, request: &Request) -> Result<Option<CachedResponse>> {
    let generations = self
      .generations
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    Ok(
      generations
        .iter()
        .find(|(name, _)| name == generation)
        .and_then(|(_, entries)| entries.get(&request.cache_key()).cloned()),
    )
  }

  fn match_any(&self, request: &Request) -> Result<Option<CachedResponse>> {
    let generations = self
      .generations
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    let key = request.cache_key();
    Ok(
      generations
        .iter()
        .find_map(|(_, entries)| entries.get(&key).cloned()),
    )
  }

  fn delete_generation(&self, generation: &str) -> Result<bool> {
    let mut generations = self
      .generations
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    let before = generations.len();
    generations.retain(|(name, _)| name != generation);
    Ok(generations.len() < before)
  }

  fn list_generations(&self) -> Result<Vec<String>> {
    let generations = self
      .generations
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    Ok(generations.iter().map(|(name, _)| name.clone()).collect())
  }
}

/// SQLite-based storage backend for persistent generations.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

impl SqliteStorage {
  /// Open the storage at the default location.
  pub fn open() -> Result<Self> {
    let path = Self::default_path()?;

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(&path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    Self::from_connection(conn)
  }

  /// Open the storage at an explicit path.
  pub fn open_at(path: &std::path::Path) -> Result<Self> {
    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;
    Self::from_connection(conn)
  }

  /// Open a throwaway in-memory database.
  pub fn open_in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| eyre!("Failed to open in-memory cache database: {}", e))?;
    Self::from_connection(conn)
  }

  fn from_connection(conn: Connection) -> Result<Self> {
    let storage = Self {
      conn: Mutex::new(conn),
    };
    storage.run_migrations()?;
    Ok(storage)
  }

  /// Get the default database path.
  fn default_path() -> Result<std::path::PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("swkit").join("cache.db"))
  }

  /// Run database migrations for cache tables.
  fn run_migrations(&self) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(())
  }
}

/// Schema for cache tables.
const CACHE_SCHEMA: &str = r#"
-- Named cache generations; id preserves creation order for lookups
CREATE TABLE IF NOT EXISTS generations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Response snapshots, keyed by generation + request digest
CREATE TABLE IF NOT EXISTS response_cache (
    generation TEXT NOT NULL,
    entry_key TEXT NOT NULL,
    method TEXT NOT NULL,
    url TEXT NOT NULL,
    status INTEGER NOT NULL,
    headers BLOB NOT NULL,
    body BLOB NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (generation, entry_key)
);

CREATE INDEX IF NOT EXISTS idx_response_cache_key ON response_cache(entry_key);
"#;

impl CacheStorage for SqliteStorage {
  fn open(&self, generation: &str) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute(
        "INSERT OR IGNORE INTO generations (name) VALUES (?)",
        params![generation],
      )
      .map_err(|e| eyre!("Failed to open generation {}: {}", generation, e))?;

    Ok(())
  }

  fn put(&self, generation: &str, request: &Request, response: &Response) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let headers = serde_json::to_vec(&response.headers)
      .map_err(|e| eyre!("Failed to serialize headers: {}", e))?;

    conn
      .execute(
        "INSERT OR IGNORE INTO generations (name) VALUES (?)",
        params![generation],
      )
      .map_err(|e| eyre!("Failed to open generation {}: {}", generation, e))?;

    conn
      .execute(
        "INSERT OR REPLACE INTO response_cache (generation, entry_key, method, url, status, headers, body, cached_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, datetime('now'))",
        params![
          generation,
          request.cache_key(),
          request.method.as_str(),
          request.url.as_str(),
          response.status,
          headers,
          response.body,
        ],
      )
      .map_err(|e| eyre!("Failed to store entry: {}", e))?;

    Ok(())
  }

  fn match_in(&self, generation: &str, request: &Request) -> Result<Option<CachedResponse>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let mut stmt = conn
      .prepare(
        "SELECT status, headers, body, cached_at FROM response_cache
         WHERE generation = ? AND entry_key = ?",
      )
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let row: Option<(u16, Vec<u8>, Vec<u8>, String)> = stmt
      .query_row(params![generation, request.cache_key()], |row| {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
      })
      .ok();

    row.map(restore_entry).transpose()
  }

  fn match_any(&self, request: &Request) -> Result<Option<CachedResponse>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let mut stmt = conn
      .prepare(
        "SELECT rc.status, rc.headers, rc.body, rc.cached_at FROM response_cache rc
         INNER JOIN generations g ON g.name = rc.generation
         WHERE rc.entry_key = ?
         ORDER BY g.id
         LIMIT 1",
      )
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let row: Option<(u16, Vec<u8>, Vec<u8>, String)> = stmt
      .query_row(params![request.cache_key()], |row| {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
      })
      .ok();

    row.map(restore_entry).transpose()
  }

  fn delete_generation(&self, generation: &str) -> Result<bool> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute(
        "DELETE FROM response_cache WHERE generation = ?",
        params![generation],
      )
      .map_err(|e| eyre!("Failed to delete entries of {}: {}", generation, e))?;

    let removed = conn
      .execute(
        "DELETE FROM generations WHERE name = ?",
        params![generation],
      )
      .map_err(|e| eyre!("Failed to delete generation {}: {}", generation, e))?;

    Ok(removed > 0)
  }

  fn list_generations(&self) -> Result<Vec<String>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let mut stmt = conn
      .prepare("SELECT name FROM generations ORDER BY id")
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let names: Vec<String> = stmt
      .query_map([], |row| row.get(0))
      .map_err(|e| eyre!("Failed to list generations: {}", e))?
      .filter_map(|r| r.ok())
      .collect();

    Ok(names)
  }
}

/// Rebuild a cached response from its stored columns.
fn restore_entry(
  (status, headers, body, cached_at): (u16, Vec<u8>, Vec<u8>, String),
) -> Result<CachedResponse> {
  let headers: Vec<(String, String)> =
    serde_json::from_slice(&headers).map_err(|e| eyre!("Failed to parse headers: {}", e))?;
  Ok(CachedResponse {
    response: Response {
      status,
      headers,
      body,
    },
    cached_at: parse_datetime(&cached_at)?,
  })
}

/// Parse a datetime string from SQLite format.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
  // SQLite stores as "YYYY-MM-DD HH:MM:SS"
  chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map(|dt| dt.and_utc())
    .map_err(|e| eyre!("Failed to parse datetime '{}': {}", s, e))
}
