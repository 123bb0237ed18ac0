//! A small in-process TTL cache for derived read views.
//!
//! This is deliberately shared mutable state with an explicit lifecycle:
//! initialised empty at process start, read by every status request, and
//! invalidated by the poller after every successfully committed event. A
//! mutex-guarded map is sufficient: staleness within the TTL window is
//! acceptable, so no ordering guarantee beyond eventual visibility is
//! needed between a write and a concurrent read.
//!
//! Expired entries are evicted lazily on access; there is no background
//! sweep.

use std::{
  collections::HashMap,
  sync::Mutex,
  time::{Duration, Instant},
};

/// The single well-known key for the aggregated park-status view.
pub const PARK_STATUS_KEY: &str = "park_status";

/// Default entry lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30);

struct Entry<V> {
  value:      V,
  expires_at: Instant,
}

pub struct TtlCache<V> {
  entries:     Mutex<HashMap<String, Entry<V>>>,
  default_ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
  pub fn new() -> Self {
    Self::with_default_ttl(DEFAULT_TTL)
  }

  pub fn with_default_ttl(default_ttl: Duration) -> Self {
    Self {
      entries: Mutex::new(HashMap::new()),
      default_ttl,
    }
  }

  /// Look up `key`, treating an expired entry as absent and evicting it.
  pub fn get(&self, key: &str) -> Option<V> {
    let mut entries = self.lock();
    match entries.get(key) {
      Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
      Some(_) => {
        entries.remove(key);
        None
      }
      None => None,
    }
  }

  /// Insert `value` under `key` with the cache's default TTL.
  pub fn set(&self, key: &str, value: V) {
    self.set_with_ttl(key, value, self.default_ttl);
  }

  pub fn set_with_ttl(&self, key: &str, value: V, ttl: Duration) {
    let entry = Entry {
      value,
      expires_at: Instant::now() + ttl,
    };
    self.lock().insert(key.to_owned(), entry);
  }

  /// Drop `key` immediately. Absent keys are fine; invalidation is
  /// idempotent.
  pub fn invalidate(&self, key: &str) {
    self.lock().remove(key);
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Entry<V>>> {
    // A poisoned lock only means a panic mid-insert; the map itself is
    // still usable.
    self.entries.lock().unwrap_or_else(|e| e.into_inner())
  }
}

impl<V: Clone> Default for TtlCache<V> {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use super::TtlCache;

  #[test]
  fn get_absent_key() {
    let cache: TtlCache<u32> = TtlCache::new();
    assert_eq!(cache.get("missing"), None);
  }

  #[test]
  fn set_then_get() {
    let cache = TtlCache::new();
    cache.set("k", 7u32);
    assert_eq!(cache.get("k"), Some(7));
  }

  #[test]
  fn expired_entry_is_absent_and_evicted() {
    let cache = TtlCache::new();
    cache.set_with_ttl("k", 7u32, Duration::from_millis(10));
    std::thread::sleep(Duration::from_millis(25));
    assert_eq!(cache.get("k"), None);
    // A second read after eviction is still absent.
    assert_eq!(cache.get("k"), None);
  }

  #[test]
  fn invalidate_removes_entry() {
    let cache = TtlCache::new();
    cache.set("k", 7u32);
    cache.invalidate("k");
    assert_eq!(cache.get("k"), None);
    // Invalidating a missing key is a no-op.
    cache.invalidate("k");
  }

  #[test]
  fn set_overwrites_previous_value() {
    let cache = TtlCache::new();
    cache.set("k", 1u32);
    cache.set("k", 2u32);
    assert_eq!(cache.get("k"), Some(2));
  }
}
