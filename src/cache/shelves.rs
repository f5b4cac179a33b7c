//! Cached shelf lists, keyed by office.

use chrono::{DateTime, Duration, Utc};
use color_eyre::Result;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::api::types::Shelf;
use crate::api::ShelfService;

use super::BoxFuture;

type ShelfFetcher = Box<dyn Fn(String) -> BoxFuture<Result<Vec<Shelf>>> + Send + Sync>;

#[derive(Default)]
struct ShelfState {
  shelves: Vec<Shelf>,
  office_id: Option<String>,
  last_fetch_time: Option<DateTime<Utc>>,
  last_error: Option<String>,
}

/// TTL cache over per-office shelf lists.
///
/// The request key is the office id: asking for a different office always
/// fetches and replaces the snapshot. Unlike the other caches, freshness
/// here additionally requires the cached list to be non-empty, so an office
/// that last answered with zero shelves is refetched on every load even
/// inside the window. The tests pin this asymmetry down.
///
/// There is no warm-up: shelves are only loaded once a caller names an
/// office.
pub struct ShelfCache {
  state: Mutex<ShelfState>,
  loading: AtomicBool,
  cache_duration: Duration,
  fetcher: ShelfFetcher,
}

impl ShelfCache {
  /// Cache backed by the real shelf service.
  pub fn new(service: ShelfService) -> Self {
    Self::with_fetcher(move |office_id: String| {
      let service = service.clone();
      async move { service.by_office(&office_id).await }
    })
  }

  /// Cache with a custom fetch function. Used by tests.
  pub fn with_fetcher<F, Fut>(fetcher: F) -> Self
  where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<Shelf>>> + Send + 'static,
  {
    ShelfCache {
      state: Mutex::new(ShelfState::default()),
      loading: AtomicBool::new(false),
      cache_duration: Duration::minutes(5),
      fetcher: Box::new(move |office_id| Box::pin(fetcher(office_id))),
    }
  }

  /// Override the freshness window. Used by tests.
  pub fn with_cache_duration(mut self, cache_duration: Duration) -> Self {
    self.cache_duration = cache_duration;
    self
  }

  /// Serve `office_id` from cache when fresh, otherwise fetch.
  pub async fn load_if_needed(&self, office_id: &str) {
    self.load(office_id, false).await;
  }

  /// Fetch `office_id` unconditionally, bypassing the freshness check.
  pub async fn refresh(&self, office_id: &str) {
    self.load(office_id, true).await;
  }

  /// Drop the freshness timestamp and the remembered office so the next
  /// load refetches. The shelf list itself stays readable.
  pub fn invalidate(&self) {
    let mut state = self.lock_state();
    state.last_fetch_time = None;
    state.office_id = None;
  }

  pub fn shelves(&self) -> Vec<Shelf> {
    self.lock_state().shelves.clone()
  }

  /// The office the current snapshot belongs to, if any.
  pub fn office_id(&self) -> Option<String> {
    self.lock_state().office_id.clone()
  }

  pub fn last_fetch_time(&self) -> Option<DateTime<Utc>> {
    self.lock_state().last_fetch_time
  }

  pub fn last_error(&self) -> Option<String> {
    self.lock_state().last_error.clone()
  }

  pub fn is_loading(&self) -> bool {
    self.loading.load(Ordering::SeqCst)
  }

  async fn load(&self, office_id: &str, force: bool) {
    let now = Utc::now();
    if !force && self.is_fresh(office_id, now) {
      tracing::debug!(office_id, "shelf cache fresh, skipping fetch");
      return;
    }

    self.loading.store(true, Ordering::SeqCst);
    let result = (self.fetcher)(office_id.to_string()).await;

    let mut state = self.lock_state();
    match result {
      Ok(shelves) => {
        state.shelves = shelves;
        state.office_id = Some(office_id.to_string());
        state.last_fetch_time = Some(now);
        state.last_error = None;
      }
      Err(e) => {
        // Keep the previous snapshot, its office and its timestamp; the
        // next load will see the cache as it was and retry.
        tracing::warn!("Failed to load shelves for office {}: {}", office_id, e);
        state.last_error = Some(e.to_string());
      }
    }
    drop(state);
    self.loading.store(false, Ordering::SeqCst);
  }

  fn is_fresh(&self, office_id: &str, now: DateTime<Utc>) -> bool {
    let state = self.lock_state();
    let fetched_at = match state.last_fetch_time {
      Some(t) => t,
      None => return false,
    };
    if now - fetched_at >= self.cache_duration {
      return false;
    }
    state.office_id.as_deref() == Some(office_id) && !state.shelves.is_empty()
  }

  fn lock_state(&self) -> MutexGuard<'_, ShelfState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use color_eyre::eyre::eyre;
  use serde_json::json;
  use std::sync::atomic::AtomicU32;
  use std::sync::Arc;

  fn shelves_for(office_id: &str) -> Vec<Shelf> {
    serde_json::from_value(json!([
      {"id": format!("SH-{office_id}-1"), "name": "A1"},
      {"id": format!("SH-{office_id}-2"), "name": "A2"}
    ]))
    .unwrap()
  }

  fn counting_cache(calls: Arc<AtomicU32>) -> ShelfCache {
    ShelfCache::with_fetcher(move |office_id: String| {
      let calls = calls.clone();
      async move {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(shelves_for(&office_id))
      }
    })
  }

  #[tokio::test]
  async fn the_same_office_inside_the_window_skips_the_fetch() {
    let calls = Arc::new(AtomicU32::new(0));
    let cache = counting_cache(calls.clone());

    cache.load_if_needed("OFF-1").await;
    cache.load_if_needed("OFF-1").await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.shelves().len(), 2);
    assert_eq!(cache.office_id().as_deref(), Some("OFF-1"));
  }

  #[tokio::test]
  async fn a_different_office_fetches_and_replaces_the_snapshot() {
    let calls = Arc::new(AtomicU32::new(0));
    let cache = counting_cache(calls.clone());

    cache.load_if_needed("OFF-1").await;
    cache.load_if_needed("OFF-2").await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(cache.office_id().as_deref(), Some("OFF-2"));
    assert_eq!(cache.shelves()[0].id, "SH-OFF-2-1");
  }

  #[tokio::test]
  async fn an_empty_snapshot_is_never_treated_as_fresh() {
    let calls = Arc::new(AtomicU32::new(0));
    let cache = {
      let calls = calls.clone();
      ShelfCache::with_fetcher(move |_office_id: String| {
        calls.fetch_add(1, Ordering::SeqCst);
        async move { Ok(Vec::new()) }
      })
    };

    cache.load_if_needed("OFF-1").await;
    // Same office, inside the window: the other caches would skip here,
    // but an empty shelf list is refetched every time.
    cache.load_if_needed("OFF-1").await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(cache.shelves().is_empty());
  }

  #[tokio::test]
  async fn refresh_always_fetches() {
    let calls = Arc::new(AtomicU32::new(0));
    let cache = counting_cache(calls.clone());

    cache.load_if_needed("OFF-1").await;
    cache.refresh("OFF-1").await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn invalidate_clears_the_remembered_office() {
    let calls = Arc::new(AtomicU32::new(0));
    let cache = counting_cache(calls.clone());

    cache.load_if_needed("OFF-1").await;
    cache.invalidate();

    assert!(cache.office_id().is_none());
    assert!(cache.last_fetch_time().is_none());
    // Snapshot survives invalidation until the refetch lands.
    assert_eq!(cache.shelves().len(), 2);

    cache.load_if_needed("OFF-1").await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn an_expired_cache_refetches() {
    let calls = Arc::new(AtomicU32::new(0));
    let cache = counting_cache(calls.clone()).with_cache_duration(Duration::milliseconds(30));

    cache.load_if_needed("OFF-1").await;
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    cache.load_if_needed("OFF-1").await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn a_failed_fetch_keeps_the_previous_office_and_shelves() {
    let calls = Arc::new(AtomicU32::new(0));
    let cache = {
      let calls = calls.clone();
      ShelfCache::with_fetcher(move |office_id: String| {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        async move {
          if n == 0 {
            Ok(shelves_for(&office_id))
          } else {
            Err(eyre!("connection reset"))
          }
        }
      })
    };

    cache.load_if_needed("OFF-1").await;
    let first_fetch = cache.last_fetch_time().unwrap();

    cache.load_if_needed("OFF-2").await;

    assert_eq!(cache.office_id().as_deref(), Some("OFF-1"));
    assert_eq!(cache.shelves().len(), 2);
    assert_eq!(cache.last_fetch_time(), Some(first_fetch));
    assert!(cache.last_error().unwrap().contains("connection reset"));
  }

  #[tokio::test]
  async fn overlapping_loads_both_fetch() {
    let calls = Arc::new(AtomicU32::new(0));
    let cache = {
      let calls = calls.clone();
      ShelfCache::with_fetcher(move |office_id: String| {
        calls.fetch_add(1, Ordering::SeqCst);
        async move {
          tokio::time::sleep(std::time::Duration::from_millis(30)).await;
          Ok(shelves_for(&office_id))
        }
      })
    };

    tokio::join!(cache.load_if_needed("OFF-1"), cache.load_if_needed("OFF-1"));

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(cache.office_id().as_deref(), Some("OFF-1"));
  }
}
