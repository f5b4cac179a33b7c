//! Cached location and station lists.

use chrono::{DateTime, Duration, Utc};
use color_eyre::Result;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::api::types::{Location, Station};
use crate::api::{flatten_stations, LocationService};

use super::BoxFuture;

type LocationFetcher = Box<dyn Fn() -> BoxFuture<Result<Vec<Location>>> + Send + Sync>;

#[derive(Default)]
struct LocationState {
  locations: Vec<Location>,
  stations: Vec<Station>,
  last_fetch_time: Option<DateTime<Utc>>,
  last_error: Option<String>,
}

/// TTL cache over the global location list.
///
/// There is no request key: the backend returns one list for everyone, so
/// freshness is purely time-based. The station list is flattened out of the
/// locations at the write point, so both views always describe the same
/// fetch.
///
/// One instance per application session, shared via `Arc`. Consumers read
/// snapshots and ask for loads; only the load path writes.
pub struct LocationCache {
  state: Mutex<LocationState>,
  loading: AtomicBool,
  cache_duration: Duration,
  fetcher: LocationFetcher,
}

impl LocationCache {
  /// Cache backed by the real location service.
  pub fn new(service: LocationService) -> Self {
    Self::with_fetcher(move || {
      let service = service.clone();
      async move { service.all().await }
    })
  }

  /// Cache with a custom fetch function. Used by tests.
  pub fn with_fetcher<F, Fut>(fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<Location>>> + Send + 'static,
  {
    LocationCache {
      state: Mutex::new(LocationState::default()),
      loading: AtomicBool::new(false),
      cache_duration: Duration::minutes(5),
      fetcher: Box::new(move || Box::pin(fetcher())),
    }
  }

  /// Override the freshness window. Used by tests.
  pub fn with_cache_duration(mut self, cache_duration: Duration) -> Self {
    self.cache_duration = cache_duration;
    self
  }

  /// Serve from cache when fresh, otherwise fetch.
  pub async fn load_if_needed(&self) {
    self.load(false).await;
  }

  /// Fetch unconditionally, bypassing the freshness check.
  pub async fn refresh(&self) {
    self.load(true).await;
  }

  /// Drop the freshness timestamp so the next load refetches. The snapshot
  /// itself stays readable.
  pub fn invalidate(&self) {
    self.lock_state().last_fetch_time = None;
  }

  /// One-off warm-up load, spawned when the application comes up.
  pub fn spawn_warm_up(self: &Arc<Self>) {
    let cache = Arc::clone(self);
    tokio::spawn(async move {
      cache.load_if_needed().await;
    });
  }

  pub fn locations(&self) -> Vec<Location> {
    self.lock_state().locations.clone()
  }

  pub fn stations(&self) -> Vec<Station> {
    self.lock_state().stations.clone()
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

  async fn load(&self, force: bool) {
    let now = Utc::now();
    if !force && self.is_fresh(now) {
      tracing::debug!("location cache fresh, skipping fetch");
      return;
    }

    self.loading.store(true, Ordering::SeqCst);
    let result = (self.fetcher)().await;

    let mut state = self.lock_state();
    match result {
      Ok(locations) => {
        state.stations = flatten_stations(&locations);
        state.locations = locations;
        state.last_fetch_time = Some(now);
        state.last_error = None;
      }
      Err(e) => {
        // Keep the previous snapshot and its timestamp; the next load will
        // see the cache as it was and retry.
        tracing::warn!("Failed to load locations: {}", e);
        state.last_error = Some(e.to_string());
      }
    }
    drop(state);
    self.loading.store(false, Ordering::SeqCst);
  }

  fn is_fresh(&self, now: DateTime<Utc>) -> bool {
    match self.lock_state().last_fetch_time {
      Some(fetched_at) => now - fetched_at < self.cache_duration,
      None => false,
    }
  }

  fn lock_state(&self) -> MutexGuard<'_, LocationState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use color_eyre::eyre::eyre;
  use serde_json::json;
  use std::sync::atomic::AtomicU32;

  fn two_locations() -> Vec<Location> {
    serde_json::from_value(json!([
      {
        "id": "LOC-1",
        "name": "Greater Accra",
        "offices": [
          {"id": "OFF-1", "name": "Accra Central"},
          {"id": "OFF-2", "name": "Madina"}
        ]
      },
      {"id": "LOC-2", "name": "Ashanti", "offices": [{"id": "OFF-3", "name": "Kumasi"}]}
    ]))
    .unwrap()
  }

  fn counting_cache(calls: Arc<AtomicU32>) -> LocationCache {
    LocationCache::with_fetcher(move || {
      let calls = calls.clone();
      async move {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(two_locations())
      }
    })
  }

  #[tokio::test]
  async fn a_fresh_cache_skips_the_fetch() {
    let calls = Arc::new(AtomicU32::new(0));
    let cache = counting_cache(calls.clone());

    cache.load_if_needed().await;
    cache.load_if_needed().await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.locations().len(), 2);
  }

  #[tokio::test]
  async fn stations_are_flattened_at_the_write_point() {
    let calls = Arc::new(AtomicU32::new(0));
    let cache = counting_cache(calls);

    cache.load_if_needed().await;

    let stations = cache.stations();
    assert_eq!(stations.len(), 3);
    assert_eq!(stations[2].id, "OFF-3");
  }

  #[tokio::test]
  async fn refresh_always_fetches() {
    let calls = Arc::new(AtomicU32::new(0));
    let cache = counting_cache(calls.clone());

    cache.load_if_needed().await;
    cache.refresh().await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn invalidate_forces_the_next_load_to_fetch() {
    let calls = Arc::new(AtomicU32::new(0));
    let cache = counting_cache(calls.clone());

    cache.load_if_needed().await;
    cache.invalidate();
    assert!(cache.last_fetch_time().is_none());
    // Snapshot survives invalidation until the refetch lands.
    assert_eq!(cache.locations().len(), 2);

    cache.load_if_needed().await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn an_expired_cache_refetches_and_advances_the_clock() {
    let calls = Arc::new(AtomicU32::new(0));
    let cache = counting_cache(calls.clone()).with_cache_duration(Duration::milliseconds(40));

    cache.load_if_needed().await;
    let first_fetch = cache.last_fetch_time().unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    cache.load_if_needed().await;
    assert_eq!(calls.load(Ordering::SeqCst), 1, "still inside the window");

    tokio::time::sleep(std::time::Duration::from_millis(60)).await;
    cache.load_if_needed().await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(cache.last_fetch_time().unwrap() > first_fetch);
  }

  #[tokio::test]
  async fn a_failed_fetch_keeps_the_previous_snapshot() {
    let calls = Arc::new(AtomicU32::new(0));
    let cache = {
      let calls = calls.clone();
      LocationCache::with_fetcher(move || {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        async move {
          if n == 0 {
            Ok(two_locations())
          } else {
            Err(eyre!("connection reset"))
          }
        }
      })
    };

    cache.load_if_needed().await;
    let first_fetch = cache.last_fetch_time().unwrap();

    cache.refresh().await;

    assert_eq!(cache.locations().len(), 2);
    assert_eq!(cache.last_fetch_time(), Some(first_fetch));
    assert!(cache.last_error().unwrap().contains("connection reset"));
  }

  #[tokio::test]
  async fn a_failure_does_not_restart_the_freshness_window() {
    let calls = Arc::new(AtomicU32::new(0));
    let cache = {
      let calls = calls.clone();
      LocationCache::with_fetcher(move || {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        async move {
          if n == 1 {
            Err(eyre!("gateway timeout"))
          } else {
            Ok(two_locations())
          }
        }
      })
    }
    .with_cache_duration(Duration::milliseconds(20));

    cache.load_if_needed().await;
    tokio::time::sleep(std::time::Duration::from_millis(40)).await;

    // Expired, so this load fetches and fails.
    cache.load_if_needed().await;
    assert!(cache.last_error().is_some());

    // The failure left the old timestamp in place, so the very next load
    // retries instead of treating the error as fresh data.
    cache.load_if_needed().await;
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(cache.last_error().is_none());
  }

  #[tokio::test]
  async fn a_successful_load_clears_the_last_error() {
    let calls = Arc::new(AtomicU32::new(0));
    let cache = {
      let calls = calls.clone();
      LocationCache::with_fetcher(move || {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        async move {
          if n == 0 {
            Err(eyre!("connection reset"))
          } else {
            Ok(two_locations())
          }
        }
      })
    };

    cache.load_if_needed().await;
    assert!(cache.last_error().is_some());

    cache.load_if_needed().await;
    assert!(cache.last_error().is_none());
  }

  #[tokio::test]
  async fn overlapping_loads_both_fetch() {
    let calls = Arc::new(AtomicU32::new(0));
    let cache = {
      let calls = calls.clone();
      LocationCache::with_fetcher(move || {
        calls.fetch_add(1, Ordering::SeqCst);
        async move {
          tokio::time::sleep(std::time::Duration::from_millis(30)).await;
          Ok(two_locations())
        }
      })
    };

    // Neither call sees the other's result: freshness was checked before
    // either fetch resolved.
    tokio::join!(cache.load_if_needed(), cache.load_if_needed());

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(cache.locations().len(), 2);
  }

  #[tokio::test]
  async fn warm_up_runs_one_load() {
    let calls = Arc::new(AtomicU32::new(0));
    let cache = Arc::new(counting_cache(calls.clone()));

    cache.spawn_warm_up();
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.locations().len(), 2);
  }
}
