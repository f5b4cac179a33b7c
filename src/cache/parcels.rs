//! Cached parcel search results, keyed by filters plus page window.

use chrono::{DateTime, Duration, Utc};
use color_eyre::Result;
use sha2::{Digest, Sha256};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::api::types::{Page, Pageable, Parcel, ParcelFilters};
use crate::api::ParcelService;

use super::BoxFuture;

/// The request a parcel snapshot was fetched for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParcelQuery {
  pub filters: ParcelFilters,
  pub page: u32,
  pub size: u32,
}

impl ParcelQuery {
  pub fn new(filters: ParcelFilters, page: u32, size: u32) -> Self {
    ParcelQuery {
      filters,
      page,
      size,
    }
  }

  /// Canonical fingerprint of the query.
  ///
  /// Renders every filter field in a fixed order together with the page
  /// window, then hashes the rendering, so two queries that mean the same
  /// thing compare equal no matter how they were assembled.
  pub fn fingerprint(&self) -> String {
    let f = &self.filters;
    let input = format!(
      "pod:{:?}|delivered:{:?}|assigned:{:?}|office:{:?}|driver:{:?}|called:{:?}|page:{}|size:{}",
      f.is_pod,
      f.is_delivered,
      f.is_parcel_assigned,
      f.office_id,
      f.driver_id,
      f.has_called,
      self.page,
      self.size
    );
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
  }
}

impl Default for ParcelQuery {
  fn default() -> Self {
    ParcelQuery {
      filters: ParcelFilters::default(),
      page: 0,
      size: 50,
    }
  }
}

/// Pagination metadata of the cached snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
  pub page: u32,
  pub size: u32,
  pub total_elements: u64,
  pub total_pages: u32,
}

impl Default for PageInfo {
  fn default() -> Self {
    PageInfo {
      page: 0,
      size: 50,
      total_elements: 0,
      total_pages: 0,
    }
  }
}

type ParcelFetcher = Box<dyn Fn(ParcelQuery) -> BoxFuture<Result<Page<Parcel>>> + Send + Sync>;

#[derive(Default)]
struct ParcelState {
  parcels: Vec<Parcel>,
  page_info: PageInfo,
  query: Option<ParcelQuery>,
  last_fetch_time: Option<DateTime<Utc>>,
  last_error: Option<String>,
}

/// TTL cache over parcel search.
///
/// Freshness is two-part: the last fetch must be inside the window AND must
/// have been made for a query with the same fingerprint. Asking for a
/// different page or different filters always fetches, and the new snapshot
/// replaces the old one wholesale.
///
/// One instance per application session, shared via `Arc`. Consumers read
/// snapshots and ask for loads; only the load path writes.
pub struct ParcelCache {
  state: Mutex<ParcelState>,
  loading: AtomicBool,
  cache_duration: Duration,
  fetcher: ParcelFetcher,
}

impl ParcelCache {
  /// Cache backed by the real parcel service.
  pub fn new(service: ParcelService) -> Self {
    Self::with_fetcher(move |query: ParcelQuery| {
      let service = service.clone();
      async move {
        let pageable = Pageable {
          page: query.page,
          size: query.size,
          sort: Vec::new(),
        };
        service.search(&query.filters, &pageable).await
      }
    })
  }

  /// Cache with a custom fetch function. Used by tests.
  pub fn with_fetcher<F, Fut>(fetcher: F) -> Self
  where
    F: Fn(ParcelQuery) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Page<Parcel>>> + Send + 'static,
  {
    ParcelCache {
      state: Mutex::new(ParcelState::default()),
      loading: AtomicBool::new(false),
      cache_duration: Duration::minutes(5),
      fetcher: Box::new(move |query| Box::pin(fetcher(query))),
    }
  }

  /// Override the freshness window. Used by tests.
  pub fn with_cache_duration(mut self, cache_duration: Duration) -> Self {
    self.cache_duration = cache_duration;
    self
  }

  /// Serve `query` from cache when fresh, otherwise fetch.
  pub async fn load_if_needed(&self, query: ParcelQuery) {
    self.load(query, false).await;
  }

  /// Fetch `query` unconditionally, bypassing the freshness check.
  pub async fn refresh(&self, query: ParcelQuery) {
    self.load(query, true).await;
  }

  /// Drop the freshness timestamp so the next load refetches. The snapshot
  /// and its query stay readable.
  pub fn invalidate(&self) {
    self.lock_state().last_fetch_time = None;
  }

  /// One-off warm-up load of the default query, spawned when the
  /// application comes up.
  pub fn spawn_warm_up(self: &Arc<Self>) {
    let cache = Arc::clone(self);
    tokio::spawn(async move {
      cache.load_if_needed(ParcelQuery::default()).await;
    });
  }

  pub fn parcels(&self) -> Vec<Parcel> {
    self.lock_state().parcels.clone()
  }

  pub fn page_info(&self) -> PageInfo {
    self.lock_state().page_info
  }

  /// The query the current snapshot was fetched for, if any.
  pub fn query(&self) -> Option<ParcelQuery> {
    self.lock_state().query.clone()
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

  async fn load(&self, query: ParcelQuery, force: bool) {
    let now = Utc::now();
    if !force && self.is_fresh(&query, now) {
      tracing::debug!(fingerprint = %query.fingerprint(), "parcel cache fresh, skipping fetch");
      return;
    }

    self.loading.store(true, Ordering::SeqCst);
    let result = (self.fetcher)(query.clone()).await;

    let mut state = self.lock_state();
    match result {
      Ok(page) => {
        state.page_info = PageInfo {
          page: page.number,
          size: page.size,
          total_elements: page.total_elements,
          total_pages: page.total_pages,
        };
        state.parcels = page.content;
        state.query = Some(query);
        state.last_fetch_time = Some(now);
        state.last_error = None;
      }
      Err(e) => {
        // Keep the previous snapshot, its query and its timestamp; the next
        // load will see the cache as it was and retry.
        tracing::warn!("Failed to load parcels: {}", e);
        state.last_error = Some(e.to_string());
      }
    }
    drop(state);
    self.loading.store(false, Ordering::SeqCst);
  }

  fn is_fresh(&self, query: &ParcelQuery, now: DateTime<Utc>) -> bool {
    let state = self.lock_state();
    let fetched_at = match state.last_fetch_time {
      Some(t) => t,
      None => return false,
    };
    if now - fetched_at >= self.cache_duration {
      return false;
    }
    match &state.query {
      Some(cached) => cached.fingerprint() == query.fingerprint(),
      None => false,
    }
  }

  fn lock_state(&self) -> MutexGuard<'_, ParcelState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }
}
