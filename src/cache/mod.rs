//! Short-TTL caches over the list endpoints.
//!
//! The three providers (locations, parcels, shelves) share one shape: each
//! remembers the last payload, when it was fetched and which request it was
//! fetched for, and skips the network while that snapshot is fresh. A
//! snapshot stays fresh for five minutes. `refresh` bypasses the check and
//! `invalidate` clears the timestamp so the next load refetches.
//!
//! A failed fetch keeps the previous snapshot and its timestamp, so the next
//! load retries instead of waiting out the window.
//!
//! Loads are not coalesced: freshness is checked before the fetch starts and
//! state is written only after it resolves, so overlapping loads may each
//! hit the network and the last one to resolve wins. Callers needing
//! stronger guarantees must serialize their own calls.

mod locations;
mod parcels;
mod shelves;

pub use locations::LocationCache;
pub use parcels::{PageInfo, ParcelCache, ParcelQuery};
pub use shelves::ShelfCache;

use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by provider fetchers.
pub(crate) type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
