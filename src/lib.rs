//! Client library for the CourierDesk parcel delivery backend.
//!
//! CourierDesk desks talk to three REST surfaces (admin, user and offices)
//! that all answer the same `{success, message, data}` envelope. This crate
//! bundles:
//!
//! - thin per-resource service clients ([`api`])
//! - five-minute TTL caches over the hot list endpoints ([`cache`])
//! - shared session state with expiry broadcasting ([`session`])
//! - printable rider-manifest assembly ([`manifest`])
//!
//! # Example
//!
//! ```ignore
//! use courierdesk::cache::ParcelQuery;
//! use courierdesk::config::Config;
//! use courierdesk::CourierDesk;
//!
//! let config = Config::load(None)?;
//! let (desk, mut session_events) = CourierDesk::new(&config)?;
//! desk.warm_up();
//!
//! desk.auth.login("+233201234567", "secret").await?;
//! desk.parcel_cache.load_if_needed(ParcelQuery::default()).await;
//! let parcels = desk.parcel_cache.parcels();
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod manifest;
pub mod session;

use std::sync::Arc;

use color_eyre::Result;
use tokio::sync::mpsc;

use crate::api::{
  AuthService, FrontdeskService, HttpClient, LocationService, ParcelService, ShelfService,
};
use crate::cache::{LocationCache, ParcelCache, ShelfCache};
use crate::config::Config;
use crate::session::{Session, SessionEvent};

/// The fully wired client: one session, every service, the three caches.
pub struct CourierDesk {
  pub session: Arc<Session>,
  pub auth: AuthService,
  pub parcels: ParcelService,
  pub shelves: ShelfService,
  pub locations: LocationService,
  pub frontdesk: FrontdeskService,
  pub parcel_cache: Arc<ParcelCache>,
  pub shelf_cache: Arc<ShelfCache>,
  pub location_cache: Arc<LocationCache>,
}

impl CourierDesk {
  /// Wire the full client from configuration.
  ///
  /// Returns the client plus the session event stream; watch it for
  /// [`SessionEvent::Expired`] to know when to send the user back to the
  /// login screen.
  pub fn new(config: &Config) -> Result<(Self, mpsc::UnboundedReceiver<SessionEvent>)> {
    let (session, events) = Session::new();
    let http = HttpClient::new(session.clone());

    let parcels = ParcelService::new(http.clone(), &config.api.admin_url)?;
    let shelves = ShelfService::new(http.clone(), &config.api.user_url, &config.api.admin_url)?;
    let locations =
      LocationService::new(http.clone(), &config.api.offices_url, &config.api.admin_url)?;
    let frontdesk = FrontdeskService::new(http.clone(), &config.api.user_url)?;
    let auth = AuthService::new(
      http,
      &config.api.user_url,
      &config.dialing_prefix,
      session.clone(),
    )?;

    let parcel_cache = Arc::new(ParcelCache::new(parcels.clone()));
    let shelf_cache = Arc::new(ShelfCache::new(shelves.clone()));
    let location_cache = Arc::new(LocationCache::new(locations.clone()));

    Ok((
      CourierDesk {
        session,
        auth,
        parcels,
        shelves,
        locations,
        frontdesk,
        parcel_cache,
        shelf_cache,
        location_cache,
      },
      events,
    ))
  }

  /// Kick off the start-up warm-up loads: locations and the default parcel
  /// page. Shelves wait until a caller names an office.
  pub fn warm_up(&self) {
    self.location_cache.spawn_warm_up();
    self.parcel_cache.spawn_warm_up();
  }
}
