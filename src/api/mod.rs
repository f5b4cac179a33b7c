//! REST clients for the CourierDesk backend.
//!
//! One thin service per resource over a shared [`HttpClient`]. Every
//! endpoint speaks the uniform `{success, message, data}` envelope; the
//! services resolve it and hand back plain payloads. Nothing in this module
//! caches; the providers in [`crate::cache`] sit on top of these.

mod auth;
mod frontdesk;
mod http;
mod locations;
mod parcels;
mod shelves;
pub mod types;

pub use auth::AuthService;
pub use frontdesk::FrontdeskService;
pub use http::HttpClient;
pub use locations::{flatten_stations, LocationService};
pub use parcels::ParcelService;
pub use shelves::ShelfService;
