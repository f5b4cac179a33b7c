//! Location and station endpoints.

use color_eyre::{eyre::eyre, Result};
use url::Url;

use super::http::{endpoint, parse_base, HttpClient};
use super::types::{Location, NewLocation, NewStation, Station, UpdateLocation};

/// Client for location and station endpoints.
///
/// Listings come from the public offices surface, mutations from the admin
/// surface. Stations ride inside locations on the wire ("offices"); the
/// station listings here flatten them out.
#[derive(Clone)]
pub struct LocationService {
  http: HttpClient,
  offices_base: Url,
  admin_base: Url,
}

impl LocationService {
  pub fn new(http: HttpClient, offices_url: &str, admin_url: &str) -> Result<Self> {
    Ok(LocationService {
      http,
      offices_base: parse_base(offices_url)?,
      admin_base: parse_base(admin_url)?,
    })
  }

  /// List every location, stations included.
  pub async fn all(&self) -> Result<Vec<Location>> {
    let url = endpoint(&self.offices_base, &["locations"])?;
    self.http.get(url).await?.into_data()
  }

  /// Fetch a single location by id.
  pub async fn by_id(&self, location_id: &str) -> Result<Location> {
    if location_id.is_empty() {
      return Err(eyre!("Location id must not be empty"));
    }
    let url = endpoint(&self.offices_base, &[location_id])?;
    self.http.get(url).await?.into_data()
  }

  /// Every station across every location, flattened.
  pub async fn all_stations(&self) -> Result<Vec<Station>> {
    let locations = self.all().await?;
    Ok(flatten_stations(&locations))
  }

  /// The stations of one location.
  pub async fn stations(&self, location_id: &str) -> Result<Vec<Station>> {
    let location = self.by_id(location_id).await?;
    Ok(location.offices)
  }

  pub async fn create(&self, location: &NewLocation) -> Result<Location> {
    let url = endpoint(&self.admin_base, &["location"])?;
    self.http.post(url, location).await?.into_data()
  }

  pub async fn create_station(&self, station: &NewStation) -> Result<Station> {
    let url = endpoint(&self.admin_base, &["office"])?;
    self.http.post(url, station).await?.into_data()
  }

  pub async fn update(&self, location_id: &str, changes: &UpdateLocation) -> Result<Location> {
    if location_id.is_empty() {
      return Err(eyre!("Location id must not be empty"));
    }
    let url = endpoint(&self.admin_base, &["location", location_id])?;
    self.http.put(url, changes).await?.into_data()
  }

  /// Delete a location. Returns the server's acknowledgement message.
  pub async fn delete(&self, location_id: &str) -> Result<String> {
    if location_id.is_empty() {
      return Err(eyre!("Location id must not be empty"));
    }
    let url = endpoint(&self.admin_base, &["location", location_id])?;
    self
      .http
      .delete::<serde_json::Value>(url)
      .await?
      .into_message()
  }
}

/// Flatten every station out of a list of locations.
pub fn flatten_stations(locations: &[Location]) -> Vec<Station> {
  locations
    .iter()
    .flat_map(|location| location.offices.iter().cloned())
    .collect()
}
