//! Shelf lookup and management.

use color_eyre::{eyre::eyre, Result};
use url::Url;

use super::http::{endpoint, parse_base, HttpClient};
use super::types::{NewShelf, Shelf};

/// Client for the shelf endpoints.
///
/// Reads go through the user surface, shelf creation through the admin
/// surface, mirroring the backend's permission split.
#[derive(Clone)]
pub struct ShelfService {
  http: HttpClient,
  user_base: Url,
  admin_base: Url,
}

impl ShelfService {
  pub fn new(http: HttpClient, user_url: &str, admin_url: &str) -> Result<Self> {
    Ok(ShelfService {
      http,
      user_base: parse_base(user_url)?,
      admin_base: parse_base(admin_url)?,
    })
  }

  /// List the shelves configured for an office.
  pub async fn by_office(&self, office_id: &str) -> Result<Vec<Shelf>> {
    if office_id.is_empty() {
      return Err(eyre!("Office id must not be empty"));
    }
    let url = endpoint(&self.user_base, &["shelf", "office", office_id])?;
    self.http.get(url).await?.into_data()
  }

  /// Create a shelf in an office.
  pub async fn add(&self, name: &str, office_id: &str) -> Result<Shelf> {
    let url = endpoint(&self.admin_base, &["shelf"])?;
    let body = NewShelf {
      name: name.to_string(),
      office_id: office_id.to_string(),
    };
    self.http.post(url, &body).await?.into_data()
  }
}
