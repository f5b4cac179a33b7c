//! Frontdesk operations: rider dispatch and parcel intake.

use color_eyre::{eyre::eyre, Result};
use url::Url;

use super::http::{endpoint, parse_base, HttpClient};
use super::parcels::{apply_filters, apply_pageable};
use super::types::{AssignParcels, NewParcel, Page, Pageable, Parcel, ParcelFilters, Rider};

/// Client for the frontdesk endpoints on the user surface.
///
/// Everything here runs in the scope of the authenticated user's office;
/// the backend infers the office from the bearer token.
#[derive(Clone)]
pub struct FrontdeskService {
  http: HttpClient,
  base: Url,
}

impl FrontdeskService {
  pub fn new(http: HttpClient, user_url: &str) -> Result<Self> {
    Ok(FrontdeskService {
      http,
      base: parse_base(user_url)?,
    })
  }

  /// List the riders attached to the current office.
  pub async fn riders(&self) -> Result<Vec<Rider>> {
    let url = endpoint(&self.base, &["riders"])?;
    self.http.get(url).await?.into_data()
  }

  /// Assign a batch of parcels to a rider. Returns the server's
  /// acknowledgement message.
  pub async fn assign_parcels(&self, rider_id: &str, parcel_ids: &[String]) -> Result<String> {
    if parcel_ids.is_empty() {
      return Err(eyre!("No parcels selected for assignment"));
    }
    let url = endpoint(&self.base, &["parcels", "assign"])?;
    let body = AssignParcels {
      rider_id: rider_id.to_string(),
      parcel_ids: parcel_ids.to_vec(),
    };
    self
      .http
      .post::<_, serde_json::Value>(url, &body)
      .await?
      .into_message()
  }

  /// Search parcels within the current office.
  pub async fn search_parcels(
    &self,
    filters: &ParcelFilters,
    pageable: &Pageable,
  ) -> Result<Page<Parcel>> {
    let mut url = endpoint(&self.base, &["parcels"])?;
    apply_pageable(&mut url, pageable);
    apply_filters(&mut url, filters);
    self.http.get(url).await?.into_data()
  }

  /// Register a parcel received at the desk.
  pub async fn register_parcel(&self, parcel: &NewParcel) -> Result<Parcel> {
    let url = endpoint(&self.base, &["parcels"])?;
    self.http.post(url, parcel).await?.into_data()
  }
}
