//! Admin-side parcel search.

use color_eyre::Result;
use url::Url;

use super::http::{endpoint, parse_base, HttpClient};
use super::types::{Page, Pageable, Parcel, ParcelFilters};

/// Client for the admin parcel endpoints. Searches here span every office;
/// office-scoped search lives on the frontdesk client.
#[derive(Clone)]
pub struct ParcelService {
  http: HttpClient,
  base: Url,
}

impl ParcelService {
  pub fn new(http: HttpClient, admin_url: &str) -> Result<Self> {
    Ok(ParcelService {
      http,
      base: parse_base(admin_url)?,
    })
  }

  /// Search parcels with filters and pagination.
  pub async fn search(
    &self,
    filters: &ParcelFilters,
    pageable: &Pageable,
  ) -> Result<Page<Parcel>> {
    let mut url = endpoint(&self.base, &["parcels"])?;
    apply_pageable(&mut url, pageable);
    apply_filters(&mut url, filters);
    self.http.get(url).await?.into_data()
  }
}

pub(crate) fn apply_pageable(url: &mut Url, pageable: &Pageable) {
  let mut pairs = url.query_pairs_mut();
  pairs.append_pair("page", &pageable.page.to_string());
  pairs.append_pair("size", &pageable.size.to_string());
  for sort in &pageable.sort {
    pairs.append_pair("sort", sort);
  }
}

pub(crate) fn apply_filters(url: &mut Url, filters: &ParcelFilters) {
  let mut pairs = url.query_pairs_mut();
  if let Some(v) = filters.is_pod {
    pairs.append_pair("isPOD", &v.to_string());
  }
  if let Some(v) = filters.is_delivered {
    pairs.append_pair("isDelivered", &v.to_string());
  }
  if let Some(v) = filters.is_parcel_assigned {
    pairs.append_pair("isParcelAssigned", &v.to_string());
  }
  if let Some(office_id) = &filters.office_id {
    pairs.append_pair("officeId", office_id);
  }
  if let Some(driver_id) = &filters.driver_id {
    pairs.append_pair("driverId", driver_id);
  }
  if let Some(v) = filters.has_called {
    pairs.append_pair("hasCalled", &v.to_string());
  }
}
