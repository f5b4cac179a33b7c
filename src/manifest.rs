//! Rider-assignment manifest content.
//!
//! Assembles the printable manifest a dispatcher hands to a rider: a header
//! with the rider's name and generation time, and one row per parcel with a
//! blank signature cell for the customer to sign on delivery. Rendering to
//! PDF or paper is left to the embedding application; this module only
//! produces the content, pre-clamped to the printed column widths.

use chrono::{DateTime, Utc};

use crate::api::types::Parcel;

pub const MANIFEST_TITLE: &str = "CourierDesk - Rider Assignments";

/// Printed column headings, in row-cell order.
pub const COLUMNS: [&str; 5] = ["Recipient", "Phone", "Location", "Amount", "Signature"];

// Column width limits from the printed layout. Location gets more room
// because addresses run long.
const MAX_RECIPIENT: usize = 30;
const MAX_PHONE: usize = 25;
const MAX_LOCATION: usize = 50;

/// One printable manifest row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestRow {
  pub parcel_id: String,
  pub recipient: String,
  pub phone: String,
  pub location: String,
  pub amount: String,
}

impl ManifestRow {
  fn from_parcel(parcel: &Parcel) -> Self {
    let amount = match parcel.delivery_cost {
      Some(cost) => format!("GHS {:.2}", cost),
      None => "N/A".to_string(),
    };
    ManifestRow {
      parcel_id: parcel.parcel_id.clone(),
      recipient: clamp(parcel.receiver_name.as_deref(), MAX_RECIPIENT),
      phone: clamp(parcel.receiver_phone_number.as_deref(), MAX_PHONE),
      location: clamp(parcel.receiver_address.as_deref(), MAX_LOCATION),
      amount,
    }
  }

  /// The row's cells in [`COLUMNS`] order. The signature cell is always
  /// blank.
  pub fn cells(&self) -> [String; 5] {
    [
      self.recipient.clone(),
      self.phone.clone(),
      self.location.clone(),
      self.amount.clone(),
      String::new(),
    ]
  }
}

/// A rider's delivery manifest.
#[derive(Debug, Clone)]
pub struct AssignmentManifest {
  pub title: String,
  pub rider: Option<String>,
  pub generated_at: DateTime<Utc>,
  pub rows: Vec<ManifestRow>,
}

impl AssignmentManifest {
  /// Build a manifest for the given parcels, stamped with the current
  /// time.
  pub fn new(parcels: &[Parcel], rider: Option<&str>) -> Self {
    Self::at(parcels, rider, Utc::now())
  }

  /// Build a manifest with an explicit generation time.
  pub fn at(parcels: &[Parcel], rider: Option<&str>, generated_at: DateTime<Utc>) -> Self {
    AssignmentManifest {
      title: MANIFEST_TITLE.to_string(),
      rider: rider.map(String::from),
      generated_at,
      rows: parcels.iter().map(ManifestRow::from_parcel).collect(),
    }
  }

  /// Human-readable generation timestamp for the header, e.g.
  /// "June 5, 2025, 02:30 PM".
  pub fn generated_label(&self) -> String {
    self.generated_at.format("%B %-d, %Y, %I:%M %p").to_string()
  }

  /// Date-stamped file name for the saved manifest, without an extension.
  pub fn file_stem(&self) -> String {
    format!("rider-assignments-{}", self.generated_at.format("%Y-%m-%d"))
  }
}

/// Clamp text to a printed column width, marking the cut with "...".
/// Missing values print as "N/A".
fn clamp(text: Option<&str>, max_len: usize) -> String {
  let text = match text {
    Some(t) if !t.is_empty() => t,
    _ => return "N/A".to_string(),
  };
  if text.chars().count() <= max_len {
    text.to_string()
  } else {
    let cut: String = text.chars().take(max_len - 3).collect();
    format!("{}...", cut)
  }
}
