//! Serde types matching CourierDesk API payloads.
//!
//! Every endpoint wraps its payload in the same `{success, message, data}`
//! envelope; paginated endpoints nest a Spring-style page object inside
//! `data`. Wire names are camelCase, including one long-standing backend
//! misspelling that is renamed here once so the rest of the crate never
//! sees it.

use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};

// ============================================================================
// Response envelope
// ============================================================================

/// Uniform response wrapper used by every CourierDesk endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
  pub success: bool,
  #[serde(default)]
  pub message: String,
  pub data: Option<T>,
}

impl<T> Envelope<T> {
  /// Resolve the envelope into its payload.
  ///
  /// `success: false` surfaces the server's message as the error; a
  /// successful envelope with no payload is treated as malformed.
  pub fn into_data(self) -> Result<T> {
    if !self.success {
      return Err(failure(self.message));
    }
    self
      .data
      .ok_or_else(|| eyre!("Response reported success but carried no data"))
  }

  /// Resolve an envelope whose payload does not matter, keeping only the
  /// server's message. Used for acknowledgement-style endpoints.
  pub fn into_message(self) -> Result<String> {
    if !self.success {
      return Err(failure(self.message));
    }
    Ok(self.message)
  }
}

fn failure(message: String) -> color_eyre::Report {
  if message.is_empty() {
    eyre!("Request failed")
  } else {
    eyre!("{}", message)
  }
}

/// One page of results as the backend reports it.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
  #[serde(default)]
  pub content: Vec<T>,
  pub total_elements: u64,
  pub total_pages: u32,
  pub size: u32,
  pub number: u32,
  #[serde(default)]
  pub number_of_elements: u32,
  #[serde(default)]
  pub first: bool,
  #[serde(default)]
  pub last: bool,
  #[serde(default)]
  pub empty: bool,
}

// ============================================================================
// Resources
// ============================================================================

/// A parcel as returned by the search and intake endpoints.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Parcel {
  pub parcel_id: String,
  pub sender_name: Option<String>,
  pub sender_phone_number: Option<String>,
  pub receiver_name: Option<String>,
  pub receiver_address: Option<String>,
  /// The backend has always misspelled this wire field; keep the rename
  /// here and nowhere else.
  #[serde(rename = "recieverPhoneNumber")]
  pub receiver_phone_number: Option<String>,
  pub parcel_description: Option<String>,
  pub shelf_number: Option<String>,
  pub driver_name: Option<String>,
  pub driver_phone_number: Option<String>,
  pub inbound_cost: Option<f64>,
  pub pick_up_cost: Option<f64>,
  pub delivery_cost: Option<f64>,
  pub storage_cost: Option<f64>,
  #[serde(default)]
  pub pod: bool,
  #[serde(default)]
  pub delivered: bool,
  #[serde(default)]
  pub parcel_assigned: bool,
  #[serde(default)]
  pub fragile: bool,
}

/// Slim office reference embedded in other resources.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OfficeSummary {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub code: String,
  pub address: Option<String>,
}

/// A storage shelf within an office.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Shelf {
  pub id: String,
  pub name: String,
  pub office: Option<OfficeSummary>,
}

/// A station (called "office" on the wire) within a location.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Station {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub code: String,
  #[serde(default)]
  pub address: String,
  #[serde(default)]
  pub location_name: String,
  #[serde(default)]
  pub manager_name: String,
  /// Creation time in epoch milliseconds.
  #[serde(default)]
  pub created_at: i64,
}

/// A geographic location grouping one or more stations.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Location {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub region: String,
  #[serde(default)]
  pub country: String,
  #[serde(default)]
  pub offices: Vec<Station>,
}

/// A delivery rider available for assignment.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Rider {
  pub user_id: String,
  pub name: Option<String>,
  pub email: Option<String>,
  pub phone_number: Option<String>,
  /// Backend status string, e.g. "ACTIVE" or "INACTIVE".
  pub status: Option<String>,
  pub office: Option<OfficeSummary>,
}

/// The authenticated user as stored in the session.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id: String,
  pub name: Option<String>,
  pub email: Option<String>,
  pub phone_number: Option<String>,
  /// Backend role string: "ADMIN", "MANAGER" or "RIDER".
  pub role: Option<String>,
  pub office: Option<OfficeSummary>,
}

/// Payload returned by a successful login.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
  pub token: String,
  pub user: Option<User>,
}

/// Server acknowledgement of a password-reset request. The verification id
/// must be echoed back together with the OTP the user received.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetChallenge {
  pub verification_id: String,
}

// ============================================================================
// Query parameters
// ============================================================================

/// Search filters for parcel queries. Only set fields become query
/// parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParcelFilters {
  pub is_pod: Option<bool>,
  pub is_delivered: Option<bool>,
  pub is_parcel_assigned: Option<bool>,
  pub office_id: Option<String>,
  pub driver_id: Option<String>,
  pub has_called: Option<bool>,
}

/// Pagination request parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pageable {
  pub page: u32,
  pub size: u32,
  /// Sort expressions in backend form, e.g. "createdAt,desc".
  pub sort: Vec<String>,
}

impl Default for Pageable {
  fn default() -> Self {
    Pageable {
      page: 0,
      size: 50,
      sort: Vec::new(),
    }
  }
}

// ============================================================================
// Request bodies
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewShelf {
  pub name: String,
  pub office_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLocation {
  pub name: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub region: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub country: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStation {
  pub name: String,
  pub address: String,
  pub location_id: String,
  /// Only sent when present; the backend rejects an explicit null here.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub manager_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLocation {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub region: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub country: Option<String>,
}

/// Intake payload for a parcel received at the frontdesk.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewParcel {
  pub sender_name: String,
  pub sender_phone_number: String,
  pub receiver_name: String,
  #[serde(rename = "recieverPhoneNumber")]
  pub receiver_phone_number: String,
  pub receiver_address: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub parcel_description: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub pick_up_cost: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub delivery_cost: Option<f64>,
  pub fragile: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignParcels {
  pub rider_id: String,
  pub parcel_ids: Vec<String>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn envelope_success_yields_data() {
    let envelope: Envelope<Vec<String>> = serde_json::from_str(
      r#"{"success": true, "message": "ok", "data": ["a", "b"]}"#,
    )
    .unwrap();

    assert_eq!(envelope.into_data().unwrap(), vec!["a", "b"]);
  }

  #[test]
  fn envelope_failure_surfaces_the_server_message() {
    let envelope: Envelope<Vec<String>> = serde_json::from_str(
      r#"{"success": false, "message": "Office not found", "data": null}"#,
    )
    .unwrap();

    let err = envelope.into_data().unwrap_err().to_string();
    assert_eq!(err, "Office not found");
  }

  #[test]
  fn envelope_success_without_data_is_malformed() {
    let envelope: Envelope<Vec<String>> =
      serde_json::from_str(r#"{"success": true, "message": "", "data": null}"#).unwrap();

    let err = envelope.into_data().unwrap_err().to_string();
    assert!(err.contains("no data"), "unexpected error: {}", err);
  }

  #[test]
  fn envelope_failure_without_message_has_a_fallback() {
    let envelope: Envelope<Vec<String>> =
      serde_json::from_str(r#"{"success": false, "data": null}"#).unwrap();

    let err = envelope.into_data().unwrap_err().to_string();
    assert_eq!(err, "Request failed");
  }

  #[test]
  fn into_message_keeps_the_acknowledgement() {
    let envelope: Envelope<serde_json::Value> = serde_json::from_str(
      r#"{"success": true, "message": "Parcels assigned successfully", "data": null}"#,
    )
    .unwrap();

    assert_eq!(
      envelope.into_message().unwrap(),
      "Parcels assigned successfully"
    );
  }

  #[test]
  fn parcel_maps_the_misspelled_phone_field() {
    let parcel: Parcel = serde_json::from_str(
      r#"{
        "parcelId": "P-001",
        "receiverName": "Ama Serwaa",
        "recieverPhoneNumber": "+233201234567",
        "deliveryCost": 25.5,
        "delivered": false
      }"#,
    )
    .unwrap();

    assert_eq!(parcel.parcel_id, "P-001");
    assert_eq!(parcel.receiver_phone_number.as_deref(), Some("+233201234567"));
    assert_eq!(parcel.delivery_cost, Some(25.5));
    assert!(!parcel.pod);
  }

  #[test]
  fn new_parcel_writes_the_misspelled_phone_field() {
    let body = NewParcel {
      sender_name: "Kofi Mensah".to_string(),
      sender_phone_number: "+233200000001".to_string(),
      receiver_name: "Ama Serwaa".to_string(),
      receiver_phone_number: "+233200000002".to_string(),
      receiver_address: "12 Ring Road, Accra".to_string(),
      parcel_description: None,
      pick_up_cost: None,
      delivery_cost: Some(25.0),
      fragile: false,
    };

    let json = serde_json::to_value(&body).unwrap();

    assert_eq!(json["recieverPhoneNumber"], "+233200000002");
    assert!(json.get("parcelDescription").is_none());
  }

  #[test]
  fn page_defaults_the_optional_flags() {
    let page: Page<Parcel> = serde_json::from_str(
      r#"{"content": [], "totalElements": 0, "totalPages": 0, "size": 50, "number": 0}"#,
    )
    .unwrap();

    assert!(page.content.is_empty());
    assert_eq!(page.size, 50);
    assert!(!page.first);
  }

  #[test]
  fn new_station_omits_an_absent_manager() {
    let body = NewStation {
      name: "Kumasi Central".to_string(),
      address: "Adum, Kumasi".to_string(),
      location_id: "LOC-1".to_string(),
      manager_id: None,
    };

    let json = serde_json::to_value(&body).unwrap();
    assert!(json.get("managerId").is_none());

    let body = NewStation {
      manager_id: Some("USR-9".to_string()),
      ..body
    };
    let json = serde_json::to_value(&body).unwrap();
    assert_eq!(json["managerId"], "USR-9");
  }
}
