//! Authentication: login and password recovery.

use color_eyre::{eyre::eyre, Result};
use serde_json::json;
use std::sync::Arc;
use url::Url;

use crate::session::Session;

use super::http::{endpoint, parse_base, HttpClient};
use super::types::{LoginData, PasswordResetChallenge};

/// Client for the authentication endpoints.
///
/// A successful login is written straight into the shared [`Session`], so
/// every other service picks the token up on its next request.
#[derive(Clone)]
pub struct AuthService {
  http: HttpClient,
  base: Url,
  dialing_prefix: String,
  session: Arc<Session>,
}

impl AuthService {
  pub fn new(
    http: HttpClient,
    user_url: &str,
    dialing_prefix: &str,
    session: Arc<Session>,
  ) -> Result<Self> {
    Ok(AuthService {
      http,
      base: parse_base(user_url)?,
      dialing_prefix: dialing_prefix.to_string(),
      session,
    })
  }

  /// Log in with a full phone number and password. Stores the returned
  /// token and user in the session.
  pub async fn login(&self, phone_number: &str, password: &str) -> Result<LoginData> {
    if phone_number.is_empty() || password.is_empty() {
      return Err(eyre!("Phone number and password are required"));
    }
    let url = endpoint(&self.base, &["auth", "login"])?;
    let body = json!({
      "phoneNumber": phone_number,
      "password": password,
    });
    let data: LoginData = self.http.post(url, &body).await?.into_data()?;
    self
      .session
      .establish(data.token.clone(), data.user.clone())
      .await;
    Ok(data)
  }

  /// Drop the session locally. The backend keeps no server-side session to
  /// tear down.
  pub async fn logout(&self) {
    self.session.logout().await;
  }

  /// Ask the backend to text an OTP to the given local phone number.
  ///
  /// The number is the 9 digits after the dialing prefix; the prefix is
  /// prepended here. Keep the returned challenge: its verification id must
  /// accompany the OTP in [`reset_password`](Self::reset_password).
  pub async fn request_password_reset(&self, local_phone: &str) -> Result<PasswordResetChallenge> {
    let phone_number = full_phone_number(&self.dialing_prefix, local_phone)?;
    let url = endpoint(&self.base, &["auth", "forgot-password"])?;
    let body = json!({ "phoneNumber": phone_number });
    self.http.post(url, &body).await?.into_data()
  }

  /// Complete a password reset with the texted OTP.
  pub async fn reset_password(
    &self,
    verification_id: &str,
    otp: &str,
    new_password: &str,
  ) -> Result<String> {
    let otp = otp.trim();
    if verification_id.is_empty() {
      return Err(eyre!("Verification id is missing; request a new OTP"));
    }
    if otp.len() < 4 {
      return Err(eyre!("OTP must be at least 4 digits"));
    }
    if new_password.len() < 6 {
      return Err(eyre!("Password must be at least 6 characters"));
    }
    let url = endpoint(&self.base, &["auth", "reset-password"])?;
    let body = json!({
      "verificationId": verification_id,
      "otp": otp,
      "newPassword": new_password,
    });
    self
      .http
      .post::<_, serde_json::Value>(url, &body)
      .await?
      .into_message()
  }
}

/// Build a full phone number from the local part the user typed.
///
/// Spaces are stripped; a number already carrying a "+" prefix passes
/// through untouched. Otherwise the local part must be exactly 9 digits.
fn full_phone_number(prefix: &str, local: &str) -> Result<String> {
  let cleaned: String = local.chars().filter(|c| !c.is_whitespace()).collect();
  if cleaned.starts_with('+') {
    return Ok(cleaned);
  }
  if cleaned.len() != 9 || !cleaned.chars().all(|c| c.is_ascii_digit()) {
    return Err(eyre!("Phone number must be 9 digits"));
  }
  Ok(format!("{}{}", prefix, cleaned))
}
