//! Shared HTTP transport for the service clients.
//!
//! Every request goes through one [`HttpClient`]: it attaches the session's
//! bearer token, decodes the uniform response envelope, and turns a 401 from
//! any endpoint into a process-wide session expiry. Services stay thin; they
//! only build URLs and resolve envelopes.

use color_eyre::{eyre::eyre, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use url::Url;

use crate::session::Session;

use super::types::Envelope;

#[derive(Clone)]
pub struct HttpClient {
  http: reqwest::Client,
  session: Arc<Session>,
}

impl HttpClient {
  pub fn new(session: Arc<Session>) -> Self {
    HttpClient {
      http: reqwest::Client::new(),
      session,
    }
  }

  pub async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<Envelope<T>> {
    tracing::debug!("GET {}", url);
    self.send(self.http.get(url.clone()), &url).await
  }

  pub async fn post<B: Serialize, T: DeserializeOwned>(
    &self,
    url: Url,
    body: &B,
  ) -> Result<Envelope<T>> {
    tracing::debug!("POST {}", url);
    self.send(self.http.post(url.clone()).json(body), &url).await
  }

  pub async fn put<B: Serialize, T: DeserializeOwned>(
    &self,
    url: Url,
    body: &B,
  ) -> Result<Envelope<T>> {
    tracing::debug!("PUT {}", url);
    self.send(self.http.put(url.clone()).json(body), &url).await
  }

  pub async fn delete<T: DeserializeOwned>(&self, url: Url) -> Result<Envelope<T>> {
    tracing::debug!("DELETE {}", url);
    self.send(self.http.delete(url.clone()), &url).await
  }

  async fn send<T: DeserializeOwned>(
    &self,
    request: reqwest::RequestBuilder,
    url: &Url,
  ) -> Result<Envelope<T>> {
    let request = match self.session.token().await {
      Some(token) => request.bearer_auth(token),
      None => request,
    };

    let response = request
      .send()
      .await
      .map_err(|e| eyre!("Request to {} failed: {}", url, e))?;

    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
      // The token is dead for every endpoint, not just this one.
      self.session.expire().await;
      return Err(eyre!("Session expired (401 from {})", url));
    }
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(server_error(status, &body));
    }

    response
      .json::<Envelope<T>>()
      .await
      .map_err(|e| eyre!("Failed to decode response from {}: {}", url, e))
  }
}

/// Prefer the envelope's own message when an error response still carries
/// one; fall back to the bare status.
fn server_error(status: StatusCode, body: &str) -> color_eyre::Report {
  match serde_json::from_str::<Envelope<serde_json::Value>>(body) {
    Ok(envelope) if !envelope.message.is_empty() => eyre!("{}", envelope.message),
    _ => eyre!("Server error ({})", status.as_u16()),
  }
}

/// Parse a configured base URL.
pub(crate) fn parse_base(url: &str) -> Result<Url> {
  let parsed = Url::parse(url).map_err(|e| eyre!("Invalid API base URL {}: {}", url, e))?;
  if parsed.cannot_be_a_base() {
    return Err(eyre!("API base URL cannot take paths: {}", url));
  }
  Ok(parsed)
}

/// Join a base URL with path segments, tolerating a trailing slash on the
/// base.
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
  let mut url = base.clone();
  {
    let mut path = url
      .path_segments_mut()
      .map_err(|_| eyre!("API base URL cannot take paths: {}", base))?;
    path.pop_if_empty();
    for segment in segments {
      path.push(segment);
    }
  }
  Ok(url)
}
