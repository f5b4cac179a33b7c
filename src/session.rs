//! Shared authentication state.
//!
//! One [`Session`] lives for the whole application run and is shared via
//! `Arc` by every service client. It holds the bearer token and the
//! authenticated user, and broadcasts lifecycle transitions over an
//! unbounded channel so the embedding application can react, e.g. return to
//! the login screen when the backend rejects the token.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::RwLock;

use crate::api::types::User;
use crate::config::Config;

/// Session lifecycle transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
  /// A login stored a fresh token.
  LoggedIn,
  /// The user logged out locally.
  LoggedOut,
  /// Any request answered 401; the whole session is over, not just the
  /// request that hit it.
  Expired,
}

pub struct Session {
  token: RwLock<Option<String>>,
  user: RwLock<Option<User>>,
  events: mpsc::UnboundedSender<SessionEvent>,
}

impl Session {
  /// Create an unauthenticated session plus the receiving end of its event
  /// channel.
  pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<SessionEvent>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let session = Session {
      token: RwLock::new(None),
      user: RwLock::new(None),
      events: sender,
    };
    (Arc::new(session), receiver)
  }

  /// Seed the token from COURIERDESK_TOKEN if set.
  ///
  /// A later login overwrites whatever this stored. No event is emitted;
  /// the application decides what an environment token means for it.
  pub async fn load_env_token(&self) {
    if let Some(token) = Config::env_token() {
      *self.token.write().await = Some(token);
    }
  }

  pub async fn token(&self) -> Option<String> {
    self.token.read().await.clone()
  }

  pub async fn user(&self) -> Option<User> {
    self.user.read().await.clone()
  }

  pub async fn is_authenticated(&self) -> bool {
    self.token.read().await.is_some()
  }

  /// Store the credentials of a fresh login and announce it.
  pub async fn establish(&self, token: String, user: Option<User>) {
    *self.token.write().await = Some(token);
    *self.user.write().await = user;
    let _ = self.events.send(SessionEvent::LoggedIn);
  }

  /// Clear the session on the user's own initiative.
  pub async fn logout(&self) {
    self.clear().await;
    let _ = self.events.send(SessionEvent::LoggedOut);
  }

  /// Clear the session because the backend rejected the token.
  pub async fn expire(&self) {
    self.clear().await;
    let _ = self.events.send(SessionEvent::Expired);
  }

  async fn clear(&self) {
    *self.token.write().await = None;
    *self.user.write().await = None;
  }
}
