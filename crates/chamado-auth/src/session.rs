// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Explicit session context.
//!
//! A [`Session`] bundles the current [`Actor`], its bearer token and the
//! permission matrix loaded at login. It is passed to every operation that
//! needs an identity; nothing reads identity from ambient storage.
//!
//! [`SessionManager`] owns the lifecycle: `login` installs a session,
//! `logout` and `expire` tear it down. Observers (open ticket views, push
//! subscriptions) watch [`SessionState`] to release their resources.

use std::fmt;
use std::sync::Arc;

use chamado_common_core::Actor;
use serde::{Deserialize, Deserializer};
use tokio::sync::watch;
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::error::AuthError;
use crate::policy::{evaluate, Decision, PermissionMatrix, ResourceAction, ScopeFacts};

/// Bearer token for the portal API. Zeroed on drop, redacted in `Debug`.
#[derive(Clone)]
pub struct SessionToken(Zeroizing<String>);

impl SessionToken {
	pub fn new(token: impl Into<String>) -> Self {
		Self(Zeroizing::new(token.into()))
	}

	pub fn expose(&self) -> &str {
		self.0.as_str()
	}
}

impl<'de> Deserialize<'de> for SessionToken {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		String::deserialize(deserializer).map(SessionToken::new)
	}
}

impl fmt::Debug for SessionToken {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("SessionToken([REDACTED])")
	}
}

#[derive(Debug)]
pub struct Session {
	actor: Actor,
	token: Option<SessionToken>,
	matrix: Arc<PermissionMatrix>,
}

impl Session {
	pub fn new(actor: Actor, matrix: Arc<PermissionMatrix>) -> Self {
		Self {
			actor,
			token: None,
			matrix,
		}
	}

	pub fn with_token(mut self, token: SessionToken) -> Self {
		self.token = Some(token);
		self
	}

	pub fn actor(&self) -> &Actor {
		&self.actor
	}

	pub fn token(&self) -> Option<&SessionToken> {
		self.token.as_ref()
	}

	pub fn matrix(&self) -> &Arc<PermissionMatrix> {
		&self.matrix
	}

	pub fn evaluate(&self, action: ResourceAction, facts: &ScopeFacts) -> Decision {
		evaluate(&self.matrix, &self.actor, action, facts)
	}

	/// Like [`Session::evaluate`], but a denial is an [`AuthError::Forbidden`].
	pub fn authorize(&self, action: ResourceAction, facts: &ScopeFacts) -> Result<Decision, AuthError> {
		let decision = self.evaluate(action, facts);
		if decision.allowed {
			Ok(decision)
		} else {
			Err(AuthError::Forbidden {
				role: self.actor.role,
				action,
			})
		}
	}
}

#[derive(Debug, Clone)]
pub enum SessionState {
	SignedOut,
	Active(Arc<Session>),
	/// The transport reported 401/403; the user must authenticate again.
	Expired,
}

impl SessionState {
	pub fn is_active(&self) -> bool {
		matches!(self, SessionState::Active(_))
	}
}

/// Owns the current session and broadcasts lifecycle changes.
#[derive(Debug)]
pub struct SessionManager {
	state: watch::Sender<SessionState>,
}

impl SessionManager {
	pub fn new() -> Self {
		let (state, _) = watch::channel(SessionState::SignedOut);
		Self { state }
	}

	pub fn login(&self, session: Session) -> Arc<Session> {
		let session = Arc::new(session);
		info!(
			user_id = %session.actor.id,
			role = %session.actor.role,
			sectors = session.actor.sector_ids.len(),
			"session started"
		);
		self.state.send_replace(SessionState::Active(Arc::clone(&session)));
		session
	}

	pub fn logout(&self) {
		if let SessionState::Active(session) = self.state.send_replace(SessionState::SignedOut) {
			info!(user_id = %session.actor.id, "session ended");
		}
	}

	/// Tears down the session after the transport rejected its credentials.
	pub fn expire(&self) {
		if let SessionState::Active(session) = self.state.send_replace(SessionState::Expired) {
			warn!(user_id = %session.actor.id, "session expired, re-authentication required");
		}
	}

	pub fn current(&self) -> Result<Arc<Session>, AuthError> {
		match &*self.state.borrow() {
			SessionState::Active(session) => Ok(Arc::clone(session)),
			SessionState::Expired => Err(AuthError::SessionExpired),
			SessionState::SignedOut => Err(AuthError::NotAuthenticated),
		}
	}

	pub fn subscribe(&self) -> watch::Receiver<SessionState> {
		self.state.subscribe()
	}
}

impl Default for SessionManager {
	fn default() -> Self {
		Self::new()
	}
}
