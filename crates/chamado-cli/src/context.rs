// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chamado_api::PortalClient;
use chamado_auth::{AuthError, Session, SessionManager, SessionToken};
use chamado_common_core::{Ticket, TicketId};
use chamado_common_http::ApiError;
use chamado_config::PortalConfig;
use chamado_thread_sync::ThreadSyncError;
use chamado_tickets::{AttachmentError, TicketError, TicketStore};
use tracing::instrument;

pub struct CliContext {
	pub config: PortalConfig,
	pub client: Arc<PortalClient>,
	pub sessions: SessionManager,
}

impl CliContext {
	pub fn new(config: PortalConfig) -> Result<Self> {
		let mut client = PortalClient::from_config(&config.api).context("failed to build API client")?;
		if let Some(token) = config.session.token.clone() {
			client = client.with_auth_token(token);
		}

		Ok(Self {
			config,
			client: Arc::new(client),
			sessions: SessionManager::new(),
		})
	}

	pub fn token(&self) -> Result<SessionToken> {
		self.config.session.token.clone().ok_or_else(|| {
			anyhow!("no session token configured; set CHAMADO_SESSION_TOKEN or session.token")
		})
	}

	/// Resolves the current actor and the portal's permission matrix into an
	/// active session.
	#[instrument(skip(self))]
	pub async fn login(&self) -> Result<Arc<Session>> {
		let token = self.token()?;
		let actor = self
			.client
			.whoami()
			.await
			.context("failed to resolve the signed-in user")?;
		let matrix = self
			.client
			.fetch_matrix()
			.await
			.context("failed to fetch the permission matrix")?;

		Ok(self
			.sessions
			.login(Session::new(actor, Arc::new(matrix)).with_token(token)))
	}

	pub async fn fetch_ticket(&self, ticket_id: TicketId) -> Result<Ticket> {
		self
			.client
			.fetch_ticket(ticket_id)
			.await
			.with_context(|| format!("failed to fetch ticket {ticket_id}"))?
			.ok_or_else(|| anyhow!("ticket {ticket_id} not found"))
	}

	/// Tears down the session if `err` says the portal rejected its
	/// credentials. Returns whether it did.
	pub fn expire_if_rejected(&self, err: &anyhow::Error) -> bool {
		if !is_session_expired(err) {
			return false;
		}
		self.sessions.expire();
		true
	}
}

fn is_session_expired(err: &anyhow::Error) -> bool {
	err.chain().any(|cause| {
		matches!(cause.downcast_ref::<ApiError>(), Some(ApiError::SessionExpired(_)))
			|| matches!(cause.downcast_ref::<AuthError>(), Some(AuthError::SessionExpired))
			|| matches!(cause.downcast_ref::<TicketError>(), Some(TicketError::SessionExpired))
			|| matches!(cause.downcast_ref::<ThreadSyncError>(), Some(ThreadSyncError::SessionExpired))
			|| matches!(cause.downcast_ref::<AttachmentError>(), Some(AttachmentError::SessionExpired))
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use chamado_common_http::StatusCode;

	#[test]
	fn detects_expiry_through_context_layers() {
		let err = Err::<(), _>(ApiError::SessionExpired(StatusCode::UNAUTHORIZED))
			.context("failed to fetch ticket")
			.unwrap_err();
		assert!(is_session_expired(&err));

		let err = Err::<(), _>(TicketError::SessionExpired)
			.context("failed to move ticket")
			.unwrap_err();
		assert!(is_session_expired(&err));

		let err = Err::<(), _>(ThreadSyncError::SessionExpired)
			.context("stopped following ticket")
			.unwrap_err();
		assert!(is_session_expired(&err));
	}

	#[test]
	fn other_errors_are_not_expiry() {
		let err = anyhow::Error::new(ApiError::Conflict("dup".into()));
		assert!(!is_session_expired(&err));
		let err = anyhow::anyhow!("no session token configured");
		assert!(!is_session_expired(&err));
	}
}
