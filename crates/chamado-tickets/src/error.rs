// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chamado_auth::{AuthError, ResourceAction};
use chamado_common_core::{Role, TicketId, TicketStatus};
use chamado_common_http::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TicketError {
	#[error("not permitted: {role} may not {action} this ticket")]
	Forbidden { role: Role, action: ResourceAction },

	#[error("invalid status transition: {from} -> {to}")]
	InvalidTransition { from: TicketStatus, to: TicketStatus },

	#[error("a status change to ticket {0} is already in flight")]
	TransitionInFlight(TicketId),

	#[error("another update to ticket {0} is in flight")]
	UpdateInFlight(TicketId),

	#[error("ticket not found: {0}")]
	NotFound(TicketId),

	#[error("ticket {0} is not loaded")]
	NotTracked(TicketId),

	#[error("inconsistent history for ticket {ticket_id}: {message}")]
	InconsistentHistory { ticket_id: TicketId, message: String },

	#[error("conflict: {0}")]
	Conflict(String),

	/// Safe to retry; local state was not changed.
	#[error("temporary failure: {0}")]
	Transient(#[source] ApiError),

	#[error("session expired")]
	SessionExpired,

	#[error("request rejected: {0}")]
	Rejected(#[source] ApiError),
}

impl TicketError {
	pub fn is_retryable(&self) -> bool {
		matches!(self, TicketError::Transient(_))
	}
}

impl From<AuthError> for TicketError {
	fn from(e: AuthError) -> Self {
		match e {
			AuthError::Forbidden { role, action } => TicketError::Forbidden { role, action },
			AuthError::NotAuthenticated | AuthError::SessionExpired => TicketError::SessionExpired,
			AuthError::InvalidMatrix(e) => TicketError::Rejected(ApiError::Decode(e.to_string())),
		}
	}
}

impl From<ApiError> for TicketError {
	fn from(e: ApiError) -> Self {
		match e {
			ApiError::SessionExpired(_) => TicketError::SessionExpired,
			ApiError::Conflict(message) => TicketError::Conflict(message),
			e if e.is_transient() => TicketError::Transient(e),
			e => TicketError::Rejected(e),
		}
	}
}

#[derive(Debug, Error)]
pub enum AttachmentError {
	#[error("not permitted: {role} may not {action} on this ticket")]
	Forbidden { role: Role, action: ResourceAction },

	#[error("file {0} is empty")]
	Empty(String),

	#[error("file {filename} is {size} bytes, the limit is {limit}")]
	TooLarge { filename: String, size: u64, limit: u64 },

	#[error("temporary failure: {0}")]
	Transient(#[source] ApiError),

	#[error("session expired")]
	SessionExpired,

	#[error("upload rejected: {0}")]
	Rejected(#[source] ApiError),
}

impl From<AuthError> for AttachmentError {
	fn from(e: AuthError) -> Self {
		match e {
			AuthError::Forbidden { role, action } => AttachmentError::Forbidden { role, action },
			AuthError::NotAuthenticated | AuthError::SessionExpired => AttachmentError::SessionExpired,
			AuthError::InvalidMatrix(e) => AttachmentError::Rejected(ApiError::Decode(e.to_string())),
		}
	}
}

impl From<ApiError> for AttachmentError {
	fn from(e: ApiError) -> Self {
		match e {
			ApiError::SessionExpired(_) => AttachmentError::SessionExpired,
			e if e.is_transient() => AttachmentError::Transient(e),
			e => AttachmentError::Rejected(e),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chamado_common_http::ApiError;

	#[test]
	fn api_errors_classify() {
		assert!(matches!(
			TicketError::from(ApiError::Timeout),
			TicketError::Transient(ApiError::Timeout)
		));
		assert!(matches!(
			TicketError::from(ApiError::Conflict("stale".into())),
			TicketError::Conflict(_)
		));
		assert!(matches!(
			TicketError::from(ApiError::Decode("bad".into())),
			TicketError::Rejected(_)
		));
		assert!(TicketError::from(ApiError::Unavailable("down".into())).is_retryable());
		assert!(!TicketError::from(ApiError::NotFound("x".into())).is_retryable());
	}

	#[test]
	fn forbidden_is_not_session_expiry() {
		let err = TicketError::from(AuthError::Forbidden {
			role: Role::Requester,
			action: ResourceAction::ChangeStatus,
		});
		assert!(matches!(err, TicketError::Forbidden { .. }));
		assert!(matches!(
			TicketError::from(AuthError::SessionExpired),
			TicketError::SessionExpired
		));
	}
}
