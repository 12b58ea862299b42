// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chamado_auth::{AuthError, ResourceAction};
use chamado_common_core::Role;
use chamado_common_http::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ThreadSyncError {
	#[error("not permitted: {role} may not {action} on this ticket")]
	Forbidden { role: Role, action: ResourceAction },

	#[error("message is empty")]
	EmptyMessage,

	/// The send did not go through. `content` is handed back for resend.
	#[error("failed to send message: {source}")]
	SendFailed {
		content: String,
		#[source]
		source: ApiError,
	},

	#[error("temporary failure: {0}")]
	Transient(#[source] ApiError),

	#[error("session expired")]
	SessionExpired,

	#[error("request rejected: {0}")]
	Rejected(#[source] ApiError),

	#[error("push channel error: {0}")]
	Transport(String),

	#[error("malformed push frame: {0}")]
	Protocol(#[from] serde_json::Error),
}

impl ThreadSyncError {
	pub fn is_retryable(&self) -> bool {
		match self {
			ThreadSyncError::Transient(_) | ThreadSyncError::Transport(_) => true,
			ThreadSyncError::SendFailed { source, .. } => source.is_transient(),
			_ => false,
		}
	}
}

impl From<AuthError> for ThreadSyncError {
	fn from(e: AuthError) -> Self {
		match e {
			AuthError::Forbidden { role, action } => ThreadSyncError::Forbidden { role, action },
			AuthError::NotAuthenticated | AuthError::SessionExpired => ThreadSyncError::SessionExpired,
			AuthError::InvalidMatrix(e) => ThreadSyncError::Rejected(ApiError::Decode(e.to_string())),
		}
	}
}

impl From<ApiError> for ThreadSyncError {
	fn from(e: ApiError) -> Self {
		match e {
			ApiError::SessionExpired(_) => ThreadSyncError::SessionExpired,
			e if e.is_transient() => ThreadSyncError::Transient(e),
			e => ThreadSyncError::Rejected(e),
		}
	}
}

impl From<tokio_tungstenite::tungstenite::Error> for ThreadSyncError {
	fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
		use tokio_tungstenite::tungstenite::Error;

		match e {
			// The upgrade was refused because of the credentials.
			Error::Http(response) if matches!(response.status().as_u16(), 401 | 403) => {
				ThreadSyncError::SessionExpired
			}
			e => ThreadSyncError::Transport(e.to_string()),
		}
	}
}
