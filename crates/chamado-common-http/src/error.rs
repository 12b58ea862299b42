// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Transport-level errors shared by every portal API port.

use reqwest::{Response, StatusCode};
use thiserror::Error;

use crate::retry::RetryableError;

#[derive(Debug, Error)]
pub enum ApiError {
	#[error("network error: {0}")]
	Network(#[from] reqwest::Error),

	#[error("request timeout")]
	Timeout,

	#[error("service unavailable: {0}")]
	Unavailable(String),

	/// 401/403 at the transport boundary. The session is no longer valid.
	#[error("session expired: {0}")]
	SessionExpired(StatusCode),

	#[error("not found: {0}")]
	NotFound(String),

	#[error("conflict: {0}")]
	Conflict(String),

	#[error("request rejected: {status} - {message}")]
	Rejected { status: StatusCode, message: String },

	#[error("server error: {status} - {message}")]
	Server { status: StatusCode, message: String },

	#[error("invalid URL: {0}")]
	InvalidUrl(String),

	#[error("invalid response: {0}")]
	Decode(String),
}

impl ApiError {
	/// Builds the error for a non-success response, consuming its body.
	pub async fn from_response(response: Response) -> Self {
		let status = response.status();
		let message = response.text().await.unwrap_or_default();
		Self::from_status(status, message)
	}

	pub fn from_status(status: StatusCode, message: String) -> Self {
		match status {
			StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::SessionExpired(status),
			StatusCode::NOT_FOUND => Self::NotFound(message),
			StatusCode::CONFLICT => Self::Conflict(message),
			StatusCode::REQUEST_TIMEOUT => Self::Timeout,
			status if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS => {
				Self::Server { status, message }
			}
			status => Self::Rejected { status, message },
		}
	}

	/// Connectivity or server-side failure on an otherwise valid request.
	pub fn is_transient(&self) -> bool {
		self.is_retryable()
	}
}

impl RetryableError for ApiError {
	fn is_retryable(&self) -> bool {
		match self {
			Self::Network(e) => e.is_retryable(),
			Self::Timeout | Self::Unavailable(_) => true,
			Self::Server { status, .. } => matches!(
				*status,
				StatusCode::TOO_MANY_REQUESTS
					| StatusCode::INTERNAL_SERVER_ERROR
					| StatusCode::BAD_GATEWAY
					| StatusCode::SERVICE_UNAVAILABLE
					| StatusCode::GATEWAY_TIMEOUT
			),
			Self::SessionExpired(_)
			| Self::NotFound(_)
			| Self::Conflict(_)
			| Self::Rejected { .. }
			| Self::InvalidUrl(_)
			| Self::Decode(_) => false,
		}
	}
}

/// Passes successful responses through and maps everything else to [`ApiError`].
pub async fn error_for_status(response: Response) -> Result<Response, ApiError> {
	if response.status().is_success() {
		Ok(response)
	} else {
		Err(ApiError::from_response(response).await)
	}
}
