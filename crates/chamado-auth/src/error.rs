// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chamado_common_core::Role;
use thiserror::Error;

use crate::policy::ResourceAction;

#[derive(Debug, Error)]
pub enum AuthError {
	/// Policy denial on a valid session. Never retried.
	#[error("not permitted: {role} may not {action} this resource")]
	Forbidden { role: Role, action: ResourceAction },

	#[error("no active session")]
	NotAuthenticated,

	#[error("session expired")]
	SessionExpired,

	#[error("invalid permission matrix: {0}")]
	InvalidMatrix(#[from] serde_json::Error),
}
