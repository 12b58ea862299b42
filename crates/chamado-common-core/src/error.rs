// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

/// Errors raised when parsing domain enums from their wire names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
	#[error("invalid role: {0}")]
	InvalidRole(String),

	#[error("invalid ticket status: {0}")]
	InvalidStatus(String),

	#[error("invalid priority: {0}")]
	InvalidPriority(String),

	#[error("invalid level: {0}")]
	InvalidLevel(String),
}
