// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authorization for the Chamado portal.
//!
//! Two pieces live here:
//!
//! - [`policy`]: the static permission matrix mapping `(role, action)` to an
//!   allow bit and an optional [`Scope`], and the evaluator that resolves the
//!   scope against per-resource [`ScopeFacts`]
//! - [`session`]: the explicit session context carried into every operation
//!   that needs an actor, with a login / logout / expiry lifecycle

pub mod error;
pub mod policy;
pub mod session;

pub use error::AuthError;
pub use policy::{
	evaluate, Decision, MatrixDocument, PermissionCell, PermissionMatrix, PermissionRule,
	ResourceAction, Scope, ScopeFacts,
};
pub use session::{Session, SessionManager, SessionState, SessionToken};
