// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Role-and-scope policy evaluation.
//!
//! # Design Principles
//!
//! 1. **Fail closed**: a `(role, action)` pair with no rule is denied
//! 2. **Pure evaluation**: facts are gathered before evaluation; nothing is cached
//! 3. **Closed scope set**: [`Scope`] is an enum, so the evaluator's match is exhaustive

pub mod engine;
pub mod matrix;
pub mod types;

pub use engine::evaluate;
pub use matrix::{MatrixDocument, PermissionCell, PermissionMatrix, PermissionRule};
pub use types::{Decision, ResourceAction, Scope, ScopeFacts};
