// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The static permission matrix and its flat document form.
//!
//! The document is an object keyed by resource action, each value keyed by
//! role, each leaf `{ "allowed": bool, "scope"?: string }`:
//!
//! ```json
//! {
//!   "change_status": {
//!     "requester": { "allowed": true, "scope": "resolved_to_closed_only" },
//!     "technician": { "allowed": true, "scope": "assigned_or_sector" }
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use chamado_common_core::Role;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{ResourceAction, Scope};
use crate::error::AuthError;

/// One leaf of the matrix document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PermissionCell {
	pub allowed: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub scope: Option<Scope>,
}

impl PermissionCell {
	pub fn allow(scope: Scope) -> Self {
		Self {
			allowed: true,
			scope: Some(scope),
		}
	}

	pub fn deny() -> Self {
		Self {
			allowed: false,
			scope: None,
		}
	}
}

/// A matrix entry together with its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionRule {
	pub action: ResourceAction,
	pub role: Role,
	pub allowed: bool,
	pub scope: Option<Scope>,
}

/// Wire shape of the matrix: `action -> role -> cell`.
pub type MatrixDocument = BTreeMap<ResourceAction, BTreeMap<Role, PermissionCell>>;

/// Rules keyed uniquely by `(action, role)`. Read-only once loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionMatrix {
	rules: BTreeMap<(ResourceAction, Role), PermissionCell>,
}

impl PermissionMatrix {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builder: set the cell for `(action, role)`, replacing any previous one.
	pub fn with(mut self, action: ResourceAction, role: Role, cell: PermissionCell) -> Self {
		self.set(action, role, cell);
		self
	}

	pub fn set(&mut self, action: ResourceAction, role: Role, cell: PermissionCell) {
		self.rules.insert((action, role), cell);
	}

	pub fn cell(&self, action: ResourceAction, role: Role) -> Option<PermissionCell> {
		self.rules.get(&(action, role)).copied()
	}

	pub fn rule(&self, action: ResourceAction, role: Role) -> Option<PermissionRule> {
		self.cell(action, role).map(|cell| PermissionRule {
			action,
			role,
			allowed: cell.allowed,
			scope: cell.scope,
		})
	}

	pub fn rules(&self) -> impl Iterator<Item = PermissionRule> + '_ {
		self.rules.iter().map(|(&(action, role), cell)| PermissionRule {
			action,
			role,
			allowed: cell.allowed,
			scope: cell.scope,
		})
	}

	pub fn len(&self) -> usize {
		self.rules.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rules.is_empty()
	}

	pub fn to_document(&self) -> MatrixDocument {
		let mut doc = MatrixDocument::new();
		for (&(action, role), &cell) in &self.rules {
			doc.entry(action).or_default().insert(role, cell);
		}
		doc
	}

	pub fn from_document(doc: MatrixDocument) -> Self {
		let mut matrix = Self::new();
		for (action, roles) in doc {
			for (role, cell) in roles {
				matrix.set(action, role, cell);
			}
		}
		matrix
	}

	pub fn export_json(&self) -> Result<String, AuthError> {
		Ok(serde_json::to_string_pretty(&self.to_document())?)
	}

	/// Parses a matrix document. Unknown actions, roles or scopes are rejected.
	pub fn import_json(json: &str) -> Result<Self, AuthError> {
		let doc: MatrixDocument = serde_json::from_str(json)?;
		let matrix = Self::from_document(doc);
		debug!(rules = matrix.len(), "imported permission matrix");
		Ok(matrix)
	}

	/// The configuration the portal ships with.
	pub fn portal_defaults() -> Self {
		use PermissionCell as C;
		use ResourceAction as A;
		use Role as R;

		let mut matrix = Self::new()
			.with(A::ViewTicket, R::Requester, C::allow(Scope::Own))
			.with(A::ChangeStatus, R::Requester, C::allow(Scope::ResolvedToClosedOnly))
			.with(A::ViewMessages, R::Requester, C::allow(Scope::Own))
			.with(A::SendMessage, R::Requester, C::allow(Scope::Own))
			.with(A::EditTicket, R::Requester, C::deny())
			.with(A::AssignTicket, R::Requester, C::deny())
			.with(A::ManagePermissions, R::Requester, C::deny())
			.with(A::ViewTicket, R::Backoffice, C::allow(Scope::Organization))
			.with(A::EditTicket, R::Backoffice, C::allow(Scope::Organization))
			.with(A::AssignTicket, R::Backoffice, C::allow(Scope::Organization))
			.with(A::ChangeStatus, R::Backoffice, C::allow(Scope::Organization))
			.with(A::ViewMessages, R::Backoffice, C::allow(Scope::Organization))
			.with(A::SendMessage, R::Backoffice, C::allow(Scope::Organization))
			.with(A::ManagePermissions, R::Backoffice, C::deny())
			.with(A::ViewTicket, R::Technician, C::allow(Scope::AssignedOrSector))
			.with(A::EditTicket, R::Technician, C::allow(Scope::AssignedOrSector))
			.with(A::AssignTicket, R::Technician, C::allow(Scope::Sector))
			.with(A::ChangeStatus, R::Technician, C::allow(Scope::AssignedOrSector))
			.with(A::ViewMessages, R::Technician, C::allow(Scope::AssignedOrSector))
			.with(A::SendMessage, R::Technician, C::allow(Scope::AssignedOrSector))
			.with(A::ManagePermissions, R::Technician, C::deny());

		for action in ResourceAction::all() {
			matrix.set(*action, R::Administrator, C::allow(Scope::All));
		}
		matrix
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	fn arb_scope() -> impl Strategy<Value = Option<Scope>> {
		prop_oneof![
			Just(None),
			Just(Some(Scope::Own)),
			Just(Some(Scope::All)),
			Just(Some(Scope::Organization)),
			Just(Some(Scope::Sector)),
			Just(Some(Scope::AssignedOrSector)),
			Just(Some(Scope::SelfOrTeam)),
			Just(Some(Scope::ResolvedToClosedOnly)),
		]
	}

	fn arb_matrix() -> impl Strategy<Value = PermissionMatrix> {
		let key = (
			proptest::sample::select(ResourceAction::all().to_vec()),
			proptest::sample::select(Role::all().to_vec()),
		);
		proptest::collection::vec((key, any::<bool>(), arb_scope()), 0..40).prop_map(|entries| {
			let mut matrix = PermissionMatrix::new();
			for ((action, role), allowed, scope) in entries {
				matrix.set(action, role, PermissionCell { allowed, scope });
			}
			matrix
		})
	}

	proptest! {
		#[test]
		fn export_then_import_reproduces_matrix(matrix in arb_matrix()) {
			let json = matrix.export_json().unwrap();
			let imported = PermissionMatrix::import_json(&json).unwrap();
			prop_assert_eq!(imported, matrix);
		}
	}

	#[test]
	fn document_shape() {
		let matrix = PermissionMatrix::new()
			.with(ResourceAction::ChangeStatus, Role::Requester, PermissionCell::allow(Scope::ResolvedToClosedOnly))
			.with(ResourceAction::ManagePermissions, Role::Technician, PermissionCell::deny());
		let value: serde_json::Value = serde_json::from_str(&matrix.export_json().unwrap()).unwrap();
		assert_eq!(
			value["change_status"]["requester"],
			serde_json::json!({ "allowed": true, "scope": "resolved_to_closed_only" })
		);
		assert_eq!(
			value["manage_permissions"]["technician"],
			serde_json::json!({ "allowed": false })
		);
	}

	#[test]
	fn setting_a_key_twice_keeps_one_rule() {
		let matrix = PermissionMatrix::new()
			.with(ResourceAction::ViewTicket, Role::Technician, PermissionCell::allow(Scope::Sector))
			.with(ResourceAction::ViewTicket, Role::Technician, PermissionCell::allow(Scope::All));
		assert_eq!(matrix.len(), 1);
		assert_eq!(
			matrix.cell(ResourceAction::ViewTicket, Role::Technician),
			Some(PermissionCell::allow(Scope::All))
		);
	}

	#[test]
	fn import_rejects_unknown_names() {
		assert!(PermissionMatrix::import_json(r#"{"fly": {"requester": {"allowed": true}}}"#).is_err());
		assert!(PermissionMatrix::import_json(r#"{"view_ticket": {"guest": {"allowed": true}}}"#).is_err());
		assert!(PermissionMatrix::import_json(
			r#"{"view_ticket": {"requester": {"allowed": true, "scope": "planet"}}}"#
		)
		.is_err());
		assert!(PermissionMatrix::import_json(
			r#"{"view_ticket": {"requester": {"allowed": true, "extra": 1}}}"#
		)
		.is_err());
	}

	#[test]
	fn defaults_cover_every_action_for_every_role() {
		let matrix = PermissionMatrix::portal_defaults();
		for action in ResourceAction::all() {
			for role in Role::all() {
				assert!(matrix.cell(*action, *role).is_some(), "{action} / {role}");
			}
		}
		assert_eq!(matrix.len(), ResourceAction::all().len() * Role::all().len());
	}
}
