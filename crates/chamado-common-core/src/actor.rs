// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The authenticated identity performing an operation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;
use crate::types::{SectorId, UserId};

/// Portal roles. A role is fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
	/// Opens tickets and talks to staff about them (student panel).
	Requester,
	/// Front-office staff triaging tickets across the organization.
	Backoffice,
	/// Works tickets in their sectors.
	Technician,
	/// Full control, including the permission matrix.
	Administrator,
}

impl Role {
	/// Returns all roles.
	pub fn all() -> &'static [Role] {
		&[
			Role::Requester,
			Role::Backoffice,
			Role::Technician,
			Role::Administrator,
		]
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Role::Requester => "requester",
			Role::Backoffice => "backoffice",
			Role::Technician => "technician",
			Role::Administrator => "administrator",
		}
	}

	/// Staff roles work on tickets opened by others.
	pub fn is_staff(&self) -> bool {
		!matches!(self, Role::Requester)
	}
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Role {
	type Err = ParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Role::all()
			.iter()
			.copied()
			.find(|r| r.as_str() == s)
			.ok_or_else(|| ParseError::InvalidRole(s.to_string()))
	}
}

/// The current actor as supplied by the identity context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
	pub id: UserId,
	pub role: Role,
	#[serde(default)]
	pub sector_ids: BTreeSet<SectorId>,
}

impl Actor {
	/// Creates an actor with no sector memberships.
	pub fn new(id: UserId, role: Role) -> Self {
		Self {
			id,
			role,
			sector_ids: BTreeSet::new(),
		}
	}

	/// Builder: add a sector membership.
	pub fn with_sector(mut self, sector_id: SectorId) -> Self {
		self.sector_ids.insert(sector_id);
		self
	}

	/// Returns true if the actor belongs to the given sector.
	pub fn in_sector(&self, sector_id: SectorId) -> bool {
		self.sector_ids.contains(&sector_id)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn role_parses_wire_names() {
		for role in Role::all() {
			assert_eq!(role.to_string().parse::<Role>().unwrap(), *role);
		}
		assert!("student".parse::<Role>().is_err());
	}

	#[test]
	fn actor_sector_membership() {
		let it = SectorId::generate();
		let actor = Actor::new(UserId::generate(), Role::Technician).with_sector(it);
		assert!(actor.in_sector(it));
		assert!(!actor.in_sector(SectorId::generate()));
	}

	#[test]
	fn actor_deserializes_without_sectors() {
		let id = UserId::generate();
		let json = format!(r#"{{"id":"{id}","role":"requester"}}"#);
		let actor: Actor = serde_json::from_str(&json).unwrap();
		assert_eq!(actor.role, Role::Requester);
		assert!(actor.sector_ids.is_empty());
	}
}
