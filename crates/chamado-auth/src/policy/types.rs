// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Type definitions for policy evaluation.
//!
//! - [`ResourceAction`]: the operation being attempted on a ticket
//! - [`Scope`]: the predicate narrowing an allowed action to specific tickets
//! - [`ScopeFacts`]: everything a scope needs to know about the target ticket
//! - [`Decision`]: the verdict, with the scope that produced it

use chamado_common_core::{SectorId, Ticket, TicketStatus, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Actions gated by the permission matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceAction {
	ViewTicket,
	/// Priority and support level.
	EditTicket,
	/// Assignee and sector.
	AssignTicket,
	ChangeStatus,
	ViewMessages,
	SendMessage,
	ManagePermissions,
}

impl ResourceAction {
	pub fn all() -> &'static [ResourceAction] {
		&[
			ResourceAction::ViewTicket,
			ResourceAction::EditTicket,
			ResourceAction::AssignTicket,
			ResourceAction::ChangeStatus,
			ResourceAction::ViewMessages,
			ResourceAction::SendMessage,
			ResourceAction::ManagePermissions,
		]
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			ResourceAction::ViewTicket => "view_ticket",
			ResourceAction::EditTicket => "edit_ticket",
			ResourceAction::AssignTicket => "assign_ticket",
			ResourceAction::ChangeStatus => "change_status",
			ResourceAction::ViewMessages => "view_messages",
			ResourceAction::SendMessage => "send_message",
			ResourceAction::ManagePermissions => "manage_permissions",
		}
	}
}

impl fmt::Display for ResourceAction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl std::str::FromStr for ResourceAction {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		ResourceAction::all()
			.iter()
			.copied()
			.find(|a| a.as_str() == s)
			.ok_or_else(|| format!("unknown resource action: {s}"))
	}
}

/// Narrows an allowed action to specific resource instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
	/// The actor created the ticket.
	Own,
	All,
	/// Organization-wide visibility; equivalent to [`Scope::All`] for a single tenant.
	Organization,
	/// The ticket belongs to one of the actor's sectors.
	Sector,
	/// The ticket is assigned to the actor or belongs to one of their sectors.
	AssignedOrSector,
	/// The ticket is currently assigned to the actor.
	SelfOrTeam,
	/// Only `Resolved -> Closed`, and only on a ticket the actor created.
	ResolvedToClosedOnly,
}

impl Scope {
	pub fn as_str(&self) -> &'static str {
		match self {
			Scope::Own => "own",
			Scope::All => "all",
			Scope::Organization => "organization",
			Scope::Sector => "sector",
			Scope::AssignedOrSector => "assigned_or_sector",
			Scope::SelfOrTeam => "self_or_team",
			Scope::ResolvedToClosedOnly => "resolved_to_closed_only",
		}
	}
}

impl fmt::Display for Scope {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Per-resource facts a scope is checked against.
///
/// Computed by the caller from the target ticket before evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeFacts {
	pub owner_id: Option<UserId>,
	pub assignee_id: Option<UserId>,
	pub sector_id: Option<SectorId>,
	pub current_status: Option<TicketStatus>,
	pub requested_status: Option<TicketStatus>,
}

impl ScopeFacts {
	/// Facts for an action with no target resource (e.g. managing the matrix).
	pub fn none() -> Self {
		Self::default()
	}

	pub fn for_ticket(ticket: &Ticket) -> Self {
		Self {
			owner_id: Some(ticket.creator_id),
			assignee_id: ticket.assignee_id,
			sector_id: ticket.sector_id,
			current_status: Some(ticket.status),
			requested_status: None,
		}
	}

	/// Builder: the status transition being requested.
	pub fn with_requested_status(mut self, status: TicketStatus) -> Self {
		self.requested_status = Some(status);
		self
	}
}

/// Result of evaluating one `(actor, action, facts)` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Decision {
	pub allowed: bool,
	pub scope: Option<Scope>,
}

impl Decision {
	pub fn deny() -> Self {
		Self {
			allowed: false,
			scope: None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chamado_common_core::TicketId;
	use chrono::Utc;

	#[test]
	fn facts_from_ticket() {
		let creator = UserId::generate();
		let assignee = UserId::generate();
		let sector = SectorId::generate();
		let ticket = Ticket::open(TicketId::generate(), "wifi", creator, Utc::now())
			.assigned_to(assignee)
			.in_sector(sector);

		let facts = ScopeFacts::for_ticket(&ticket).with_requested_status(TicketStatus::Closed);
		assert_eq!(facts.owner_id, Some(creator));
		assert_eq!(facts.assignee_id, Some(assignee));
		assert_eq!(facts.sector_id, Some(sector));
		assert_eq!(facts.current_status, Some(TicketStatus::Open));
		assert_eq!(facts.requested_status, Some(TicketStatus::Closed));
	}

	#[test]
	fn action_names_round_trip() {
		for action in ResourceAction::all() {
			assert_eq!(action.as_str().parse::<ResourceAction>().unwrap(), *action);
			assert_eq!(
				serde_json::to_string(action).unwrap(),
				format!("\"{}\"", action.as_str())
			);
		}
	}

	#[test]
	fn scope_wire_names() {
		assert_eq!(
			serde_json::to_string(&Scope::ResolvedToClosedOnly).unwrap(),
			"\"resolved_to_closed_only\""
		);
		let scope: Scope = serde_json::from_str("\"assigned_or_sector\"").unwrap();
		assert_eq!(scope, Scope::AssignedOrSector);
		assert!(serde_json::from_str::<Scope>("\"everyone\"").is_err());
	}
}
