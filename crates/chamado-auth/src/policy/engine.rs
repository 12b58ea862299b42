// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Policy evaluation engine.
//!
//! [`evaluate`] looks up the rule for the actor's role and the requested
//! action, then resolves the rule's [`Scope`] against the facts of the target
//! ticket. A missing rule or `allowed = false` denies.

use chamado_common_core::{Actor, TicketStatus};
use tracing::{debug, instrument};

use super::matrix::PermissionMatrix;
use super::types::{Decision, ResourceAction, Scope, ScopeFacts};

/// Evaluates whether `actor` may perform `action` on the resource described by
/// `facts`.
///
/// # Tracing
///
/// Instrumented at debug level; the verdict and the scope that produced it are
/// logged for audit purposes.
#[instrument(
	level = "debug",
	skip(matrix, actor, facts),
	fields(
		user_id = %actor.id,
		role = %actor.role,
		action = %action,
	)
)]
pub fn evaluate(
	matrix: &PermissionMatrix,
	actor: &Actor,
	action: ResourceAction,
	facts: &ScopeFacts,
) -> Decision {
	let Some(cell) = matrix.cell(action, actor.role) else {
		debug!("no rule for role and action, denying");
		return Decision::deny();
	};

	if !cell.allowed {
		debug!("rule disallows action");
		return Decision {
			allowed: false,
			scope: cell.scope,
		};
	}

	let allowed = match cell.scope {
		None => true,
		Some(scope) => scope_matches(scope, actor, facts),
	};

	debug!(allowed, scope = ?cell.scope, "policy decision");
	Decision {
		allowed,
		scope: cell.scope,
	}
}

fn scope_matches(scope: Scope, actor: &Actor, facts: &ScopeFacts) -> bool {
	let is_owner = facts.owner_id == Some(actor.id);
	let is_assignee = facts.assignee_id == Some(actor.id);
	let in_sector = facts
		.sector_id
		.map(|sector| actor.in_sector(sector))
		.unwrap_or(false);

	match scope {
		Scope::Own => is_owner,
		Scope::All | Scope::Organization => true,
		Scope::Sector => in_sector,
		Scope::AssignedOrSector => is_assignee || in_sector,
		Scope::SelfOrTeam => is_assignee,
		Scope::ResolvedToClosedOnly => {
			is_owner
				&& facts.current_status == Some(TicketStatus::Resolved)
				&& facts.requested_status == Some(TicketStatus::Closed)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::policy::matrix::PermissionCell;
	use chamado_common_core::{Role, SectorId, Ticket, TicketId, UserId};
	use chrono::Utc;
	use proptest::prelude::*;

	fn ticket_by(creator: UserId) -> Ticket {
		Ticket::open(TicketId::generate(), "test", creator, Utc::now())
	}

	fn matrix_with(action: ResourceAction, role: Role, scope: Scope) -> PermissionMatrix {
		PermissionMatrix::new().with(action, role, PermissionCell::allow(scope))
	}

	mod fail_closed {
		use super::*;

		proptest! {
			#[test]
			fn missing_rules_always_deny(
				action in proptest::sample::select(ResourceAction::all().to_vec()),
				role in proptest::sample::select(Role::all().to_vec()),
			) {
				let matrix = PermissionMatrix::new();
				let actor = Actor::new(UserId::generate(), role);
				let ticket = ticket_by(actor.id);
				let decision = evaluate(&matrix, &actor, action, &ScopeFacts::for_ticket(&ticket));
				prop_assert!(!decision.allowed);
			}
		}

		#[test]
		fn rule_for_other_role_does_not_apply() {
			let matrix = matrix_with(ResourceAction::ViewTicket, Role::Backoffice, Scope::All);
			let actor = Actor::new(UserId::generate(), Role::Technician);
			let decision = evaluate(&matrix, &actor, ResourceAction::ViewTicket, &ScopeFacts::none());
			assert!(!decision.allowed);
		}

		#[test]
		fn disallowed_rule_denies_even_with_permissive_scope() {
			let matrix = PermissionMatrix::new().with(
				ResourceAction::ViewTicket,
				Role::Backoffice,
				PermissionCell {
					allowed: false,
					scope: Some(Scope::All),
				},
			);
			let actor = Actor::new(UserId::generate(), Role::Backoffice);
			let decision = evaluate(&matrix, &actor, ResourceAction::ViewTicket, &ScopeFacts::none());
			assert!(!decision.allowed);
		}

		#[test]
		fn allowed_rule_without_scope_is_unconditional() {
			let matrix = PermissionMatrix::new().with(
				ResourceAction::ViewTicket,
				Role::Backoffice,
				PermissionCell {
					allowed: true,
					scope: None,
				},
			);
			let actor = Actor::new(UserId::generate(), Role::Backoffice);
			assert!(evaluate(&matrix, &actor, ResourceAction::ViewTicket, &ScopeFacts::none()).allowed);
		}
	}

	mod scopes {
		use super::*;

		#[test]
		fn own_requires_creator() {
			let matrix = matrix_with(ResourceAction::ViewTicket, Role::Requester, Scope::Own);
			let actor = Actor::new(UserId::generate(), Role::Requester);

			let mine = ScopeFacts::for_ticket(&ticket_by(actor.id));
			let theirs = ScopeFacts::for_ticket(&ticket_by(UserId::generate()));
			assert!(evaluate(&matrix, &actor, ResourceAction::ViewTicket, &mine).allowed);
			assert!(!evaluate(&matrix, &actor, ResourceAction::ViewTicket, &theirs).allowed);
		}

		#[test]
		fn organization_is_unconditional() {
			let matrix = matrix_with(ResourceAction::ViewTicket, Role::Backoffice, Scope::Organization);
			let actor = Actor::new(UserId::generate(), Role::Backoffice);
			let facts = ScopeFacts::for_ticket(&ticket_by(UserId::generate()));
			let decision = evaluate(&matrix, &actor, ResourceAction::ViewTicket, &facts);
			assert!(decision.allowed);
			assert_eq!(decision.scope, Some(Scope::Organization));
		}

		#[test]
		fn sector_requires_membership() {
			let it = SectorId::generate();
			let matrix = matrix_with(ResourceAction::AssignTicket, Role::Technician, Scope::Sector);
			let actor = Actor::new(UserId::generate(), Role::Technician).with_sector(it);

			let in_it = ScopeFacts::for_ticket(&ticket_by(UserId::generate()).in_sector(it));
			let elsewhere =
				ScopeFacts::for_ticket(&ticket_by(UserId::generate()).in_sector(SectorId::generate()));
			let unsectored = ScopeFacts::for_ticket(&ticket_by(UserId::generate()));
			assert!(evaluate(&matrix, &actor, ResourceAction::AssignTicket, &in_it).allowed);
			assert!(!evaluate(&matrix, &actor, ResourceAction::AssignTicket, &elsewhere).allowed);
			assert!(!evaluate(&matrix, &actor, ResourceAction::AssignTicket, &unsectored).allowed);
		}

		#[test]
		fn assigned_or_sector_is_a_disjunction() {
			let it = SectorId::generate();
			let hr = SectorId::generate();
			let matrix = matrix_with(ResourceAction::ChangeStatus, Role::Technician, Scope::AssignedOrSector);
			let actor = Actor::new(UserId::generate(), Role::Technician).with_sector(it);
			let creator = UserId::generate();

			let both = ticket_by(creator).assigned_to(actor.id).in_sector(it);
			let only_assigned = ticket_by(creator).assigned_to(actor.id).in_sector(hr);
			let only_sector = ticket_by(creator).assigned_to(UserId::generate()).in_sector(it);
			let neither = ticket_by(creator).assigned_to(UserId::generate()).in_sector(hr);

			for ticket in [&both, &only_assigned, &only_sector] {
				let facts = ScopeFacts::for_ticket(ticket);
				assert!(evaluate(&matrix, &actor, ResourceAction::ChangeStatus, &facts).allowed);
			}
			let facts = ScopeFacts::for_ticket(&neither);
			assert!(!evaluate(&matrix, &actor, ResourceAction::ChangeStatus, &facts).allowed);
		}

		#[test]
		fn self_or_team_requires_current_assignment() {
			let it = SectorId::generate();
			let matrix = matrix_with(ResourceAction::ChangeStatus, Role::Technician, Scope::SelfOrTeam);
			let actor = Actor::new(UserId::generate(), Role::Technician).with_sector(it);

			let assigned = ticket_by(UserId::generate()).assigned_to(actor.id);
			let sector_only = ticket_by(UserId::generate()).in_sector(it);
			assert!(evaluate(&matrix, &actor, ResourceAction::ChangeStatus, &ScopeFacts::for_ticket(&assigned)).allowed);
			assert!(!evaluate(&matrix, &actor, ResourceAction::ChangeStatus, &ScopeFacts::for_ticket(&sector_only)).allowed);
		}

		#[test]
		fn resolved_to_closed_only_is_a_narrow_carve_out() {
			let matrix = matrix_with(ResourceAction::ChangeStatus, Role::Requester, Scope::ResolvedToClosedOnly);
			let actor = Actor::new(UserId::generate(), Role::Requester);

			let mut own = ticket_by(actor.id);
			own.status = TicketStatus::Resolved;
			let mut foreign = ticket_by(UserId::generate());
			foreign.status = TicketStatus::Resolved;

			let close_own = ScopeFacts::for_ticket(&own).with_requested_status(TicketStatus::Closed);
			let reopen_own = ScopeFacts::for_ticket(&own).with_requested_status(TicketStatus::Open);
			let close_foreign = ScopeFacts::for_ticket(&foreign).with_requested_status(TicketStatus::Closed);
			assert!(evaluate(&matrix, &actor, ResourceAction::ChangeStatus, &close_own).allowed);
			assert!(!evaluate(&matrix, &actor, ResourceAction::ChangeStatus, &reopen_own).allowed);
			assert!(!evaluate(&matrix, &actor, ResourceAction::ChangeStatus, &close_foreign).allowed);

			for from in TicketStatus::all() {
				for to in TicketStatus::all() {
					if (*from, *to) == (TicketStatus::Resolved, TicketStatus::Closed) {
						continue;
					}
					let mut ticket = ticket_by(actor.id);
					ticket.status = *from;
					let facts = ScopeFacts::for_ticket(&ticket).with_requested_status(*to);
					assert!(
						!evaluate(&matrix, &actor, ResourceAction::ChangeStatus, &facts).allowed,
						"{from} -> {to} must be denied"
					);
				}
			}
		}
	}

	mod portal_defaults {
		use super::*;

		#[test]
		fn technician_in_ticket_sector_may_change_status() {
			let it = SectorId::generate();
			let matrix = PermissionMatrix::portal_defaults();
			let actor = Actor::new(UserId::generate(), Role::Technician).with_sector(it);
			let ticket = ticket_by(UserId::generate())
				.in_sector(it)
				.assigned_to(UserId::generate());
			let facts = ScopeFacts::for_ticket(&ticket).with_requested_status(TicketStatus::InProgress);
			assert!(evaluate(&matrix, &actor, ResourceAction::ChangeStatus, &facts).allowed);
		}

		#[test]
		fn only_administrators_manage_permissions() {
			let matrix = PermissionMatrix::portal_defaults();
			for role in Role::all() {
				let actor = Actor::new(UserId::generate(), *role);
				let allowed =
					evaluate(&matrix, &actor, ResourceAction::ManagePermissions, &ScopeFacts::none()).allowed;
				assert_eq!(allowed, *role == Role::Administrator, "{role}");
			}
		}
	}
}
