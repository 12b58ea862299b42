// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The ticket status graph.
//!
//! ```text
//! Open ──────────────► InProgress, AwaitingRequester, Resolved, Closed
//! InProgress ────────► AwaitingRequester, Resolved, Open, Closed
//! AwaitingRequester ─► InProgress, Resolved, Closed
//! Resolved ──────────► Closed, Open
//! Closed ────────────► Open
//! ```

use chamado_common_core::TicketStatus;

/// Statuses reachable from `from` in one step.
pub fn allowed_targets(from: TicketStatus) -> &'static [TicketStatus] {
	use TicketStatus::*;

	match from {
		Open => &[InProgress, AwaitingRequester, Resolved, Closed],
		InProgress => &[AwaitingRequester, Resolved, Open, Closed],
		AwaitingRequester => &[InProgress, Resolved, Closed],
		Resolved => &[Closed, Open],
		Closed => &[Open],
	}
}

pub fn is_allowed(from: TicketStatus, to: TicketStatus) -> bool {
	allowed_targets(from).contains(&to)
}

#[cfg(test)]
mod tests {
	use super::*;
	use TicketStatus::*;

	#[test]
	fn closed_only_reopens() {
		assert_eq!(allowed_targets(Closed), &[Open]);
	}

	#[test]
	fn no_self_edges() {
		for status in TicketStatus::all() {
			assert!(!is_allowed(*status, *status));
		}
	}

	#[test]
	fn awaiting_requester_cannot_go_back_to_open() {
		assert!(!is_allowed(AwaitingRequester, Open));
		assert!(is_allowed(AwaitingRequester, InProgress));
	}

	#[test]
	fn edge_count() {
		let edges: usize = TicketStatus::all()
			.iter()
			.map(|s| allowed_targets(*s).len())
			.sum();
		assert_eq!(edges, 14);
	}
}
