// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::HashMap;

use async_trait::async_trait;
use chamado_common_core::{Level, Priority, SectorId, StatusTransitionRecord, Ticket, TicketId, UserId};
use chamado_common_http::ApiError;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;

/// A status change ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionCommit {
	/// The ticket as it will look after the transition.
	pub ticket: Ticket,
	pub record: StatusTransitionRecord,
	/// History length the change was computed against. A store holding a
	/// different length must reject the commit with [`ApiError::Conflict`].
	pub expected_sequence: u64,
}

/// Metadata edit. `None` leaves a field untouched; `Some(None)` clears an
/// optional field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketPatch {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub priority: Option<Priority>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub level: Option<Level>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub assignee_id: Option<Option<UserId>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub sector_id: Option<Option<SectorId>>,
}

impl TicketPatch {
	pub fn is_empty(&self) -> bool {
		!self.touches_details() && !self.touches_assignment()
	}

	/// Priority or level.
	pub fn touches_details(&self) -> bool {
		self.priority.is_some() || self.level.is_some()
	}

	/// Assignee or sector.
	pub fn touches_assignment(&self) -> bool {
		self.assignee_id.is_some() || self.sector_id.is_some()
	}

	pub fn apply_to(&self, ticket: &mut Ticket) {
		if let Some(priority) = self.priority {
			ticket.priority = priority;
		}
		if let Some(level) = self.level {
			ticket.level = level;
		}
		if let Some(assignee) = self.assignee_id {
			ticket.assignee_id = assignee;
		}
		if let Some(sector) = self.sector_id {
			ticket.sector_id = sector;
		}
	}
}

#[async_trait]
pub trait TicketStore: Send + Sync {
	async fn fetch_ticket(&self, id: TicketId) -> Result<Option<Ticket>, ApiError>;
	async fn fetch_history(&self, id: TicketId) -> Result<Vec<StatusTransitionRecord>, ApiError>;
	async fn commit_transition(&self, commit: &TransitionCommit) -> Result<(), ApiError>;
	async fn commit_metadata(&self, ticket: &Ticket, patch: &TicketPatch) -> Result<(), ApiError>;
}

#[derive(Debug, Clone)]
struct StoredTicket {
	ticket: Ticket,
	history: Vec<StatusTransitionRecord>,
}

/// Process-local store. Enforces the commit sequence check.
#[derive(Debug, Default)]
pub struct InMemoryTicketStore {
	tickets: Mutex<HashMap<TicketId, StoredTicket>>,
}

impl InMemoryTicketStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub async fn insert(&self, ticket: Ticket, history: Vec<StatusTransitionRecord>) {
		self
			.tickets
			.lock()
			.await
			.insert(ticket.id, StoredTicket { ticket, history });
	}

	pub async fn history_len(&self, id: TicketId) -> usize {
		self
			.tickets
			.lock()
			.await
			.get(&id)
			.map(|t| t.history.len())
			.unwrap_or(0)
	}
}

#[async_trait]
impl TicketStore for InMemoryTicketStore {
	async fn fetch_ticket(&self, id: TicketId) -> Result<Option<Ticket>, ApiError> {
		Ok(self.tickets.lock().await.get(&id).map(|t| t.ticket.clone()))
	}

	async fn fetch_history(&self, id: TicketId) -> Result<Vec<StatusTransitionRecord>, ApiError> {
		Ok(self
			.tickets
			.lock()
			.await
			.get(&id)
			.map(|t| t.history.clone())
			.unwrap_or_default())
	}

	async fn commit_transition(&self, commit: &TransitionCommit) -> Result<(), ApiError> {
		let mut tickets = self.tickets.lock().await;
		let stored = tickets
			.get_mut(&commit.ticket.id)
			.ok_or_else(|| ApiError::NotFound(commit.ticket.id.to_string()))?;

		if stored.history.len() as u64 != commit.expected_sequence {
			return Err(ApiError::Conflict(format!(
				"expected sequence {}, store is at {}",
				commit.expected_sequence,
				stored.history.len()
			)));
		}

		stored.history.push(commit.record.clone());
		stored.ticket = commit.ticket.clone();
		debug!(
			ticket_id = %commit.ticket.id,
			sequence = stored.history.len(),
			"stored status transition"
		);
		Ok(())
	}

	async fn commit_metadata(&self, ticket: &Ticket, _patch: &TicketPatch) -> Result<(), ApiError> {
		let mut tickets = self.tickets.lock().await;
		let stored = tickets
			.get_mut(&ticket.id)
			.ok_or_else(|| ApiError::NotFound(ticket.id.to_string()))?;
		stored.ticket = ticket.clone();
		Ok(())
	}
}
