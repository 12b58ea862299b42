// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The ticket status state machine.
//!
//! Every mutation goes through the same steps: authorize against the session's
//! permission matrix, validate, persist through the [`TicketStore`], and only
//! then update the in-memory ticket and its history. A failed persist leaves
//! the tracked state exactly as it was.
//!
//! Each tracked ticket carries an update guard separate from its data. Updates
//! take the guard with `try_lock`, so a second update racing an in-flight one
//! is rejected ([`TicketError::TransitionInFlight`] for status changes,
//! [`TicketError::UpdateInFlight`] for metadata) instead of validating against
//! a stale status. Readers only touch the data lock and never make an update
//! fail.
//!
//! When a commit fails with a conflict or a transient error the store may
//! already hold the change (a lost response). The machine then re-reads the
//! ticket and its history. If the store already shows this actor's edge the
//! transition is reported as done; otherwise local state is replaced with the
//! store's so the next request validates against the real status.

use std::collections::HashMap;
use std::sync::Arc;

use chamado_auth::{ResourceAction, ScopeFacts, Session};
use chamado_common_core::{StatusTransitionRecord, Ticket, TicketId, TicketStatus, TransitionId, UserId};
use chamado_common_http::ApiError;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

use crate::error::TicketError;
use crate::events::{EventSink, TicketEvent};
use crate::store::{TicketPatch, TicketStore, TransitionCommit};
use crate::transitions;

#[derive(Debug)]
struct TrackedTicket {
	ticket: Ticket,
	history: Vec<StatusTransitionRecord>,
}

#[derive(Debug)]
struct TicketSlot {
	state: RwLock<TrackedTicket>,
	update: Mutex<()>,
}

impl TicketSlot {
	fn new(ticket: Ticket, history: Vec<StatusTransitionRecord>) -> Self {
		Self {
			state: RwLock::new(TrackedTicket { ticket, history }),
			update: Mutex::new(()),
		}
	}
}

pub struct TicketStateMachine<S: TicketStore> {
	store: Arc<S>,
	events: Arc<dyn EventSink>,
	tickets: RwLock<HashMap<TicketId, Arc<TicketSlot>>>,
}

impl<S: TicketStore> TicketStateMachine<S> {
	pub fn new(store: Arc<S>, events: Arc<dyn EventSink>) -> Self {
		Self {
			store,
			events,
			tickets: RwLock::new(HashMap::new()),
		}
	}

	/// Registers a ticket and its history after checking that the history
	/// is consistent with the ticket's current status.
	pub async fn track(&self, ticket: Ticket, history: Vec<StatusTransitionRecord>) -> Result<(), TicketError> {
		validate_history(&ticket, &history)?;
		debug!(ticket_id = %ticket.id, records = history.len(), "tracking ticket");
		self
			.tickets
			.write()
			.await
			.insert(ticket.id, Arc::new(TicketSlot::new(ticket, history)));
		Ok(())
	}

	/// Fetches a ticket and its history from the store and tracks it.
	#[instrument(skip(self, session), fields(user_id = %session.actor().id))]
	pub async fn load(&self, session: &Session, ticket_id: TicketId) -> Result<Ticket, TicketError> {
		let ticket = self
			.store
			.fetch_ticket(ticket_id)
			.await?
			.ok_or(TicketError::NotFound(ticket_id))?;

		session.authorize(ResourceAction::ViewTicket, &ScopeFacts::for_ticket(&ticket))?;

		let history = self.store.fetch_history(ticket_id).await?;
		self.track(ticket.clone(), history).await?;
		Ok(ticket)
	}

	/// Stops tracking a ticket, e.g. when its detail view closes.
	pub async fn forget(&self, ticket_id: TicketId) -> bool {
		self.tickets.write().await.remove(&ticket_id).is_some()
	}

	/// Current state of a tracked ticket.
	pub async fn ticket(&self, ticket_id: TicketId) -> Option<Ticket> {
		let slot = self.tickets.read().await.get(&ticket_id).cloned()?;
		let tracked = slot.state.read().await;
		Some(tracked.ticket.clone())
	}

	/// Status timeline of a tracked ticket, oldest first.
	pub async fn history(&self, ticket_id: TicketId) -> Option<Vec<StatusTransitionRecord>> {
		let slot = self.tickets.read().await.get(&ticket_id).cloned()?;
		let tracked = slot.state.read().await;
		Some(tracked.history.clone())
	}

	async fn slot(&self, ticket_id: TicketId) -> Result<Arc<TicketSlot>, TicketError> {
		self
			.tickets
			.read()
			.await
			.get(&ticket_id)
			.cloned()
			.ok_or(TicketError::NotTracked(ticket_id))
	}

	/// Moves a ticket to `to`.
	///
	/// Requesting the current status is a successful no-op and records nothing.
	#[instrument(
		skip(self, session, note),
		fields(user_id = %session.actor().id, role = %session.actor().role)
	)]
	pub async fn request_transition(
		&self,
		session: &Session,
		ticket_id: TicketId,
		to: TicketStatus,
		note: Option<String>,
	) -> Result<Ticket, TicketError> {
		let slot = self.slot(ticket_id).await?;
		let _update = slot
			.update
			.try_lock()
			.map_err(|_| TicketError::TransitionInFlight(ticket_id))?;
		let (current, last, sequence) = {
			let tracked = slot.state.read().await;
			(
				tracked.ticket.clone(),
				tracked.history.last().cloned(),
				tracked.history.len() as u64,
			)
		};

		let from = current.status;
		let facts = ScopeFacts::for_ticket(&current).with_requested_status(to);
		session.authorize(ResourceAction::ChangeStatus, &facts)?;

		if from == to {
			debug!(status = %to, "ticket already in requested status");
			return Ok(current);
		}

		if !transitions::is_allowed(from, to) {
			return Err(TicketError::InvalidTransition { from, to });
		}

		let at = next_record_time(last.as_ref(), Utc::now());
		let actor_id = session.actor().id;
		let record = StatusTransitionRecord {
			id: TransitionId::generate(),
			ticket_id,
			from_status: Some(from),
			to_status: to,
			actor_id,
			at,
			note: note.clone(),
		};

		let mut updated = current;
		updated.status = to;
		updated.updated_at = at;
		updated.closed_at = (to == TicketStatus::Closed).then_some(at);

		let commit = TransitionCommit {
			ticket: updated.clone(),
			record: record.clone(),
			expected_sequence: sequence,
		};

		if let Err(e) = self.store.commit_transition(&commit).await {
			warn!(%from, %to, error = %e, "failed to persist status transition");
			let err = TicketError::from(e);
			if matches!(err, TicketError::Conflict(_) | TicketError::Transient(_)) {
				if let Some(ticket) = self.reconcile(&slot, ticket_id, from, to, actor_id).await {
					return Ok(ticket);
				}
			}
			return Err(err);
		}

		{
			let mut tracked = slot.state.write().await;
			tracked.history.push(record);
			tracked.ticket = updated.clone();
		}

		info!(%from, %to, "ticket status changed");
		self.events.publish(TicketEvent::StatusChanged {
			ticket_id,
			from,
			to,
			actor_id,
			at,
			note,
		});

		Ok(updated)
	}

	/// Edits priority/level (`edit_ticket`) and assignee/sector
	/// (`assign_ticket`). Both permissions are checked against the ticket as it
	/// is before the edit.
	#[instrument(skip(self, session, patch), fields(user_id = %session.actor().id))]
	pub async fn edit_metadata(
		&self,
		session: &Session,
		ticket_id: TicketId,
		patch: TicketPatch,
	) -> Result<Ticket, TicketError> {
		let slot = self.slot(ticket_id).await?;
		let _update = slot
			.update
			.try_lock()
			.map_err(|_| TicketError::UpdateInFlight(ticket_id))?;
		let current = slot.state.read().await.ticket.clone();

		let facts = ScopeFacts::for_ticket(&current);
		if patch.touches_details() {
			session.authorize(ResourceAction::EditTicket, &facts)?;
		}
		if patch.touches_assignment() {
			session.authorize(ResourceAction::AssignTicket, &facts)?;
		}

		let mut updated = current.clone();
		patch.apply_to(&mut updated);
		if updated == current {
			debug!("metadata patch changes nothing");
			return Ok(updated);
		}

		let now = Utc::now();
		updated.updated_at = now.max(current.updated_at);

		if let Err(e) = self.store.commit_metadata(&updated, &patch).await {
			warn!(error = %e, "failed to persist ticket metadata");
			return Err(e.into());
		}

		slot.state.write().await.ticket = updated.clone();

		info!("ticket metadata changed");
		self.events.publish(TicketEvent::MetadataChanged {
			ticket_id,
			actor_id: session.actor().id,
			patch,
			at: updated.updated_at,
		});

		Ok(updated)
	}
}

impl<S: TicketStore> TicketStateMachine<S> {
	/// Replaces the tracked state with the store's after a failed commit.
	/// Returns the ticket when the store already holds `actor_id`'s
	/// `from -> to` edge.
	async fn reconcile(
		&self,
		slot: &TicketSlot,
		ticket_id: TicketId,
		from: TicketStatus,
		to: TicketStatus,
		actor_id: UserId,
	) -> Option<Ticket> {
		let fetched = async {
			let ticket = self.store.fetch_ticket(ticket_id).await?;
			let history = self.store.fetch_history(ticket_id).await?;
			Ok::<_, ApiError>(ticket.map(|ticket| (ticket, history)))
		};
		let (ticket, history) = match fetched.await {
			Ok(Some(found)) => found,
			Ok(None) => {
				warn!("ticket disappeared from the store");
				return None;
			}
			Err(e) => {
				debug!(error = %e, "could not re-read ticket after failed commit");
				return None;
			}
		};
		if let Err(e) = validate_history(&ticket, &history) {
			warn!(error = %e, "store returned an inconsistent ticket");
			return None;
		}

		let landed = history
			.last()
			.filter(|last| {
				ticket.status == to
					&& last.to_status == to
					&& last.from_status == Some(from)
					&& last.actor_id == actor_id
			})
			.cloned();

		info!(status = %ticket.status, records = history.len(), "refreshed ticket from store");
		{
			let mut tracked = slot.state.write().await;
			tracked.ticket = ticket.clone();
			tracked.history = history;
		}

		let record = landed?;
		info!(%from, %to, "status transition was already committed");
		self.events.publish(TicketEvent::StatusChanged {
			ticket_id,
			from,
			to,
			actor_id,
			at: record.at,
			note: record.note,
		});
		Some(ticket)
	}
}

/// Records are totally ordered by `at`: a new record is always strictly later
/// than its predecessor, even if the clock did not advance.
fn next_record_time(last: Option<&StatusTransitionRecord>, now: DateTime<Utc>) -> DateTime<Utc> {
	match last {
		Some(last) if now <= last.at => last.at + Duration::milliseconds(1),
		_ => now,
	}
}

fn validate_history(ticket: &Ticket, history: &[StatusTransitionRecord]) -> Result<(), TicketError> {
	let inconsistent = |message: String| TicketError::InconsistentHistory {
		ticket_id: ticket.id,
		message,
	};

	let Some(last) = history.last() else {
		return if ticket.status == TicketStatus::Open {
			Ok(())
		} else {
			Err(inconsistent(format!(
				"status is {} but there is no history",
				ticket.status
			)))
		};
	};

	if last.to_status != ticket.status {
		return Err(inconsistent(format!(
			"status is {} but the last record moved it to {}",
			ticket.status, last.to_status
		)));
	}

	for record in history {
		if record.ticket_id != ticket.id {
			return Err(inconsistent(format!("record {} belongs to another ticket", record.id)));
		}
	}

	for pair in history.windows(2) {
		if pair[1].at <= pair[0].at {
			return Err(inconsistent(format!("record {} is not after its predecessor", pair[1].id)));
		}
		if pair[1].from_status != Some(pair[0].to_status) {
			return Err(inconsistent(format!(
				"record {} does not continue from {}",
				pair[1].id, pair[0].to_status
			)));
		}
	}

	Ok(())
}
