// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The materialized view of one ticket's thread.
//!
//! Confirmed messages are kept sorted by `(created_at, id)` and indexed by id;
//! an id is never present twice. Optimistic echoes of the user's own sends sit
//! after the confirmed messages, in send order, under ids from a local
//! namespace that cannot collide with server ids.

use std::collections::HashSet;
use std::fmt;

use chamado_common_core::{Message, MessageId, TicketId, UserId};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Temporary id of an optimistic echo. Displays as `local-N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalEchoId(u64);

impl fmt::Display for LocalEchoId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "local-{}", self.0)
	}
}

impl Serialize for LocalEchoId {
	fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingEcho {
	pub local_id: LocalEchoId,
	pub author_id: UserId,
	pub content: String,
	pub queued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum ThreadEntry {
	Confirmed(Message),
	Pending(PendingEcho),
}

#[derive(Debug, Clone)]
pub struct ThreadView {
	ticket_id: TicketId,
	seen: HashSet<MessageId>,
	messages: Vec<Message>,
	pending: Vec<PendingEcho>,
	next_local: u64,
}

impl ThreadView {
	pub fn new(ticket_id: TicketId) -> Self {
		Self {
			ticket_id,
			seen: HashSet::new(),
			messages: Vec::new(),
			pending: Vec::new(),
			next_local: 1,
		}
	}

	pub fn ticket_id(&self) -> TicketId {
		self.ticket_id
	}

	pub fn contains(&self, id: MessageId) -> bool {
		self.seen.contains(&id)
	}

	/// Inserts a confirmed message in order. Returns `false` if the id was
	/// already present or the message belongs to another ticket.
	pub fn insert(&mut self, message: Message) -> bool {
		if message.ticket_id != self.ticket_id || !self.seen.insert(message.id) {
			return false;
		}
		let key = message.order_key();
		let at = self.messages.partition_point(|m| m.order_key() < key);
		self.messages.insert(at, message);
		true
	}

	/// Merges a batch fetched from the server by id. Existing entries and
	/// pending echoes are kept. Returns how many messages were new.
	pub fn reconcile(&mut self, batch: impl IntoIterator<Item = Message>) -> usize {
		batch.into_iter().filter(|m| self.insert(m.clone())).count()
	}

	pub fn push_pending(&mut self, author_id: UserId, content: String, queued_at: DateTime<Utc>) -> LocalEchoId {
		let local_id = LocalEchoId(self.next_local);
		self.next_local += 1;
		self.pending.push(PendingEcho {
			local_id,
			author_id,
			content,
			queued_at,
		});
		local_id
	}

	/// Replaces an echo with the server's copy of the message. If the push
	/// channel delivered it first, the echo simply collapses into it.
	pub fn confirm(&mut self, local_id: LocalEchoId, message: Message) -> bool {
		self.pending.retain(|p| p.local_id != local_id);
		self.insert(message)
	}

	pub fn discard(&mut self, local_id: LocalEchoId) -> Option<PendingEcho> {
		let index = self.pending.iter().position(|p| p.local_id == local_id)?;
		Some(self.pending.remove(index))
	}

	pub fn messages(&self) -> &[Message] {
		&self.messages
	}

	pub fn pending(&self) -> &[PendingEcho] {
		&self.pending
	}

	pub fn len(&self) -> usize {
		self.messages.len() + self.pending.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn entries(&self) -> Vec<ThreadEntry> {
		self
			.messages
			.iter()
			.cloned()
			.map(ThreadEntry::Confirmed)
			.chain(self.pending.iter().cloned().map(ThreadEntry::Pending))
			.collect()
	}
}
