// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Domain events handed to the (external) notification dispatcher.

use chamado_common_core::{TicketId, TicketStatus, UserId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;

use crate::store::TicketPatch;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TicketEvent {
	StatusChanged {
		ticket_id: TicketId,
		from: TicketStatus,
		to: TicketStatus,
		actor_id: UserId,
		at: DateTime<Utc>,
		note: Option<String>,
	},
	MetadataChanged {
		ticket_id: TicketId,
		actor_id: UserId,
		patch: TicketPatch,
		at: DateTime<Utc>,
	},
}

impl TicketEvent {
	pub fn ticket_id(&self) -> TicketId {
		match self {
			TicketEvent::StatusChanged { ticket_id, .. } | TicketEvent::MetadataChanged { ticket_id, .. } => {
				*ticket_id
			}
		}
	}
}

pub trait EventSink: Send + Sync {
	fn publish(&self, event: TicketEvent);
}

/// In-process fan-out over a tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct BroadcastEvents {
	tx: broadcast::Sender<TicketEvent>,
}

impl BroadcastEvents {
	pub fn new(capacity: usize) -> Self {
		let (tx, _) = broadcast::channel(capacity.max(1));
		Self { tx }
	}

	pub fn subscribe(&self) -> broadcast::Receiver<TicketEvent> {
		self.tx.subscribe()
	}
}

impl Default for BroadcastEvents {
	fn default() -> Self {
		Self::new(64)
	}
}

impl EventSink for BroadcastEvents {
	fn publish(&self, event: TicketEvent) {
		let ticket_id = event.ticket_id();
		// No subscribers is fine; the dispatcher may not be running.
		let receivers = self.tx.send(event).unwrap_or(0);
		trace!(%ticket_id, receivers, "published ticket event");
	}
}
