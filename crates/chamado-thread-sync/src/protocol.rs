// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Push channel frames. Text frames carry JSON objects tagged by `type`.

use chamado_common_core::{Message, TicketId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientFrame {
	/// Sent after every connect to (re)subscribe to a ticket.
	Hello {
		#[serde(rename = "ticketId")]
		ticket_id: TicketId,
	},
}

impl ClientFrame {
	pub fn hello(ticket_id: TicketId) -> Self {
		ClientFrame::Hello { ticket_id }
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerEvent {
	NewMessage {
		#[serde(rename = "ticketId")]
		ticket_id: TicketId,
		message: Message,
	},
	/// Any event type this client does not handle.
	#[serde(other)]
	Unknown,
}

impl ServerEvent {
	pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(text)
	}

	pub fn ticket_id(&self) -> Option<TicketId> {
		match self {
			ServerEvent::NewMessage { ticket_id, .. } => Some(*ticket_id),
			ServerEvent::Unknown => None,
		}
	}
}
