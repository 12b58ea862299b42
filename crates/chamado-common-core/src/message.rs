// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::types::{AttachmentId, MessageId, TicketId, UserId};

/// A message in a ticket's conversation. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
	pub id: MessageId,
	pub ticket_id: TicketId,
	pub author_id: UserId,
	pub content: String,
	pub created_at: DateTime<Utc>,
}

impl Message {
	/// Thread ordering: `(created_at, id)`.
	pub fn order_key(&self) -> (DateTime<Utc>, MessageId) {
		(self.created_at, self.id)
	}

	pub fn cmp_order(&self, other: &Self) -> Ordering {
		self.order_key().cmp(&other.order_key())
	}
}

/// File metadata attached to a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
	pub id: AttachmentId,
	pub ticket_id: TicketId,
	pub filename: String,
	pub mime_type: String,
	pub size_bytes: u64,
	pub uploader_id: UserId,
	pub uploaded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Duration;
	use uuid::Uuid;

	fn message(id: u128, at: DateTime<Utc>) -> Message {
		Message {
			id: MessageId::new(Uuid::from_u128(id)),
			ticket_id: TicketId::new(Uuid::from_u128(1)),
			author_id: UserId::new(Uuid::from_u128(2)),
			content: "hi".to_string(),
			created_at: at,
		}
	}

	#[test]
	fn ordering_uses_time_then_id() {
		let now = Utc::now();
		let a = message(5, now);
		let b = message(3, now + Duration::seconds(1));
		let c = message(4, now);
		assert_eq!(a.cmp_order(&b), Ordering::Less);
		assert_eq!(c.cmp_order(&a), Ordering::Less);
	}
}
