// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Type-safe identifiers.
//!
//! Every id is a transparent wrapper around a [`uuid::Uuid`] and serializes as
//! the plain UUID string, which is what the portal API sends.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id_type {
	($name:ident, $doc:expr) => {
		#[doc = $doc]
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(Uuid);

		impl $name {
			/// Create a new ID from a UUID.
			pub fn new(id: Uuid) -> Self {
				Self(id)
			}

			/// Generate a new random ID.
			pub fn generate() -> Self {
				Self(Uuid::new_v4())
			}

			/// Get the inner UUID value.
			pub fn into_inner(self) -> Uuid {
				self.0
			}

			/// Get a reference to the inner UUID.
			pub fn as_uuid(&self) -> &Uuid {
				&self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}", self.0)
			}
		}

		impl FromStr for $name {
			type Err = uuid::Error;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Ok(Self(Uuid::parse_str(s)?))
			}
		}

		impl From<Uuid> for $name {
			fn from(id: Uuid) -> Self {
				Self(id)
			}
		}

		impl From<$name> for Uuid {
			fn from(id: $name) -> Self {
				id.0
			}
		}
	};
}

define_id_type!(UserId, "Unique identifier for a portal user.");
define_id_type!(SectorId, "Unique identifier for a sector.");
define_id_type!(TicketId, "Unique identifier for a ticket.");
define_id_type!(MessageId, "Server-assigned identifier for a thread message.");
define_id_type!(AttachmentId, "Unique identifier for an attachment.");
define_id_type!(TransitionId, "Unique identifier for a status transition record.");

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	proptest! {
		#[test]
		fn ticket_id_parses_its_display(bytes in any::<[u8; 16]>()) {
			let id = TicketId::new(Uuid::from_bytes(bytes));
			let parsed: TicketId = id.to_string().parse().unwrap();
			prop_assert_eq!(id, parsed);
		}
	}

	#[test]
	fn ids_serialize_transparently() {
		let uuid = Uuid::new_v4();
		let id = UserId::new(uuid);
		let json = serde_json::to_string(&id).unwrap();
		assert_eq!(json, format!("\"{uuid}\""));
	}

	#[test]
	fn invalid_id_fails_to_parse() {
		assert!("not-a-uuid".parse::<SectorId>().is_err());
	}
}
