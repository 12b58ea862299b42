// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Ticket records and their status history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;
use crate::types::{SectorId, TicketId, TransitionId, UserId};

/// Lifecycle status of a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
	Open,
	InProgress,
	AwaitingRequester,
	Resolved,
	Closed,
}

impl TicketStatus {
	pub fn all() -> &'static [TicketStatus] {
		&[
			TicketStatus::Open,
			TicketStatus::InProgress,
			TicketStatus::AwaitingRequester,
			TicketStatus::Resolved,
			TicketStatus::Closed,
		]
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			TicketStatus::Open => "open",
			TicketStatus::InProgress => "in_progress",
			TicketStatus::AwaitingRequester => "awaiting_requester",
			TicketStatus::Resolved => "resolved",
			TicketStatus::Closed => "closed",
		}
	}
}

impl fmt::Display for TicketStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for TicketStatus {
	type Err = ParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		TicketStatus::all()
			.iter()
			.copied()
			.find(|status| status.as_str() == s)
			.ok_or_else(|| ParseError::InvalidStatus(s.to_string()))
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
	Low,
	#[default]
	Medium,
	High,
	Urgent,
}

impl fmt::Display for Priority {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Priority::Low => write!(f, "low"),
			Priority::Medium => write!(f, "medium"),
			Priority::High => write!(f, "high"),
			Priority::Urgent => write!(f, "urgent"),
		}
	}
}

impl FromStr for Priority {
	type Err = ParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"low" => Ok(Priority::Low),
			"medium" => Ok(Priority::Medium),
			"high" => Ok(Priority::High),
			"urgent" => Ok(Priority::Urgent),
			_ => Err(ParseError::InvalidPriority(s.to_string())),
		}
	}
}

/// Support tier handling the ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Level {
	#[default]
	#[serde(rename = "l1")]
	L1,
	#[serde(rename = "l2")]
	L2,
	#[serde(rename = "l3")]
	L3,
}

impl fmt::Display for Level {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Level::L1 => write!(f, "l1"),
			Level::L2 => write!(f, "l2"),
			Level::L3 => write!(f, "l3"),
		}
	}
}

impl FromStr for Level {
	type Err = ParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"l1" => Ok(Level::L1),
			"l2" => Ok(Level::L2),
			"l3" => Ok(Level::L3),
			_ => Err(ParseError::InvalidLevel(s.to_string())),
		}
	}
}

/// An organizational unit that tickets and technicians belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sector {
	pub id: SectorId,
	pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
	pub id: TicketId,
	#[serde(default)]
	pub title: String,
	pub status: TicketStatus,
	#[serde(default)]
	pub priority: Priority,
	#[serde(default)]
	pub level: Level,
	pub creator_id: UserId,
	pub assignee_id: Option<UserId>,
	pub sector_id: Option<SectorId>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	pub closed_at: Option<DateTime<Utc>>,
}

impl Ticket {
	/// A freshly opened, unassigned ticket.
	pub fn open(id: TicketId, title: impl Into<String>, creator_id: UserId, now: DateTime<Utc>) -> Self {
		Self {
			id,
			title: title.into(),
			status: TicketStatus::Open,
			priority: Priority::default(),
			level: Level::default(),
			creator_id,
			assignee_id: None,
			sector_id: None,
			created_at: now,
			updated_at: now,
			closed_at: None,
		}
	}

	/// Builder: set the sector.
	pub fn in_sector(mut self, sector_id: SectorId) -> Self {
		self.sector_id = Some(sector_id);
		self
	}

	/// Builder: set the assignee.
	pub fn assigned_to(mut self, user_id: UserId) -> Self {
		self.assignee_id = Some(user_id);
		self
	}

	pub fn is_closed(&self) -> bool {
		self.status == TicketStatus::Closed
	}
}

/// One immutable entry of a ticket's status timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusTransitionRecord {
	pub id: TransitionId,
	pub ticket_id: TicketId,
	pub from_status: Option<TicketStatus>,
	pub to_status: TicketStatus,
	pub actor_id: UserId,
	pub at: DateTime<Utc>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub note: Option<String>,
}
