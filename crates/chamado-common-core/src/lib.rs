// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Domain vocabulary shared by every Chamado crate.
//!
//! - **ID newtypes** ([`UserId`], [`TicketId`], [`MessageId`], ...) so ids of
//!   different entities cannot be mixed up
//! - **Actors and roles** ([`Actor`], [`Role`])
//! - **Tickets** ([`Ticket`], [`TicketStatus`], [`StatusTransitionRecord`])
//! - **Thread content** ([`Message`], [`Attachment`])

pub mod actor;
pub mod error;
pub mod message;
pub mod ticket;
pub mod types;

pub use actor::{Actor, Role};
pub use error::ParseError;
pub use message::{Attachment, Message};
pub use ticket::{Level, Priority, Sector, StatusTransitionRecord, Ticket, TicketStatus};
pub use types::{AttachmentId, MessageId, SectorId, TicketId, TransitionId, UserId};
