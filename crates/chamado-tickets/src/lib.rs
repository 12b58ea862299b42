// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Ticket lifecycle for the Chamado portal.
//!
//! - [`TicketStateMachine`]: authorization-gated status transitions and
//!   metadata edits, with an append-only history per ticket
//! - [`transitions`]: the status graph
//! - [`TicketStore`]: persistence port (REST in production, in-memory for tests)
//! - [`AttachmentRegistry`]: file metadata gated by the ticket's message scope

pub mod attachments;
pub mod error;
pub mod events;
pub mod machine;
pub mod store;
pub mod transitions;

pub use attachments::{AttachmentApi, AttachmentRegistry, NewAttachment};
pub use error::{AttachmentError, TicketError};
pub use events::{BroadcastEvents, EventSink, TicketEvent};
pub use machine::TicketStateMachine;
pub use store::{InMemoryTicketStore, TicketPatch, TicketStore, TransitionCommit};
