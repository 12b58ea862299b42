// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use chamado_auth::{ResourceAction, ScopeFacts, Session};
use chamado_common_core::{Message, Ticket, TicketId};
use chamado_common_http::ApiError;
use chrono::Utc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, instrument, warn};

use crate::api::MessageApi;
use crate::error::ThreadSyncError;
use crate::protocol::ServerEvent;
use crate::view::{ThreadEntry, ThreadView};

/// Stops paging if the server keeps handing out cursors.
const MAX_PAGES: usize = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
	Inserted,
	Duplicate,
	/// Another ticket, or an event type we do not handle.
	Ignored,
}

pub struct ThreadSynchronizer<A: MessageApi> {
	ticket: Ticket,
	api: Arc<A>,
	view: Mutex<ThreadView>,
	revision: watch::Sender<u64>,
}

impl<A: MessageApi> ThreadSynchronizer<A> {
	pub fn new(ticket: Ticket, api: Arc<A>) -> Self {
		let (revision, _) = watch::channel(0);
		Self {
			view: Mutex::new(ThreadView::new(ticket.id)),
			ticket,
			api,
			revision,
		}
	}

	pub fn ticket_id(&self) -> TicketId {
		self.ticket.id
	}

	/// Bumped whenever the view changes.
	pub fn subscribe(&self) -> watch::Receiver<u64> {
		self.revision.subscribe()
	}

	pub async fn snapshot(&self) -> Vec<ThreadEntry> {
		self.view.lock().await.entries()
	}

	pub async fn messages(&self) -> Vec<Message> {
		self.view.lock().await.messages().to_vec()
	}

	fn bump(&self) {
		self.revision.send_modify(|r| *r += 1);
	}

	/// Fetches the full history and merges it into the view by id. On error the
	/// view is left as it was.
	#[instrument(skip(self, session), fields(ticket_id = %self.ticket.id))]
	pub async fn load_initial(&self, session: &Session) -> Result<usize, ThreadSyncError> {
		session.authorize(ResourceAction::ViewMessages, &ScopeFacts::for_ticket(&self.ticket))?;

		let mut fetched = Vec::new();
		let mut cursor: Option<String> = None;
		for _ in 0..MAX_PAGES {
			let page = self
				.api
				.list_messages(self.ticket.id, cursor.as_deref())
				.await
				.map_err(|e| {
					warn!(error = %e, "failed to fetch message history");
					ThreadSyncError::from(e)
				})?;
			fetched.extend(page.messages);
			match page.next_cursor {
				Some(next) if cursor.as_deref() != Some(next.as_str()) => cursor = Some(next),
				_ => break,
			}
		}

		let added = self.view.lock().await.reconcile(fetched);
		if added > 0 {
			self.bump();
		}
		debug!(added, "message history reconciled");
		Ok(added)
	}

	/// Sends a message with an optimistic echo. On failure the echo is removed
	/// and the text is returned inside [`ThreadSyncError::SendFailed`].
	#[instrument(skip(self, session, content), fields(ticket_id = %self.ticket.id))]
	pub async fn send(&self, session: &Session, content: impl Into<String>) -> Result<Message, ThreadSyncError> {
		session.authorize(ResourceAction::SendMessage, &ScopeFacts::for_ticket(&self.ticket))?;

		let content = content.into();
		if content.trim().is_empty() {
			return Err(ThreadSyncError::EmptyMessage);
		}

		let local_id = self
			.view
			.lock()
			.await
			.push_pending(session.actor().id, content.clone(), Utc::now());
		self.bump();

		match self.api.create_message(self.ticket.id, &content).await {
			Ok(message) => {
				self.view.lock().await.confirm(local_id, message.clone());
				self.bump();
				info!(message_id = %message.id, "message sent");
				Ok(message)
			}
			Err(e) => {
				self.view.lock().await.discard(local_id);
				self.bump();
				warn!(%local_id, error = %e, "message send failed");
				match e {
					ApiError::SessionExpired(_) => Err(ThreadSyncError::SessionExpired),
					source => Err(ThreadSyncError::SendFailed { content, source }),
				}
			}
		}
	}

	pub async fn on_push(&self, event: ServerEvent) -> PushOutcome {
		let message = match event {
			ServerEvent::NewMessage { ticket_id, message }
				if ticket_id == self.ticket.id && message.ticket_id == self.ticket.id =>
			{
				message
			}
			ServerEvent::NewMessage { ticket_id, message } => {
				debug!(%ticket_id, message_ticket_id = %message.ticket_id, "ignoring push for another ticket");
				return PushOutcome::Ignored;
			}
			ServerEvent::Unknown => return PushOutcome::Ignored,
		};

		let message_id = message.id;
		if self.view.lock().await.insert(message) {
			self.bump();
			debug!(%message_id, "pushed message inserted");
			PushOutcome::Inserted
		} else {
			debug!(%message_id, "duplicate push dropped");
			PushOutcome::Duplicate
		}
	}
}
