// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Ticket attachments. Listing follows `view_messages`, uploading follows
//! `send_message`.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chamado_auth::{ResourceAction, ScopeFacts, Session};
use chamado_common_core::{Attachment, Ticket, TicketId};
use chamado_common_http::ApiError;
use tracing::{info, instrument, warn};

use crate::error::AttachmentError;

pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 25 * 1024 * 1024;

/// A file chosen for upload.
#[derive(Debug, Clone)]
pub struct NewAttachment {
	pub filename: String,
	pub mime_type: String,
	pub content: Bytes,
}

impl NewAttachment {
	pub fn new(filename: impl Into<String>, mime_type: impl Into<String>, content: impl Into<Bytes>) -> Self {
		Self {
			filename: filename.into(),
			mime_type: mime_type.into(),
			content: content.into(),
		}
	}

	pub fn size_bytes(&self) -> u64 {
		self.content.len() as u64
	}
}

#[async_trait]
pub trait AttachmentApi: Send + Sync {
	async fn list_attachments(&self, ticket_id: TicketId) -> Result<Vec<Attachment>, ApiError>;
	async fn upload_attachment(&self, ticket_id: TicketId, file: &NewAttachment) -> Result<Attachment, ApiError>;
}

pub struct AttachmentRegistry<A: AttachmentApi> {
	api: Arc<A>,
	max_upload_bytes: u64,
}

impl<A: AttachmentApi> AttachmentRegistry<A> {
	pub fn new(api: Arc<A>) -> Self {
		Self {
			api,
			max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
		}
	}

	pub fn with_max_upload_bytes(mut self, max: u64) -> Self {
		self.max_upload_bytes = max;
		self
	}

	pub fn max_upload_bytes(&self) -> u64 {
		self.max_upload_bytes
	}

	#[instrument(skip(self, session, ticket), fields(ticket_id = %ticket.id))]
	pub async fn list(&self, session: &Session, ticket: &Ticket) -> Result<Vec<Attachment>, AttachmentError> {
		session.authorize(ResourceAction::ViewMessages, &ScopeFacts::for_ticket(ticket))?;
		Ok(self.api.list_attachments(ticket.id).await?)
	}

	#[instrument(
		skip(self, session, ticket, file),
		fields(ticket_id = %ticket.id, filename = %file.filename, size = file.size_bytes())
	)]
	pub async fn upload(
		&self,
		session: &Session,
		ticket: &Ticket,
		file: NewAttachment,
	) -> Result<Attachment, AttachmentError> {
		session.authorize(ResourceAction::SendMessage, &ScopeFacts::for_ticket(ticket))?;

		let size = file.size_bytes();
		if size == 0 {
			return Err(AttachmentError::Empty(file.filename));
		}
		if size > self.max_upload_bytes {
			return Err(AttachmentError::TooLarge {
				filename: file.filename,
				size,
				limit: self.max_upload_bytes,
			});
		}

		match self.api.upload_attachment(ticket.id, &file).await {
			Ok(attachment) => {
				info!(attachment_id = %attachment.id, "attachment uploaded");
				Ok(attachment)
			}
			Err(e) => {
				warn!(error = %e, "attachment upload failed");
				Err(e.into())
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chamado_auth::PermissionMatrix;
	use chamado_common_core::{Actor, AttachmentId, Role, UserId};
	use chrono::Utc;
	use chamado_common_http::StatusCode;
	use std::sync::Mutex;

	#[derive(Default)]
	struct FakeApi {
		stored: Mutex<Vec<Attachment>>,
		uploads: Mutex<u32>,
		reject_with: Mutex<Option<ApiError>>,
	}

	#[async_trait]
	impl AttachmentApi for FakeApi {
		async fn list_attachments(&self, ticket_id: TicketId) -> Result<Vec<Attachment>, ApiError> {
			Ok(self
				.stored
				.lock()
				.unwrap()
				.iter()
				.filter(|a| a.ticket_id == ticket_id)
				.cloned()
				.collect())
		}

		async fn upload_attachment(&self, ticket_id: TicketId, file: &NewAttachment) -> Result<Attachment, ApiError> {
			*self.uploads.lock().unwrap() += 1;
			if let Some(e) = self.reject_with.lock().unwrap().take() {
				return Err(e);
			}
			let attachment = Attachment {
				id: AttachmentId::generate(),
				ticket_id,
				filename: file.filename.clone(),
				mime_type: file.mime_type.clone(),
				size_bytes: file.size_bytes(),
				uploader_id: UserId::generate(),
				uploaded_at: Utc::now(),
			};
			self.stored.lock().unwrap().push(attachment.clone());
			Ok(attachment)
		}
	}

	fn session(actor: Actor) -> Session {
		Session::new(actor, Arc::new(PermissionMatrix::portal_defaults()))
	}

	fn setup() -> (AttachmentRegistry<FakeApi>, Arc<FakeApi>, Session, Ticket) {
		let api = Arc::new(FakeApi::default());
		let registry = AttachmentRegistry::new(Arc::clone(&api)).with_max_upload_bytes(8);
		let owner = session(Actor::new(UserId::generate(), Role::Requester));
		let ticket = Ticket::open(TicketId::generate(), "printer jam", owner.actor().id, Utc::now());
		(registry, api, owner, ticket)
	}

	#[tokio::test]
	async fn owner_uploads_and_lists() {
		let (registry, _, owner, ticket) = setup();
		let uploaded = registry
			.upload(&owner, &ticket, NewAttachment::new("log.txt", "text/plain", "boom"))
			.await
			.unwrap();
		assert_eq!(uploaded.size_bytes, 4);

		let listed = registry.list(&owner, &ticket).await.unwrap();
		assert_eq!(listed, vec![uploaded]);
	}

	#[tokio::test]
	async fn size_limit_is_checked_before_the_network() {
		let (registry, api, owner, ticket) = setup();
		let err = registry
			.upload(&owner, &ticket, NewAttachment::new("dump.bin", "application/octet-stream", vec![0u8; 9]))
			.await
			.unwrap_err();
		assert!(matches!(err, AttachmentError::TooLarge { size: 9, limit: 8, .. }));

		let err = registry
			.upload(&owner, &ticket, NewAttachment::new("empty.txt", "text/plain", Bytes::new()))
			.await
			.unwrap_err();
		assert!(matches!(err, AttachmentError::Empty(_)));
		assert_eq!(*api.uploads.lock().unwrap(), 0);
	}

	#[tokio::test]
	async fn other_requesters_are_forbidden() {
		let (registry, api, _, ticket) = setup();
		let stranger = session(Actor::new(UserId::generate(), Role::Requester));
		assert!(matches!(
			registry.list(&stranger, &ticket).await,
			Err(AttachmentError::Forbidden {
				action: ResourceAction::ViewMessages,
				..
			})
		));
		assert!(matches!(
			registry
				.upload(&stranger, &ticket, NewAttachment::new("a.txt", "text/plain", "x"))
				.await,
			Err(AttachmentError::Forbidden {
				action: ResourceAction::SendMessage,
				..
			})
		));
		assert_eq!(*api.uploads.lock().unwrap(), 0);
	}

	#[tokio::test]
	async fn server_rejection_keeps_no_record() {
		let (registry, api, owner, ticket) = setup();
		*api.reject_with.lock().unwrap() = Some(ApiError::Rejected {
			status: StatusCode::UNSUPPORTED_MEDIA_TYPE,
			message: "type not allowed".into(),
		});
		let err = registry
			.upload(&owner, &ticket, NewAttachment::new("a.exe", "application/x-msdownload", "MZ"))
			.await
			.unwrap_err();
		assert!(matches!(err, AttachmentError::Rejected(_)));
		assert!(registry.list(&owner, &ticket).await.unwrap().is_empty());
	}
}
