// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use chamado_auth::{MatrixDocument, PermissionMatrix, SessionToken};
use chamado_common_core::{Actor, Attachment, Message, StatusTransitionRecord, Ticket, TicketId};
use chamado_common_http::{error_for_status, retry, ApiError, RetryConfig};
use chamado_config::ApiConfig;
use chamado_thread_sync::{MessageApi, MessagePage};
use chamado_tickets::{AttachmentApi, NewAttachment, TicketPatch, TicketStore, TransitionCommit};
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

pub struct PortalClient {
	base_url: Url,
	http: reqwest::Client,
	retry_config: RetryConfig,
	auth_token: Option<SessionToken>,
	page_size: u32,
}

#[derive(Serialize)]
struct CreateMessageRequest<'a> {
	content: &'a str,
}

impl PortalClient {
	pub fn new(base_url: Url, http: reqwest::Client) -> Self {
		Self {
			base_url,
			http,
			retry_config: RetryConfig::default(),
			auth_token: None,
			page_size: 50,
		}
	}

	pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
		let http = chamado_common_http::new_client_with_timeout(config.timeout)?;
		Ok(Self::new(config.base_url.clone(), http)
			.with_retry_config(RetryConfig {
				max_attempts: config.retry_max_attempts,
				..RetryConfig::default()
			})
			.with_page_size(config.page_size))
	}

	pub fn with_auth_token(mut self, token: SessionToken) -> Self {
		self.auth_token = Some(token);
		self
	}

	pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
		self.retry_config = config;
		self
	}

	pub fn with_page_size(mut self, page_size: u32) -> Self {
		self.page_size = page_size.max(1);
		self
	}

	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	fn apply_auth(&self, req: RequestBuilder) -> RequestBuilder {
		if let Some(token) = &self.auth_token {
			req.bearer_auth(token.expose())
		} else {
			req
		}
	}

	fn url(&self, path: &str) -> Result<Url, ApiError> {
		self
			.base_url
			.join(path)
			.map_err(|e| ApiError::InvalidUrl(e.to_string()))
	}

	/// Sends an idempotent request, retrying transient failures.
	async fn send_retrying<F>(&self, build: F) -> Result<Response, ApiError>
	where
		F: Fn() -> RequestBuilder,
	{
		retry(&self.retry_config, || async {
			match self.apply_auth(build()).send().await {
				Ok(response) => error_for_status(response).await,
				Err(e) => Err(ApiError::from(e)),
			}
		})
		.await
	}

	async fn json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
		let bytes = response.bytes().await?;
		serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
	}

	pub async fn whoami(&self) -> Result<Actor, ApiError> {
		let url = self.url("auth/me")?;
		debug!(url = %url, "fetching current actor");
		let response = self.send_retrying(|| self.http.get(url.clone())).await?;
		Self::json(response).await
	}

	pub async fn fetch_matrix(&self) -> Result<PermissionMatrix, ApiError> {
		let url = self.url("permissions/matrix")?;
		let response = self.send_retrying(|| self.http.get(url.clone())).await?;
		let document: MatrixDocument = Self::json(response).await?;
		let matrix = PermissionMatrix::from_document(document);
		debug!(rules = matrix.len(), "fetched permission matrix");
		Ok(matrix)
	}

	pub async fn update_matrix(&self, matrix: &PermissionMatrix) -> Result<(), ApiError> {
		let url = self.url("permissions/matrix")?;
		let document = matrix.to_document();
		self
			.send_retrying(|| self.http.put(url.clone()).json(&document))
			.await?;
		info!(rules = matrix.len(), "permission matrix updated");
		Ok(())
	}
}

#[async_trait]
impl TicketStore for PortalClient {
	async fn fetch_ticket(&self, id: TicketId) -> Result<Option<Ticket>, ApiError> {
		let url = self.url(&format!("tickets/{id}"))?;
		debug!(ticket_id = %id, url = %url, "fetching ticket");
		match self.send_retrying(|| self.http.get(url.clone())).await {
			Ok(response) => Self::json(response).await.map(Some),
			Err(ApiError::NotFound(_)) => {
				debug!(ticket_id = %id, "ticket not found on server");
				Ok(None)
			}
			Err(e) => Err(e),
		}
	}

	async fn fetch_history(&self, id: TicketId) -> Result<Vec<StatusTransitionRecord>, ApiError> {
		let url = self.url(&format!("tickets/{id}/history"))?;
		let response = self.send_retrying(|| self.http.get(url.clone())).await?;
		Self::json(response).await
	}

	async fn commit_transition(&self, commit: &TransitionCommit) -> Result<(), ApiError> {
		let id = commit.ticket.id;
		let url = self.url(&format!("tickets/{id}/transitions"))?;
		// A replayed commit fails the sequence check; the caller re-reads the ticket.
		let result = self
			.send_retrying(|| self.http.post(url.clone()).json(commit))
			.await;
		match result {
			Ok(_) => {
				debug!(ticket_id = %id, to = %commit.record.to_status, "transition committed");
				Ok(())
			}
			Err(e) => {
				warn!(ticket_id = %id, error = %e, "transition commit failed");
				Err(e)
			}
		}
	}

	async fn commit_metadata(&self, ticket: &Ticket, patch: &TicketPatch) -> Result<(), ApiError> {
		let url = self.url(&format!("tickets/{}", ticket.id))?;
		self
			.send_retrying(|| self.http.patch(url.clone()).json(patch))
			.await?;
		Ok(())
	}
}

#[async_trait]
impl MessageApi for PortalClient {
	async fn list_messages(&self, ticket_id: TicketId, cursor: Option<&str>) -> Result<MessagePage, ApiError> {
		let mut url = self.url(&format!("tickets/{ticket_id}/messages"))?;
		{
			let mut query = url.query_pairs_mut();
			if let Some(cursor) = cursor {
				query.append_pair("cursor", cursor);
			}
			query.append_pair("limit", &self.page_size.to_string());
		}
		let response = self.send_retrying(|| self.http.get(url.clone())).await?;
		let page: MessagePage = Self::json(response).await?;
		debug!(%ticket_id, count = page.messages.len(), more = page.next_cursor.is_some(), "listed messages");
		Ok(page)
	}

	async fn create_message(&self, ticket_id: TicketId, content: &str) -> Result<Message, ApiError> {
		let url = self.url(&format!("tickets/{ticket_id}/messages"))?;
		// Not retried: a lost response would post the message twice.
		let request = self.http.post(url).json(&CreateMessageRequest { content });
		let response = error_for_status(self.apply_auth(request).send().await?).await?;
		Self::json(response).await
	}
}

#[async_trait]
impl AttachmentApi for PortalClient {
	async fn list_attachments(&self, ticket_id: TicketId) -> Result<Vec<Attachment>, ApiError> {
		let url = self.url(&format!("tickets/{ticket_id}/attachments"))?;
		let response = self.send_retrying(|| self.http.get(url.clone())).await?;
		Self::json(response).await
	}

	async fn upload_attachment(&self, ticket_id: TicketId, file: &NewAttachment) -> Result<Attachment, ApiError> {
		let url = self.url(&format!("tickets/{ticket_id}/attachments"))?;
		let part = Part::bytes(file.content.to_vec())
			.file_name(file.filename.clone())
			.mime_str(&file.mime_type)
			.map_err(|e| ApiError::Rejected {
				status: StatusCode::UNSUPPORTED_MEDIA_TYPE,
				message: e.to_string(),
			})?;
		let form = Form::new().part("file", part);

		let response = error_for_status(self.apply_auth(self.http.post(url).multipart(form)).send().await?).await?;
		Self::json(response).await
	}
}
