// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Push channel transport.

use async_trait::async_trait;
use chamado_auth::SessionToken;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{
	connect_async,
	tungstenite::{client::IntoClientRequest, Message},
	MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::ThreadSyncError;
use crate::protocol::{ClientFrame, ServerEvent};

#[async_trait]
pub trait PushTransport: Send + Sync + 'static {
	async fn connect(&self) -> Result<Box<dyn PushSession>, ThreadSyncError>;
}

#[async_trait]
pub trait PushSession: Send {
	async fn send(&mut self, frame: &ClientFrame) -> Result<(), ThreadSyncError>;

	/// Next event from the server. `Ok(None)` means the server closed the
	/// connection.
	async fn next_event(&mut self) -> Result<Option<ServerEvent>, ThreadSyncError>;
}

/// WebSocket push channel authenticated with the session's bearer token.
#[derive(Debug, Clone)]
pub struct WebSocketTransport {
	url: Url,
	token: Option<SessionToken>,
}

impl WebSocketTransport {
	pub fn new(url: Url) -> Result<Self, ThreadSyncError> {
		match url.scheme() {
			"ws" | "wss" => Ok(Self { url, token: None }),
			other => Err(ThreadSyncError::Transport(format!(
				"push url must use ws or wss, got {other}"
			))),
		}
	}

	pub fn with_token(mut self, token: SessionToken) -> Self {
		self.token = Some(token);
		self
	}

	pub fn url(&self) -> &Url {
		&self.url
	}
}

#[async_trait]
impl PushTransport for WebSocketTransport {
	async fn connect(&self) -> Result<Box<dyn PushSession>, ThreadSyncError> {
		let mut request = self.url.as_str().into_client_request()?;
		if let Some(token) = &self.token {
			let value = format!("Bearer {}", token.expose())
				.parse()
				.map_err(|_| ThreadSyncError::Transport("invalid token format for Authorization header".into()))?;
			request.headers_mut().insert("Authorization", value);
		}

		let (stream, response) = connect_async(request).await?;
		info!(url = %self.url, status = %response.status(), "push channel connected");
		Ok(Box::new(WebSocketSession { stream }))
	}
}

struct WebSocketSession {
	stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl PushSession for WebSocketSession {
	async fn send(&mut self, frame: &ClientFrame) -> Result<(), ThreadSyncError> {
		let text = serde_json::to_string(frame)?;
		self.stream.send(Message::Text(text)).await?;
		Ok(())
	}

	async fn next_event(&mut self) -> Result<Option<ServerEvent>, ThreadSyncError> {
		while let Some(frame) = self.stream.next().await {
			match frame? {
				Message::Text(text) => match ServerEvent::parse(&text) {
					Ok(event) => return Ok(Some(event)),
					Err(e) => warn!(error = %e, "dropping malformed push frame"),
				},
				Message::Ping(data) => self.stream.send(Message::Pong(data)).await?,
				Message::Close(frame) => {
					debug!(?frame, "push channel closed by server");
					return Ok(None);
				}
				_ => {}
			}
		}
		Ok(None)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rejects_http_urls() {
		let url = Url::parse("https://portal.example.com/push").unwrap();
		assert!(matches!(WebSocketTransport::new(url), Err(ThreadSyncError::Transport(_))));
	}

	#[test]
	fn token_is_not_logged() {
		let transport = WebSocketTransport::new(Url::parse("wss://portal.example.com/push").unwrap())
			.unwrap()
			.with_token(SessionToken::new("s3cr3t"));
		assert!(!format!("{transport:?}").contains("s3cr3t"));
	}
}
