// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use chamado_common_core::{Message, TicketId};
use chamado_common_http::ApiError;
use serde::{Deserialize, Serialize};

/// One page of a ticket's message history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePage {
	pub messages: Vec<Message>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub next_cursor: Option<String>,
}

#[async_trait]
pub trait MessageApi: Send + Sync {
	async fn list_messages(&self, ticket_id: TicketId, cursor: Option<&str>) -> Result<MessagePage, ApiError>;
	async fn create_message(&self, ticket_id: TicketId, content: &str) -> Result<Message, ApiError>;
}
