// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! REST client for the Chamado portal API.
//!
//! [`PortalClient`] implements the persistence ports of the core crates
//! ([`TicketStore`](chamado_tickets::TicketStore),
//! [`AttachmentApi`](chamado_tickets::AttachmentApi),
//! [`MessageApi`](chamado_thread_sync::MessageApi)) plus the identity and
//! permission matrix endpoints. Every non-success status is mapped to
//! [`ApiError`](chamado_common_http::ApiError) at this boundary.

mod client;

pub use client::PortalClient;
