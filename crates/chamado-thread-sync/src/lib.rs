// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Message thread synchronization for Chamado tickets.
//!
//! A [`ThreadSynchronizer`] owns the materialized view of one ticket's
//! conversation. It is fed from three directions: the paginated REST history,
//! optimistic echoes of the user's own sends, and `newMessage` events from the
//! push channel. All three converge in [`ThreadView`], which deduplicates by
//! message id and keeps the `(created_at, id)` order.
//!
//! [`ThreadSubscription`] keeps the push channel open while a ticket is on
//! screen, reconnecting with bounded exponential backoff and refreshing the
//! history after every connect so that nothing missed while offline is lost.

pub mod api;
pub mod backoff;
pub mod error;
pub mod protocol;
pub mod subscription;
pub mod synchronizer;
pub mod transport;
pub mod view;

pub use api::{MessageApi, MessagePage};
pub use backoff::ReconnectPolicy;
pub use error::ThreadSyncError;
pub use protocol::{ClientFrame, ServerEvent};
pub use subscription::{LinkState, ThreadSubscription};
pub use synchronizer::{PushOutcome, ThreadSynchronizer};
pub use transport::{PushSession, PushTransport, WebSocketTransport};
pub use view::{LocalEchoId, PendingEcho, ThreadEntry, ThreadView};
