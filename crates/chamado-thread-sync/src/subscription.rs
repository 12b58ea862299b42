// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The live push subscription for an open ticket thread.
//!
//! [`ThreadSubscription::open`] spawns a background task that connects,
//! sends `hello`, refreshes the history and then feeds push events into the
//! synchronizer until the connection drops. Disconnects are retried forever
//! with [`ReconnectPolicy`] delays; after enough consecutive failures the link
//! is reported as [`LinkState::Degraded`] while retries continue. A rejected
//! session is the one failure that is not retried: the link ends in
//! [`LinkState::Expired`] so the owner can tear the session down.
//!
//! The subscription is a guard. Closing or dropping it cancels the task,
//! including any pending reconnect sleep.

use std::sync::Arc;
use std::time::Duration;

use chamado_auth::Session;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::api::MessageApi;
use crate::backoff::ReconnectPolicy;
use crate::error::ThreadSyncError;
use crate::protocol::ClientFrame;
use crate::synchronizer::ThreadSynchronizer;
use crate::transport::PushTransport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkState {
	Connecting,
	Live,
	Reconnecting { attempt: u32, delay: Duration },
	/// Still retrying, but the thread should be shown as read-only.
	Degraded { failures: u32 },
	/// The portal rejected the session. Terminal.
	Expired,
	Closed,
}

impl LinkState {
	pub fn is_live(&self) -> bool {
		matches!(self, LinkState::Live)
	}

	/// No further connection attempts will be made.
	pub fn is_terminal(&self) -> bool {
		matches!(self, LinkState::Expired | LinkState::Closed)
	}
}

#[derive(Debug)]
pub struct ThreadSubscription {
	link: watch::Receiver<LinkState>,
	cancel: CancellationToken,
	task: Option<JoinHandle<()>>,
}

impl ThreadSubscription {
	pub fn open<A, T>(
		sync: Arc<ThreadSynchronizer<A>>,
		session: Arc<Session>,
		transport: T,
		policy: ReconnectPolicy,
	) -> Self
	where
		A: MessageApi + 'static,
		T: PushTransport,
	{
		let (link_tx, link) = watch::channel(LinkState::Connecting);
		let cancel = CancellationToken::new();

		let task = tokio::spawn(run_push_loop(
			sync,
			session,
			transport,
			policy,
			link_tx,
			cancel.clone(),
		));

		Self {
			link,
			cancel,
			task: Some(task),
		}
	}

	pub fn link_state(&self) -> LinkState {
		self.link.borrow().clone()
	}

	pub fn watch_link(&self) -> watch::Receiver<LinkState> {
		self.link.clone()
	}

	/// Cancels the push task and waits for it to finish.
	pub async fn close(mut self) {
		self.cancel.cancel();
		if let Some(task) = self.task.take() {
			let _ = task.await;
		}
	}
}

impl Drop for ThreadSubscription {
	fn drop(&mut self) {
		self.cancel.cancel();
		if let Some(task) = self.task.take() {
			task.abort();
		}
	}
}

async fn run_push_loop<A, T>(
	sync: Arc<ThreadSynchronizer<A>>,
	session: Arc<Session>,
	transport: T,
	policy: ReconnectPolicy,
	link: watch::Sender<LinkState>,
	cancel: CancellationToken,
) where
	A: MessageApi,
	T: PushTransport,
{
	let ticket_id = sync.ticket_id();
	let mut failures: u32 = 0;

	loop {
		let mut went_live = false;
		let result = tokio::select! {
			_ = cancel.cancelled() => break,
			result = connect_and_follow(&sync, &session, &transport, &link, &mut went_live) => result,
		};

		if went_live {
			failures = 0;
		}
		failures = failures.saturating_add(1);

		match result {
			Ok(()) => info!(%ticket_id, "push channel closed by server"),
			Err(ThreadSyncError::SessionExpired) => {
				error!(%ticket_id, "session expired, stopping push channel");
				link.send_replace(LinkState::Expired);
				return;
			}
			Err(e) => warn!(%ticket_id, error = %e, failures, "push channel failed"),
		}

		let delay = policy.delay_for(failures);
		let state = if policy.is_degraded(failures) {
			LinkState::Degraded { failures }
		} else {
			LinkState::Reconnecting {
				attempt: failures,
				delay,
			}
		};
		link.send_replace(state);
		debug!(%ticket_id, delay_ms = delay.as_millis() as u64, "scheduling reconnect");

		tokio::select! {
			_ = cancel.cancelled() => break,
			_ = tokio::time::sleep(delay) => {}
		}
	}

	link.send_replace(LinkState::Closed);
	debug!(%ticket_id, "push loop stopped");
}

async fn connect_and_follow<A, T>(
	sync: &ThreadSynchronizer<A>,
	session: &Session,
	transport: &T,
	link: &watch::Sender<LinkState>,
	went_live: &mut bool,
) -> Result<(), ThreadSyncError>
where
	A: MessageApi,
	T: PushTransport,
{
	let mut push = transport.connect().await?;
	push.send(&ClientFrame::hello(sync.ticket_id())).await?;
	*went_live = true;
	link.send_replace(LinkState::Live);

	// Anything posted while we were away arrives through the refresh.
	match sync.load_initial(session).await {
		Ok(added) if added > 0 => info!(added, "caught up on missed messages"),
		Ok(_) => {}
		Err(ThreadSyncError::SessionExpired) => return Err(ThreadSyncError::SessionExpired),
		Err(e) => warn!(error = %e, "history refresh after connect failed"),
	}

	while let Some(event) = push.next_event().await? {
		sync.on_push(event).await;
	}
	Ok(())
}
