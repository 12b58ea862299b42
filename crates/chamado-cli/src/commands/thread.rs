// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use chamado_common_core::{Message, MessageId, TicketId};
use chamado_config::PushConfig;
use chamado_thread_sync::{
	LinkState, ReconnectPolicy, ThreadSubscription, ThreadSyncError, ThreadSynchronizer, WebSocketTransport,
};
use chrono::Local;
use clap::{Args, Subcommand};
use console::style;
use tracing::{info, instrument};

use crate::context::CliContext;

#[derive(Debug, Subcommand)]
pub enum ThreadCommands {
	/// Print a ticket's conversation
	Show(ShowArgs),
	/// Follow a ticket's conversation live until interrupted
	Watch(WatchArgs),
	/// Post a message to a ticket
	Send(SendArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ShowArgs {
	pub ticket_id: TicketId,

	/// Print the messages as JSON
	#[arg(long)]
	pub json: bool,
}

#[derive(Debug, Clone, Args)]
pub struct WatchArgs {
	pub ticket_id: TicketId,
}

#[derive(Debug, Clone, Args)]
pub struct SendArgs {
	pub ticket_id: TicketId,

	/// Message text
	pub content: String,
}

pub async fn run(command: ThreadCommands, ctx: &CliContext) -> Result<()> {
	match command {
		ThreadCommands::Show(args) => handle_show(args, ctx).await,
		ThreadCommands::Watch(args) => handle_watch(args, ctx).await,
		ThreadCommands::Send(args) => handle_send(args, ctx).await,
	}
}

pub fn reconnect_policy(push: &PushConfig) -> ReconnectPolicy {
	ReconnectPolicy {
		base: push.reconnect_base,
		max: push.reconnect_max,
		jitter: push.jitter,
		degraded_after: push.degraded_after,
	}
}

#[instrument(skip(ctx))]
async fn handle_show(args: ShowArgs, ctx: &CliContext) -> Result<()> {
	let session = ctx.login().await?;
	let ticket = ctx.fetch_ticket(args.ticket_id).await?;
	let sync = ThreadSynchronizer::new(ticket, Arc::clone(&ctx.client));
	sync
		.load_initial(&session)
		.await
		.with_context(|| format!("failed to load messages for ticket {}", args.ticket_id))?;

	let messages = sync.messages().await;
	if args.json {
		println!("{}", serde_json::to_string_pretty(&messages)?);
	} else {
		for message in &messages {
			println!("{}", format_message(message));
		}
	}
	Ok(())
}

#[instrument(skip(ctx))]
async fn handle_watch(args: WatchArgs, ctx: &CliContext) -> Result<()> {
	let session = ctx.login().await?;
	let ticket = ctx.fetch_ticket(args.ticket_id).await?;
	let sync = Arc::new(ThreadSynchronizer::new(ticket, Arc::clone(&ctx.client)));

	sync
		.load_initial(&session)
		.await
		.with_context(|| format!("failed to load messages for ticket {}", args.ticket_id))?;

	let mut printed = HashSet::new();
	print_new(&sync.messages().await, &mut printed);

	let transport = WebSocketTransport::new(ctx.config.push.url.clone())
		.context("invalid push channel URL")?
		.with_token(ctx.token()?);
	let subscription = ThreadSubscription::open(
		Arc::clone(&sync),
		session,
		transport,
		reconnect_policy(&ctx.config.push),
	);
	info!(url = %ctx.config.push.url, "following ticket thread");
	eprintln!("{}", style("Press Ctrl+C to stop watching...").dim());

	let mut revisions = sync.subscribe();
	let mut link = subscription.watch_link();
	let mut outcome = Ok(());

	loop {
		tokio::select! {
			_ = tokio::signal::ctrl_c() => {
				eprintln!();
				break;
			}
			changed = revisions.changed() => {
				if changed.is_err() {
					break;
				}
				print_new(&sync.messages().await, &mut printed);
			}
			changed = link.changed() => {
				// The push task may finish right after publishing its last state.
				let state = link.borrow_and_update().clone();
				if changed.is_ok() {
					eprintln!("{}", describe_link(&state));
				}
				if let Err(e) = link_outcome(&state) {
					outcome = Err(e);
					break;
				}
				if changed.is_err() || state.is_terminal() {
					break;
				}
			}
		}
	}

	subscription.close().await;
	outcome.with_context(|| format!("stopped following ticket {}", args.ticket_id))
}

/// The push channel stopping because the portal rejected the session is an
/// error the caller must see.
fn link_outcome(state: &LinkState) -> Result<(), ThreadSyncError> {
	match state {
		LinkState::Expired => Err(ThreadSyncError::SessionExpired),
		_ => Ok(()),
	}
}

#[instrument(skip(ctx, args), fields(ticket_id = %args.ticket_id))]
async fn handle_send(args: SendArgs, ctx: &CliContext) -> Result<()> {
	let session = ctx.login().await?;
	let ticket = ctx.fetch_ticket(args.ticket_id).await?;
	let sync = ThreadSynchronizer::new(ticket, Arc::clone(&ctx.client));

	let message = sync
		.send(&session, args.content)
		.await
		.with_context(|| format!("failed to send message to ticket {}", args.ticket_id))?;

	println!("{} Sent {}", style("✓").green().bold(), message.id);
	Ok(())
}

fn print_new(messages: &[Message], printed: &mut HashSet<MessageId>) {
	for message in messages {
		if printed.insert(message.id) {
			println!("{}", format_message(message));
		}
	}
}

fn format_message(message: &Message) -> String {
	format!(
		"[{}] {}: {}",
		message.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
		message.author_id,
		message.content
	)
}

fn describe_link(state: &LinkState) -> String {
	match state {
		LinkState::Connecting => style("connecting…").dim().to_string(),
		LinkState::Live => style("● live").green().to_string(),
		LinkState::Reconnecting { attempt, delay } => style(format!(
			"reconnecting (attempt {attempt}, in {:.1}s)",
			delay.as_secs_f64()
		))
		.yellow()
		.to_string(),
		LinkState::Degraded { failures } => style(format!(
			"connection degraded after {failures} failures; thread is read-only while retrying"
		))
		.red()
		.to_string(),
		LinkState::Expired => style("session expired").red().to_string(),
		LinkState::Closed => style("disconnected").dim().to_string(),
	}
}
