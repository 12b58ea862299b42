// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use anyhow::{Context, Result};
use chamado_api::PortalClient;
use chamado_common_core::{Level, Priority, SectorId, StatusTransitionRecord, Ticket, TicketId, TicketStatus, UserId};
use chamado_tickets::{BroadcastEvents, TicketPatch, TicketStateMachine};
use clap::{Args, Subcommand};
use console::style;
use tracing::instrument;

use crate::context::CliContext;

#[derive(Debug, Subcommand)]
pub enum TicketCommands {
	/// Show a ticket and its status history
	Show(ShowArgs),
	/// Move a ticket to another status
	Transition(TransitionArgs),
	/// Change priority, level, assignee or sector
	Edit(EditArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ShowArgs {
	pub ticket_id: TicketId,

	/// Print the ticket and history as JSON
	#[arg(long)]
	pub json: bool,
}

#[derive(Debug, Clone, Args)]
pub struct TransitionArgs {
	pub ticket_id: TicketId,

	/// Target status (open, in_progress, awaiting_requester, resolved, closed)
	pub status: TicketStatus,

	/// Note recorded with the transition
	#[arg(long)]
	pub note: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct EditArgs {
	pub ticket_id: TicketId,

	#[arg(long)]
	pub priority: Option<Priority>,

	#[arg(long)]
	pub level: Option<Level>,

	#[arg(long, conflicts_with = "unassign")]
	pub assignee: Option<UserId>,

	/// Remove the current assignee
	#[arg(long)]
	pub unassign: bool,

	#[arg(long)]
	pub sector: Option<SectorId>,
}

impl EditArgs {
	fn patch(&self) -> TicketPatch {
		TicketPatch {
			priority: self.priority,
			level: self.level,
			assignee_id: if self.unassign {
				Some(None)
			} else {
				self.assignee.map(Some)
			},
			sector_id: self.sector.map(Some),
		}
	}
}

pub async fn run(command: TicketCommands, ctx: &CliContext) -> Result<()> {
	let machine = TicketStateMachine::new(Arc::clone(&ctx.client), Arc::new(BroadcastEvents::default()));
	match command {
		TicketCommands::Show(args) => handle_show(args, ctx, &machine).await,
		TicketCommands::Transition(args) => handle_transition(args, ctx, &machine).await,
		TicketCommands::Edit(args) => handle_edit(args, ctx, &machine).await,
	}
}

#[instrument(skip(ctx, machine))]
async fn handle_show(args: ShowArgs, ctx: &CliContext, machine: &TicketStateMachine<PortalClient>) -> Result<()> {
	let session = ctx.login().await?;
	let ticket = machine
		.load(&session, args.ticket_id)
		.await
		.with_context(|| format!("failed to load ticket {}", args.ticket_id))?;
	let history = machine.history(args.ticket_id).await.unwrap_or_default();

	if args.json {
		let doc = serde_json::json!({ "ticket": ticket, "history": history });
		println!("{}", serde_json::to_string_pretty(&doc)?);
		return Ok(());
	}

	print_ticket(&ticket);
	if !history.is_empty() {
		println!();
		println!("{}", style("History").bold());
		for record in &history {
			println!("  {}", format_record(record));
		}
	}
	Ok(())
}

#[instrument(skip(ctx, machine, args), fields(ticket_id = %args.ticket_id, to = %args.status))]
async fn handle_transition(
	args: TransitionArgs,
	ctx: &CliContext,
	machine: &TicketStateMachine<PortalClient>,
) -> Result<()> {
	let session = ctx.login().await?;
	let before = machine
		.load(&session, args.ticket_id)
		.await
		.with_context(|| format!("failed to load ticket {}", args.ticket_id))?;

	let after = machine
		.request_transition(&session, args.ticket_id, args.status, args.note)
		.await
		.with_context(|| format!("failed to move ticket {} to {}", args.ticket_id, args.status))?;

	if before.status == after.status {
		println!("Ticket {} is already {}", after.id, style(after.status).cyan());
	} else {
		println!(
			"{} Ticket {}: {} → {}",
			style("✓").green().bold(),
			after.id,
			before.status,
			style(after.status).cyan()
		);
	}
	Ok(())
}

#[instrument(skip(ctx, machine, args), fields(ticket_id = %args.ticket_id))]
async fn handle_edit(args: EditArgs, ctx: &CliContext, machine: &TicketStateMachine<PortalClient>) -> Result<()> {
	let patch = args.patch();
	if patch.is_empty() {
		anyhow::bail!("nothing to change; pass --priority, --level, --assignee, --unassign or --sector");
	}

	let session = ctx.login().await?;
	machine
		.load(&session, args.ticket_id)
		.await
		.with_context(|| format!("failed to load ticket {}", args.ticket_id))?;
	let ticket = machine
		.edit_metadata(&session, args.ticket_id, patch)
		.await
		.with_context(|| format!("failed to edit ticket {}", args.ticket_id))?;

	println!("{} Ticket {} updated", style("✓").green().bold(), ticket.id);
	print_ticket(&ticket);
	Ok(())
}

fn print_ticket(ticket: &Ticket) {
	println!("{} {}", style(ticket.id).bold(), ticket.title);
	println!("  Status:   {}", style(ticket.status).cyan());
	println!("  Priority: {}", ticket.priority);
	println!("  Level:    {}", ticket.level);
	println!("  Creator:  {}", ticket.creator_id);
	println!("  Assignee: {}", display_or_dash(ticket.assignee_id));
	println!("  Sector:   {}", display_or_dash(ticket.sector_id));
	println!("  Updated:  {}", ticket.updated_at.format("%Y-%m-%d %H:%M:%S UTC"));
	if let Some(closed_at) = ticket.closed_at {
		println!("  Closed:   {}", closed_at.format("%Y-%m-%d %H:%M:%S UTC"));
	}
}

fn display_or_dash<T: std::fmt::Display>(value: Option<T>) -> String {
	value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn format_record(record: &StatusTransitionRecord) -> String {
	let from = record
		.from_status
		.map(|s| s.to_string())
		.unwrap_or_else(|| "created".to_string());
	let mut line = format!(
		"{}  {} → {}  by {}",
		record.at.format("%Y-%m-%d %H:%M:%S"),
		from,
		record.to_status,
		record.actor_id
	);
	if let Some(note) = &record.note {
		line.push_str(&format!("  \"{note}\""));
	}
	line
}

#[cfg(test)]
mod tests {
	use super::*;
	use chamado_common_core::TransitionId;
	use chrono::{TimeZone, Utc};

	fn edit_args() -> EditArgs {
		EditArgs {
			ticket_id: TicketId::generate(),
			priority: None,
			level: None,
			assignee: None,
			unassign: false,
			sector: None,
		}
	}

	#[test]
	fn unassign_clears_the_assignee() {
		let mut args = edit_args();
		args.unassign = true;
		let patch = args.patch();
		assert_eq!(patch.assignee_id, Some(None));
		assert!(patch.touches_assignment());
		assert!(!patch.touches_details());
	}

	#[test]
	fn no_flags_is_an_empty_patch() {
		assert!(edit_args().patch().is_empty());
	}

	#[test]
	fn priority_only_touches_details() {
		let mut args = edit_args();
		args.priority = Some(Priority::Urgent);
		let patch = args.patch();
		assert!(patch.touches_details());
		assert!(!patch.touches_assignment());
	}

	#[test]
	fn records_render_creation_and_notes() {
		let record = StatusTransitionRecord {
			id: TransitionId::generate(),
			ticket_id: TicketId::generate(),
			from_status: None,
			to_status: TicketStatus::Open,
			actor_id: UserId::generate(),
			at: Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap(),
			note: Some("printer on fire".into()),
		};
		let line = format_record(&record);
		assert!(line.starts_with("2025-03-01 09:30:00  created → open"));
		assert!(line.ends_with("\"printer on fire\""));
	}
}
