// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

use anyhow::{Context, Result};
use chamado_auth::{evaluate, Decision, PermissionMatrix, ResourceAction, ScopeFacts};
use chamado_common_core::{Actor, Role, SectorId, TicketStatus, UserId};
use chamado_common_http::ApiError;
use clap::{Args, Subcommand};
use console::style;
use tracing::{info, instrument, warn};

use crate::context::CliContext;

#[derive(Debug, Subcommand)]
pub enum MatrixCommands {
	/// Print the permission matrix document
	Export(ExportArgs),
	/// Replace the portal's permission matrix with a document
	Import(ImportArgs),
	/// Evaluate one permission against a matrix without contacting the portal
	Check(CheckArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ExportArgs {
	/// Write the document to a file instead of stdout
	#[arg(short, long)]
	pub output: Option<PathBuf>,

	/// Export the built-in defaults instead of the portal's current matrix
	#[arg(long)]
	pub defaults: bool,
}

#[derive(Debug, Clone, Args)]
pub struct ImportArgs {
	/// Matrix document (JSON)
	pub file: PathBuf,

	/// Validate the document without uploading it
	#[arg(long)]
	pub dry_run: bool,
}

#[derive(Debug, Clone, Args)]
pub struct CheckArgs {
	#[arg(long)]
	pub role: Role,

	#[arg(long)]
	pub action: ResourceAction,

	/// Matrix document to evaluate against (defaults to the built-in matrix)
	#[arg(long)]
	pub matrix: Option<PathBuf>,

	/// The actor created the ticket
	#[arg(long)]
	pub own: bool,

	/// The ticket is assigned to the actor
	#[arg(long)]
	pub assigned: bool,

	/// The ticket belongs to one of the actor's sectors
	#[arg(long)]
	pub same_sector: bool,

	/// Current ticket status
	#[arg(long)]
	pub status: Option<TicketStatus>,

	/// Status being requested (for change_status)
	#[arg(long)]
	pub requested_status: Option<TicketStatus>,

	/// Print the decision as JSON
	#[arg(long)]
	pub json: bool,
}

pub async fn run(command: MatrixCommands, ctx: &CliContext) -> Result<()> {
	match command {
		MatrixCommands::Export(args) => handle_export(args, ctx).await,
		MatrixCommands::Import(args) => handle_import(args, ctx).await,
		MatrixCommands::Check(args) => handle_check(args),
	}
}

#[instrument(skip(ctx))]
async fn handle_export(args: ExportArgs, ctx: &CliContext) -> Result<()> {
	let matrix = if args.defaults {
		PermissionMatrix::portal_defaults()
	} else {
		ctx
			.client
			.fetch_matrix()
			.await
			.context("failed to fetch the permission matrix")?
	};

	let json = matrix.export_json()?;
	match args.output {
		Some(path) => {
			tokio::fs::write(&path, format!("{json}\n"))
				.await
				.with_context(|| format!("failed to write {}", path.display()))?;
			eprintln!(
				"{} Exported {} to {}",
				style("✓").green().bold(),
				summarize(&matrix),
				path.display()
			);
		}
		None => println!("{json}"),
	}
	Ok(())
}

#[instrument(skip(ctx))]
async fn handle_import(args: ImportArgs, ctx: &CliContext) -> Result<()> {
	let json = tokio::fs::read_to_string(&args.file)
		.await
		.with_context(|| format!("failed to read {}", args.file.display()))?;
	let matrix = PermissionMatrix::import_json(&json)
		.with_context(|| format!("invalid matrix document {}", args.file.display()))?;

	if args.dry_run {
		println!("{} Document is valid ({})", style("✓").green().bold(), summarize(&matrix));
		return Ok(());
	}

	let session = ctx.login().await?;
	session.authorize(ResourceAction::ManagePermissions, &ScopeFacts::none())?;

	match ctx.client.update_matrix(&matrix).await {
		Ok(()) => {
			info!(rules = matrix.len(), "permission matrix updated");
			println!("{} Permission matrix updated ({} rules)", style("✓").green().bold(), matrix.len());
		}
		Err(ApiError::Conflict(message)) => {
			// Someone else saved first.
			warn!(%message, "permission matrix changed concurrently");
			println!(
				"{} Permission matrix was changed by someone else; export it again before editing ({message})",
				style("!").yellow().bold()
			);
		}
		Err(e) => return Err(e).context("failed to upload the permission matrix"),
	}
	Ok(())
}

fn handle_check(args: CheckArgs) -> Result<()> {
	let matrix = match &args.matrix {
		Some(path) => {
			let json = std::fs::read_to_string(path)
				.with_context(|| format!("failed to read {}", path.display()))?;
			PermissionMatrix::import_json(&json)
				.with_context(|| format!("invalid matrix document {}", path.display()))?
		}
		None => PermissionMatrix::portal_defaults(),
	};

	let decision = check(&matrix, &args);
	if args.json {
		println!("{}", serde_json::to_string_pretty(&decision)?);
	} else {
		println!("{}", describe(&matrix, &args, &decision));
	}
	Ok(())
}

/// "N rules, M allowing".
fn summarize(matrix: &PermissionMatrix) -> String {
	let allowing = matrix.rules().filter(|rule| rule.allowed).count();
	format!("{} rules, {allowing} allowing", matrix.len())
}

/// Builds a hypothetical actor and ticket from the flags and evaluates them.
fn check(matrix: &PermissionMatrix, args: &CheckArgs) -> Decision {
	let mut actor = Actor::new(UserId::generate(), args.role);
	let mut facts = ScopeFacts {
		owner_id: Some(if args.own { actor.id } else { UserId::generate() }),
		assignee_id: args.assigned.then_some(actor.id),
		sector_id: None,
		current_status: args.status,
		requested_status: args.requested_status,
	};
	if args.same_sector {
		let sector = SectorId::generate();
		actor = actor.with_sector(sector);
		facts.sector_id = Some(sector);
	}
	evaluate(matrix, &actor, args.action, &facts)
}

fn describe(matrix: &PermissionMatrix, args: &CheckArgs, decision: &Decision) -> String {
	let verdict = if decision.allowed {
		style("allow").green().bold()
	} else {
		style("deny").red().bold()
	};
	if matrix.rule(args.action, args.role).is_none() {
		return format!("{verdict} {} {} (no rule)", args.role, args.action);
	}
	match decision.scope {
		Some(scope) => format!("{verdict} {} {} (scope: {scope})", args.role, args.action),
		None => format!("{verdict} {} {}", args.role, args.action),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn args(role: Role, action: ResourceAction) -> CheckArgs {
		CheckArgs {
			role,
			action,
			matrix: None,
			own: false,
			assigned: false,
			same_sector: false,
			status: None,
			requested_status: None,
			json: false,
		}
	}

	#[test]
	fn requester_may_close_own_resolved_ticket() {
		let matrix = PermissionMatrix::portal_defaults();
		let mut check_args = args(Role::Requester, ResourceAction::ChangeStatus);
		check_args.own = true;
		check_args.status = Some(TicketStatus::Resolved);
		check_args.requested_status = Some(TicketStatus::Closed);
		assert!(check(&matrix, &check_args).allowed);

		check_args.requested_status = Some(TicketStatus::Open);
		assert!(!check(&matrix, &check_args).allowed);
	}

	#[test]
	fn technician_needs_assignment_or_sector() {
		let matrix = PermissionMatrix::portal_defaults();
		let mut check_args = args(Role::Technician, ResourceAction::ChangeStatus);
		assert!(!check(&matrix, &check_args).allowed);

		check_args.same_sector = true;
		assert!(check(&matrix, &check_args).allowed);

		check_args.same_sector = false;
		check_args.assigned = true;
		assert!(check(&matrix, &check_args).allowed);
	}

	#[test]
	fn only_administrators_manage_permissions_by_default() {
		let matrix = PermissionMatrix::portal_defaults();
		for role in Role::all() {
			let decision = check(&matrix, &args(*role, ResourceAction::ManagePermissions));
			assert_eq!(decision.allowed, *role == Role::Administrator, "{role}");
		}
	}

	#[test]
	fn empty_matrix_denies() {
		let matrix = PermissionMatrix::new();
		let check_args = args(Role::Administrator, ResourceAction::ViewTicket);
		let decision = check(&matrix, &check_args);
		assert!(!decision.allowed);
		assert_eq!(decision.scope, None);
		assert!(describe(&matrix, &check_args, &decision).ends_with("(no rule)"));
	}

	#[test]
	fn summary_counts_allowing_rules() {
		let matrix = PermissionMatrix::portal_defaults();
		let allowing = matrix.rules().filter(|rule| rule.allowed).count();
		assert!(allowing > 0 && allowing <= matrix.len());
		assert_eq!(summarize(&matrix), format!("{} rules, {allowing} allowing", matrix.len()));
		assert_eq!(summarize(&PermissionMatrix::new()), "0 rules, 0 allowing");
	}
}
