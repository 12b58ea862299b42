// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Chamado CLI
//!
//! Terminal front end for the ticket portal: inspect and edit the permission
//! matrix, move tickets through their lifecycle, and follow a ticket's
//! conversation live.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chamado_config::{load_config, load_config_with_file, LogFormat, LoggingConfig};

mod commands;
mod context;

use commands::{AttachmentCommands, MatrixCommands, ThreadCommands, TicketCommands};
use context::CliContext;

/// Chamado - ticket portal client
#[derive(Parser, Debug)]
#[command(name = "chamado", version, about, long_about = None)]
struct Args {
	/// Path to custom configuration file
	#[arg(short, long, env = "CHAMADO_CONFIG")]
	config: Option<PathBuf>,

	/// Log level (overrides config)
	#[arg(short, long)]
	log_level: Option<String>,

	/// Output logs as JSON (overrides config)
	#[arg(long)]
	json_logs: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Inspect, export and import the permission matrix
	Matrix {
		#[command(subcommand)]
		command: MatrixCommands,
	},
	/// Show tickets and change their status
	Ticket {
		#[command(subcommand)]
		command: TicketCommands,
	},
	/// Read, follow and reply to a ticket's conversation
	Thread {
		#[command(subcommand)]
		command: ThreadCommands,
	},
	/// List and upload ticket attachments
	Attachment {
		#[command(subcommand)]
		command: AttachmentCommands,
	},
}

fn init_tracing(logging: &LoggingConfig) {
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(logging.level.as_str()));

	// stdout carries command output (matrix exports, JSON); logs go to stderr.
	match logging.format {
		LogFormat::Json => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().json().with_writer(std::io::stderr))
				.init();
		}
		LogFormat::Pretty => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().with_writer(std::io::stderr))
				.init();
		}
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	let args = Args::parse();

	let mut config = match &args.config {
		Some(path) => load_config_with_file(path),
		None => load_config(),
	}
	.context("failed to load configuration")?;

	if let Some(level) = &args.log_level {
		config.logging.level = level.clone();
	}
	if args.json_logs {
		config.logging.format = LogFormat::Json;
	}

	init_tracing(&config.logging);
	debug!(api = %config.api.base_url, "starting chamado");

	let ctx = CliContext::new(config)?;

	let result = match args.command {
		Command::Matrix { command } => commands::matrix::run(command, &ctx).await,
		Command::Ticket { command } => commands::ticket::run(command, &ctx).await,
		Command::Thread { command } => commands::thread::run(command, &ctx).await,
		Command::Attachment { command } => commands::attachment::run(command, &ctx).await,
	};

	if let Err(e) = &result {
		if ctx.expire_if_rejected(e) {
			eprintln!("Session expired. Sign in to the portal again and update CHAMADO_SESSION_TOKEN.");
		}
	}
	result
}

#[cfg(test)]
mod tests {
	use super::*;
	use chamado_auth::ResourceAction;
	use chamado_common_core::{Role, TicketStatus};
	use clap::CommandFactory;

	#[test]
	fn command_definition_is_consistent() {
		Args::command().debug_assert();
	}

	#[test]
	fn parses_global_overrides() {
		let args = Args::try_parse_from([
			"chamado",
			"--config",
			"/tmp/portal.toml",
			"--log-level",
			"debug",
			"--json-logs",
			"matrix",
			"export",
		])
		.unwrap();
		assert_eq!(args.config, Some(PathBuf::from("/tmp/portal.toml")));
		assert_eq!(args.log_level.as_deref(), Some("debug"));
		assert!(args.json_logs);
	}

	#[test]
	fn parses_ticket_transition() {
		let args = Args::try_parse_from([
			"chamado",
			"ticket",
			"transition",
			"6f1c1a52-6d3f-4a55-9a43-0d9cbd0a8b11",
			"in_progress",
			"--note",
			"picking this up",
		])
		.unwrap();
		match args.command {
			Command::Ticket {
				command: TicketCommands::Transition(t),
			} => {
				assert_eq!(t.ticket_id.to_string(), "6f1c1a52-6d3f-4a55-9a43-0d9cbd0a8b11");
				assert_eq!(t.status, TicketStatus::InProgress);
				assert_eq!(t.note.as_deref(), Some("picking this up"));
			}
			other => panic!("unexpected command: {other:?}"),
		}
	}

	#[test]
	fn rejects_unknown_status() {
		let err = Args::try_parse_from([
			"chamado",
			"ticket",
			"transition",
			"6f1c1a52-6d3f-4a55-9a43-0d9cbd0a8b11",
			"reopened",
		])
		.unwrap_err();
		assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
	}

	#[test]
	fn rejects_malformed_ticket_id() {
		let err = Args::try_parse_from(["chamado", "thread", "watch", "not-a-uuid"]).unwrap_err();
		assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
	}

	#[test]
	fn parses_matrix_check_facts() {
		let args = Args::try_parse_from([
			"chamado",
			"matrix",
			"check",
			"--role",
			"requester",
			"--action",
			"change_status",
			"--own",
			"--status",
			"resolved",
			"--requested-status",
			"closed",
		])
		.unwrap();
		match args.command {
			Command::Matrix {
				command: MatrixCommands::Check(check),
			} => {
				assert_eq!(check.role, Role::Requester);
				assert_eq!(check.action, ResourceAction::ChangeStatus);
				assert!(check.own);
				assert_eq!(check.status, Some(TicketStatus::Resolved));
				assert_eq!(check.requested_status, Some(TicketStatus::Closed));
			}
			other => panic!("unexpected command: {other:?}"),
		}
	}

	#[test]
	fn subcommand_is_required() {
		assert!(Args::try_parse_from(["chamado"]).is_err());
	}
}
