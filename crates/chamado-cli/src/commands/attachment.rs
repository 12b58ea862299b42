// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chamado_api::PortalClient;
use chamado_common_core::{Attachment, TicketId};
use chamado_tickets::{AttachmentRegistry, NewAttachment};
use clap::{Args, Subcommand};
use console::style;
use tracing::instrument;

use crate::context::CliContext;

const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

#[derive(Debug, Subcommand)]
pub enum AttachmentCommands {
	/// List a ticket's attachments
	List(ListArgs),
	/// Attach a file to a ticket
	Upload(UploadArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ListArgs {
	pub ticket_id: TicketId,

	/// Print the attachments as JSON
	#[arg(long)]
	pub json: bool,
}

#[derive(Debug, Clone, Args)]
pub struct UploadArgs {
	pub ticket_id: TicketId,

	pub file: PathBuf,

	/// MIME type sent with the file
	#[arg(long, default_value = DEFAULT_MIME_TYPE)]
	pub mime_type: String,
}

pub async fn run(command: AttachmentCommands, ctx: &CliContext) -> Result<()> {
	let registry = AttachmentRegistry::new(Arc::clone(&ctx.client))
		.with_max_upload_bytes(ctx.config.uploads.max_bytes);
	match command {
		AttachmentCommands::List(args) => handle_list(args, ctx, &registry).await,
		AttachmentCommands::Upload(args) => handle_upload(args, ctx, &registry).await,
	}
}

#[instrument(skip(ctx, registry))]
async fn handle_list(args: ListArgs, ctx: &CliContext, registry: &AttachmentRegistry<PortalClient>) -> Result<()> {
	let session = ctx.login().await?;
	let ticket = ctx.fetch_ticket(args.ticket_id).await?;
	let attachments = registry
		.list(&session, &ticket)
		.await
		.with_context(|| format!("failed to list attachments of ticket {}", args.ticket_id))?;

	if args.json {
		println!("{}", serde_json::to_string_pretty(&attachments)?);
	} else if attachments.is_empty() {
		println!("No attachments");
	} else {
		for attachment in &attachments {
			println!("{}", format_attachment(attachment));
		}
	}
	Ok(())
}

#[instrument(skip(ctx, registry))]
async fn handle_upload(
	args: UploadArgs,
	ctx: &CliContext,
	registry: &AttachmentRegistry<PortalClient>,
) -> Result<()> {
	let filename = file_name(&args.file)?;
	let content = tokio::fs::read(&args.file)
		.await
		.with_context(|| format!("failed to read {}", args.file.display()))?;

	let session = ctx.login().await?;
	let ticket = ctx.fetch_ticket(args.ticket_id).await?;
	let attachment = registry
		.upload(&session, &ticket, NewAttachment::new(filename, args.mime_type, content))
		.await
		.with_context(|| format!("failed to upload {}", args.file.display()))?;

	println!("{} Uploaded {}", style("✓").green().bold(), format_attachment(&attachment));
	Ok(())
}

fn file_name(path: &Path) -> Result<String> {
	path
		.file_name()
		.and_then(|name| name.to_str())
		.map(str::to_string)
		.ok_or_else(|| anyhow!("{} has no usable file name", path.display()))
}

fn format_attachment(attachment: &Attachment) -> String {
	format!(
		"{}  {} ({}, {})",
		attachment.id,
		attachment.filename,
		attachment.mime_type,
		human_size(attachment.size_bytes)
	)
}

fn human_size(bytes: u64) -> String {
	const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
	let mut value = bytes as f64;
	let mut unit = 0;
	while value >= 1024.0 && unit < UNITS.len() - 1 {
		value /= 1024.0;
		unit += 1;
	}
	if unit == 0 {
		format!("{bytes} B")
	} else {
		format!("{value:.1} {}", UNITS[unit])
	}
}
