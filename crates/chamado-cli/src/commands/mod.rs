// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

pub mod attachment;
pub mod matrix;
pub mod thread;
pub mod ticket;

pub use attachment::AttachmentCommands;
pub use matrix::MatrixCommands;
pub use thread::ThreadCommands;
pub use ticket::TicketCommands;
