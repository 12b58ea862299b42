// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP utilities for Chamado.
//!
//! This crate provides:
//! - A pre-configured HTTP client with consistent User-Agent header
//! - The transport error taxonomy ([`ApiError`]) every API port speaks
//! - Retry logic with exponential backoff for transient failures

mod client;
mod error;
mod retry;

pub use client::{builder, new_client_with_timeout, user_agent};
pub use error::{error_for_status, ApiError};
pub use reqwest::StatusCode;
pub use retry::{backoff_delay, retry, RetryConfig, RetryableError};
