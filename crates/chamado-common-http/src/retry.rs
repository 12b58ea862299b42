// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Retry with exponential backoff and jitter.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

/// Errors that know whether repeating the request can succeed.
pub trait RetryableError {
	fn is_retryable(&self) -> bool;
}

impl RetryableError for reqwest::Error {
	fn is_retryable(&self) -> bool {
		if self.is_timeout() || self.is_connect() || self.is_request() {
			return true;
		}
		self
			.status()
			.map(|s| s.is_server_error() || s.as_u16() == 429)
			.unwrap_or(false)
	}
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
	/// Total attempts including the first one.
	pub max_attempts: u32,
	pub base_delay: Duration,
	pub max_delay: Duration,
	/// Adds up to 50% random jitter to each delay.
	pub jitter: bool,
}

impl Default for RetryConfig {
	fn default() -> Self {
		Self {
			max_attempts: 3,
			base_delay: Duration::from_millis(200),
			max_delay: Duration::from_secs(5),
			jitter: true,
		}
	}
}

impl RetryConfig {
	pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
		backoff_delay(self.base_delay, self.max_delay, attempt, self.jitter)
	}
}

/// Exponential delay `base * 2^attempt`, capped at `max`.
///
/// With `jitter` the result is scaled by a random factor in `[0.5, 1.0]`, so it
/// never exceeds `max`.
pub fn backoff_delay(base: Duration, max: Duration, attempt: u32, jitter: bool) -> Duration {
	let factor = 2u64.saturating_pow(attempt.min(16));
	let base_ms = base.as_millis().min(u64::MAX as u128) as u64;
	let capped = base_ms
		.saturating_mul(factor)
		.min(max.as_millis().min(u64::MAX as u128) as u64);
	if jitter && capped > 0 {
		let half = capped / 2;
		Duration::from_millis(half + fastrand::u64(0..=capped - half))
	} else {
		Duration::from_millis(capped)
	}
}

/// Runs `op` until it succeeds, fails with a non-retryable error, or the
/// attempt budget is spent.
pub async fn retry<T, E, F, Fut>(config: &RetryConfig, mut op: F) -> Result<T, E>
where
	E: RetryableError + std::fmt::Display,
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<T, E>>,
{
	let mut attempt = 0;
	loop {
		match op().await {
			Ok(value) => return Ok(value),
			Err(e) if e.is_retryable() && attempt + 1 < config.max_attempts => {
				let delay = config.delay_for_attempt(attempt);
				warn!(
					attempt = attempt + 1,
					max_attempts = config.max_attempts,
					delay_ms = delay.as_millis() as u64,
					error = %e,
					"retryable request failure"
				);
				tokio::time::sleep(delay).await;
				attempt += 1;
			}
			Err(e) => {
				debug!(attempt = attempt + 1, error = %e, "giving up on request");
				return Err(e);
			}
		}
	}
}
