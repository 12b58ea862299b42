// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::time::Duration;

use chamado_common_http::backoff_delay;

/// Reconnect schedule for the push channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
	pub base: Duration,
	pub max: Duration,
	pub jitter: bool,
	/// Consecutive failures after which the link is reported degraded.
	/// Zero disables the report.
	pub degraded_after: u32,
}

impl Default for ReconnectPolicy {
	fn default() -> Self {
		Self {
			base: Duration::from_millis(500),
			max: Duration::from_secs(30),
			jitter: true,
			degraded_after: 5,
		}
	}
}

impl ReconnectPolicy {
	/// Delay before reconnect number `failures` (1-based).
	pub fn delay_for(&self, failures: u32) -> Duration {
		backoff_delay(self.base, self.max, failures.saturating_sub(1), self.jitter)
	}

	pub fn is_degraded(&self, failures: u32) -> bool {
		self.degraded_after > 0 && failures >= self.degraded_after
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn grows_then_caps() {
		let policy = ReconnectPolicy {
			base: Duration::from_millis(100),
			max: Duration::from_secs(1),
			jitter: false,
			degraded_after: 3,
		};
		assert_eq!(policy.delay_for(1), Duration::from_millis(100));
		assert_eq!(policy.delay_for(2), Duration::from_millis(200));
		assert_eq!(policy.delay_for(4), Duration::from_millis(800));
		assert_eq!(policy.delay_for(5), Duration::from_secs(1));
		assert_eq!(policy.delay_for(500), Duration::from_secs(1));
	}

	#[test]
	fn degraded_threshold() {
		let policy = ReconnectPolicy {
			degraded_after: 3,
			..ReconnectPolicy::default()
		};
		assert!(!policy.is_degraded(2));
		assert!(policy.is_degraded(3));
		assert!(policy.is_degraded(10));

		let never = ReconnectPolicy {
			degraded_after: 0,
			..ReconnectPolicy::default()
		};
		assert!(!never.is_degraded(u32::MAX));
	}

	proptest! {
		#[test]
		fn jittered_delay_stays_within_bounds(failures in 1u32..64, base_ms in 1u64..2_000, max_ms in 1u64..60_000) {
			let policy = ReconnectPolicy {
				base: Duration::from_millis(base_ms),
				max: Duration::from_millis(max_ms),
				jitter: true,
				degraded_after: 5,
			};
			let delay = policy.delay_for(failures);
			prop_assert!(delay <= Duration::from_millis(max_ms));
		}
	}
}
