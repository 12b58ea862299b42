// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Push channel configuration.

use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushConfig {
	pub url: Url,
	pub reconnect_base: Duration,
	pub reconnect_max: Duration,
	pub degraded_after: u32,
	pub jitter: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PushConfigLayer {
	/// Defaults to `push` under the API base URL with a ws/wss scheme.
	#[serde(default)]
	pub url: Option<String>,
	#[serde(default)]
	pub reconnect_base_ms: Option<u64>,
	#[serde(default)]
	pub reconnect_max_ms: Option<u64>,
	#[serde(default)]
	pub degraded_after: Option<u32>,
	#[serde(default)]
	pub jitter: Option<bool>,
}

impl PushConfigLayer {
	pub fn merge(&mut self, other: PushConfigLayer) {
		if other.url.is_some() {
			self.url = other.url;
		}
		if other.reconnect_base_ms.is_some() {
			self.reconnect_base_ms = other.reconnect_base_ms;
		}
		if other.reconnect_max_ms.is_some() {
			self.reconnect_max_ms = other.reconnect_max_ms;
		}
		if other.degraded_after.is_some() {
			self.degraded_after = other.degraded_after;
		}
		if other.jitter.is_some() {
			self.jitter = other.jitter;
		}
	}

	pub fn finalize(self, api_base: &Url) -> Result<PushConfig, ConfigError> {
		let url = match self.url {
			Some(raw) => Url::parse(&raw).map_err(|e| ConfigError::InvalidValue {
				key: "push.url".to_string(),
				message: format!("'{raw}' is not a valid URL: {e}"),
			})?,
			None => derive_push_url(api_base)?,
		};
		if !matches!(url.scheme(), "ws" | "wss") {
			return Err(ConfigError::Validation(format!(
				"push.url must use ws or wss, got '{url}'"
			)));
		}

		let reconnect_base = Duration::from_millis(self.reconnect_base_ms.unwrap_or(500));
		let reconnect_max = Duration::from_millis(self.reconnect_max_ms.unwrap_or(30_000));
		if reconnect_max < reconnect_base {
			return Err(ConfigError::Validation(
				"push.reconnect_max_ms must not be below push.reconnect_base_ms".to_string(),
			));
		}

		Ok(PushConfig {
			url,
			reconnect_base,
			reconnect_max,
			degraded_after: self.degraded_after.unwrap_or(5),
			jitter: self.jitter.unwrap_or(true),
		})
	}
}

fn derive_push_url(api_base: &Url) -> Result<Url, ConfigError> {
	let mut url = api_base.join("push").map_err(|e| ConfigError::InvalidValue {
		key: "push.url".to_string(),
		message: e.to_string(),
	})?;
	let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
	url
		.set_scheme(scheme)
		.map_err(|_| ConfigError::Validation(format!("cannot derive push url from '{api_base}'")))?;
	Ok(url)
}
