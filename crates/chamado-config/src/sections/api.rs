// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Portal REST API configuration.

use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
	/// Always ends with `/` so relative routes join under it.
	pub base_url: Url,
	pub timeout: Duration,
	pub retry_max_attempts: u32,
	pub page_size: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfigLayer {
	#[serde(default)]
	pub base_url: Option<String>,
	#[serde(default)]
	pub timeout_secs: Option<u64>,
	#[serde(default)]
	pub retry_max_attempts: Option<u32>,
	#[serde(default)]
	pub page_size: Option<u32>,
}

impl ApiConfigLayer {
	pub fn merge(&mut self, other: ApiConfigLayer) {
		if other.base_url.is_some() {
			self.base_url = other.base_url;
		}
		if other.timeout_secs.is_some() {
			self.timeout_secs = other.timeout_secs;
		}
		if other.retry_max_attempts.is_some() {
			self.retry_max_attempts = other.retry_max_attempts;
		}
		if other.page_size.is_some() {
			self.page_size = other.page_size;
		}
	}

	pub fn finalize(self) -> Result<ApiConfig, ConfigError> {
		let raw = self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
		let mut base_url = Url::parse(&raw).map_err(|e| ConfigError::InvalidValue {
			key: "api.base_url".to_string(),
			message: format!("'{raw}' is not a valid URL: {e}"),
		})?;
		if !matches!(base_url.scheme(), "http" | "https") {
			return Err(ConfigError::Validation(format!(
				"api.base_url must use http or https, got '{raw}'"
			)));
		}
		if !base_url.path().ends_with('/') {
			let path = format!("{}/", base_url.path());
			base_url.set_path(&path);
		}

		let page_size = self.page_size.unwrap_or(50);
		if page_size == 0 {
			return Err(ConfigError::Validation("api.page_size must be at least 1".to_string()));
		}

		Ok(ApiConfig {
			base_url,
			timeout: Duration::from_secs(self.timeout_secs.unwrap_or(30)),
			retry_max_attempts: self.retry_max_attempts.unwrap_or(3).max(1),
			page_size,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults() {
		let config = ApiConfigLayer::default().finalize().unwrap();
		assert_eq!(config.base_url.as_str(), DEFAULT_BASE_URL);
		assert_eq!(config.timeout, Duration::from_secs(30));
		assert_eq!(config.retry_max_attempts, 3);
		assert_eq!(config.page_size, 50);
	}

	#[test]
	fn base_url_gains_trailing_slash() {
		let config = ApiConfigLayer {
			base_url: Some("https://portal.example.com/api".to_string()),
			..Default::default()
		}
		.finalize()
		.unwrap();
		assert_eq!(
			config.base_url.join("tickets").unwrap().as_str(),
			"https://portal.example.com/api/tickets"
		);
	}

	#[test]
	fn rejects_non_http_schemes() {
		let layer = ApiConfigLayer {
			base_url: Some("ftp://portal.example.com/".to_string()),
			..Default::default()
		};
		assert!(matches!(layer.finalize(), Err(ConfigError::Validation(_))));

		let layer = ApiConfigLayer {
			base_url: Some("not a url".to_string()),
			..Default::default()
		};
		assert!(matches!(layer.finalize(), Err(ConfigError::InvalidValue { .. })));
	}
}
