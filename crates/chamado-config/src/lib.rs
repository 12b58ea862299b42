// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the Chamado portal client.
//!
//! Layers are read from built-in defaults, `/etc/chamado/portal.toml`, the
//! user's `~/.config/chamado/portal.toml` (or an explicit file) and
//! `CHAMADO_*` environment variables, in increasing order of precedence.
//!
//! ```ignore
//! use chamado_config::load_config;
//!
//! let config = load_config()?;
//! println!("portal api at {}", config.api.base_url);
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::PortalConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use std::path::PathBuf;

use tracing::{debug, info};

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct PortalConfig {
	pub api: ApiConfig,
	pub push: PushConfig,
	pub uploads: UploadsConfig,
	pub logging: LoggingConfig,
	pub session: SessionConfig,
}

/// Loads configuration with the standard sources.
pub fn load_config() -> Result<PortalConfig, ConfigError> {
	let mut sources: Vec<Box<dyn ConfigSource>> = vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	];
	if let Some(user) = TomlSource::user() {
		sources.push(Box::new(user));
	}
	load_from_sources(sources)
}

/// Loads configuration with an explicit file in place of the user file.
pub fn load_config_with_file(config_path: impl Into<PathBuf>) -> Result<PortalConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

pub fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<PortalConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = PortalConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		merged.merge(source.load()?);
	}

	finalize(merged)
}

/// Resolves a merged layer, applying defaults and validation.
pub fn finalize(layer: PortalConfigLayer) -> Result<PortalConfig, ConfigError> {
	let api = layer.api.unwrap_or_default().finalize()?;
	let push = layer.push.unwrap_or_default().finalize(&api.base_url)?;
	let uploads = layer.uploads.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();
	let session = layer.session.unwrap_or_default().finalize();

	info!(
		api = %api.base_url,
		push = %push.url,
		max_upload_bytes = uploads.max_bytes,
		token_configured = session.token.is_some(),
		"portal configuration loaded"
	);

	Ok(PortalConfig {
		api,
		push,
		uploads,
		logging,
		session,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::time::Duration;

	struct Fixed(Precedence, &'static str);

	impl ConfigSource for Fixed {
		fn name(&self) -> &'static str {
			"fixed"
		}

		fn precedence(&self) -> Precedence {
			self.0
		}

		fn load(&self) -> Result<PortalConfigLayer, ConfigError> {
			Ok(toml::from_str(self.1).unwrap())
		}
	}

	#[test]
	fn defaults_resolve() {
		let config = finalize(PortalConfigLayer::default()).unwrap();
		assert_eq!(config.api.timeout, Duration::from_secs(30));
		assert_eq!(config.push.url.scheme(), "ws");
		assert_eq!(config.uploads.max_bytes, sections::DEFAULT_MAX_UPLOAD_BYTES);
		assert_eq!(config.logging.level, "info");
		assert!(config.session.token.is_none());
	}

	#[test]
	fn higher_precedence_wins_regardless_of_order() {
		let sources: Vec<Box<dyn ConfigSource>> = vec![
			Box::new(Fixed(Precedence::Environment, "[api]\ntimeout_secs = 5")),
			Box::new(Fixed(
				Precedence::SystemConfigFile,
				"[api]\ntimeout_secs = 60\nretry_max_attempts = 7",
			)),
			Box::new(DefaultsSource),
		];
		let config = load_from_sources(sources).unwrap();
		assert_eq!(config.api.timeout, Duration::from_secs(5));
		assert_eq!(config.api.retry_max_attempts, 7);
	}

	#[test]
	fn explicit_file_is_layered_over_defaults() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("portal.toml");
		std::fs::write(
			&path,
			r#"
			[api]
			base_url = "https://help.example.org/api/"

			[push]
			degraded_after = 2

			[logging]
			format = "json"
			"#,
		)
		.unwrap();

		let sources: Vec<Box<dyn ConfigSource>> = vec![Box::new(DefaultsSource), Box::new(TomlSource::new(&path))];
		let config = load_from_sources(sources).unwrap();
		assert_eq!(config.push.url.as_str(), "wss://help.example.org/api/push");
		assert_eq!(config.push.degraded_after, 2);
		assert_eq!(config.logging.format, LogFormat::Json);
	}
}
