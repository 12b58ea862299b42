// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: built-in defaults, TOML files and environment
//! variables.

use std::path::{Path, PathBuf};

use chamado_auth::SessionToken;
use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::PortalConfigLayer;
use crate::sections::{
	ApiConfigLayer, LogFormat, LoggingConfigLayer, PushConfigLayer, SessionConfigLayer,
	UploadsConfigLayer,
};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	SystemConfigFile = 20,
	UserConfigFile = 30,
	Environment = 50,
}

pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<PortalConfigLayer, ConfigError>;
}

pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<PortalConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(PortalConfigLayer::default())
	}
}

/// A TOML file. A missing file is an empty layer.
pub struct TomlSource {
	path: PathBuf,
	precedence: Precedence,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			precedence: Precedence::UserConfigFile,
		}
	}

	pub fn system() -> Self {
		Self {
			path: PathBuf::from("/etc/chamado/portal.toml"),
			precedence: Precedence::SystemConfigFile,
		}
	}

	/// `$XDG_CONFIG_HOME/chamado/portal.toml`, if a config directory exists.
	pub fn user() -> Option<Self> {
		dirs::config_dir().map(|dir| Self::new(dir.join("chamado").join("portal.toml")))
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		match self.precedence {
			Precedence::SystemConfigFile => "system-config",
			_ => "user-config",
		}
	}

	fn precedence(&self) -> Precedence {
		self.precedence
	}

	fn load(&self) -> Result<PortalConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(PortalConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: PortalConfigLayer = toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
			path: self.path.clone(),
			source: e,
		})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variables.
///
/// Convention: CHAMADO_<SECTION>_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<PortalConfigLayer, ConfigError> {
		debug!("loading environment variables");
		load_from(|name| std::env::var(name).ok())
	}
}

/// Builds a layer from a variable lookup. Split out so tests need not touch
/// the process environment.
pub(crate) fn load_from(lookup: impl Fn(&str) -> Option<String>) -> Result<PortalConfigLayer, ConfigError> {
	let env = Env(lookup);
	Ok(PortalConfigLayer {
		api: Some(ApiConfigLayer {
			base_url: env.var("CHAMADO_API_BASE_URL"),
			timeout_secs: env.parse("CHAMADO_API_TIMEOUT_SECS")?,
			retry_max_attempts: env.parse("CHAMADO_API_RETRY_MAX_ATTEMPTS")?,
			page_size: env.parse("CHAMADO_API_PAGE_SIZE")?,
		}),
		push: Some(PushConfigLayer {
			url: env.var("CHAMADO_PUSH_URL"),
			reconnect_base_ms: env.parse("CHAMADO_PUSH_RECONNECT_BASE_MS")?,
			reconnect_max_ms: env.parse("CHAMADO_PUSH_RECONNECT_MAX_MS")?,
			degraded_after: env.parse("CHAMADO_PUSH_DEGRADED_AFTER")?,
			jitter: env.bool("CHAMADO_PUSH_JITTER"),
		}),
		uploads: Some(UploadsConfigLayer {
			max_bytes: env.parse("CHAMADO_UPLOADS_MAX_BYTES")?,
		}),
		logging: Some(LoggingConfigLayer {
			level: env.var("CHAMADO_LOGGING_LEVEL"),
			format: env.parse::<LogFormat>("CHAMADO_LOGGING_FORMAT")?,
		}),
		session: Some(SessionConfigLayer {
			token: env.var("CHAMADO_SESSION_TOKEN").map(SessionToken::new),
		}),
	})
}

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
	fn var(&self, name: &str) -> Option<String> {
		(self.0)(name).filter(|s| !s.is_empty())
	}

	fn bool(&self, name: &str) -> Option<bool> {
		self.var(name).map(|v| v.eq_ignore_ascii_case("true") || v == "1")
	}

	fn parse<T>(&self, name: &str) -> Result<Option<T>, ConfigError>
	where
		T: std::str::FromStr,
		T::Err: std::fmt::Display,
	{
		match self.var(name) {
			Some(v) => v.parse().map(Some).map_err(|e| ConfigError::InvalidValue {
				key: name.to_string(),
				message: format!("invalid value '{v}': {e}"),
			}),
			None => Ok(None),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
		move |name| vars.get(name).cloned()
	}

	#[test]
	fn precedence_ordering() {
		assert!(Precedence::Environment > Precedence::UserConfigFile);
		assert!(Precedence::UserConfigFile > Precedence::SystemConfigFile);
		assert!(Precedence::SystemConfigFile > Precedence::Defaults);
	}

	#[test]
	fn missing_file_is_empty_layer() {
		let layer = TomlSource::new("/nonexistent/portal.toml").load().unwrap();
		assert!(layer.api.is_none());
	}

	#[test]
	fn malformed_file_reports_path() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("portal.toml");
		std::fs::write(&path, "[api\nbase_url = ").unwrap();
		match TomlSource::new(&path).load() {
			Err(ConfigError::TomlParse { path: p, .. }) => assert_eq!(p, path),
			other => panic!("expected parse error, got {other:?}"),
		}
	}

	#[test]
	fn env_maps_section_and_field() {
		let layer = load_from(lookup(&[
			("CHAMADO_API_BASE_URL", "https://portal.example.com/api/"),
			("CHAMADO_PUSH_JITTER", "0"),
			("CHAMADO_UPLOADS_MAX_BYTES", "2048"),
			("CHAMADO_LOGGING_FORMAT", "json"),
			("CHAMADO_SESSION_TOKEN", "tok"),
			("CHAMADO_API_TIMEOUT_SECS", ""),
		]))
		.unwrap();

		let api = layer.api.unwrap();
		assert_eq!(api.base_url.as_deref(), Some("https://portal.example.com/api/"));
		assert_eq!(api.timeout_secs, None);
		assert_eq!(layer.push.unwrap().jitter, Some(false));
		assert_eq!(layer.uploads.unwrap().max_bytes, Some(2048));
		assert_eq!(layer.logging.unwrap().format, Some(LogFormat::Json));
		assert_eq!(layer.session.unwrap().token.unwrap().expose(), "tok");
	}

	#[test]
	fn env_rejects_bad_numbers() {
		let err = load_from(lookup(&[("CHAMADO_PUSH_DEGRADED_AFTER", "many")])).unwrap_err();
		assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == "CHAMADO_PUSH_DEGRADED_AFTER"));
	}
}
