// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chamado_auth::SessionToken;
use serde::Deserialize;

#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
	pub token: Option<SessionToken>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfigLayer {
	#[serde(default)]
	pub token: Option<SessionToken>,
}

impl SessionConfigLayer {
	pub fn merge(&mut self, other: SessionConfigLayer) {
		if other.token.is_some() {
			self.token = other.token;
		}
	}

	pub fn finalize(self) -> SessionConfig {
		SessionConfig { token: self.token }
	}
}
