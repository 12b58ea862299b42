// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::Deserialize;

pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 25 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadsConfig {
	pub max_bytes: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UploadsConfigLayer {
	#[serde(default)]
	pub max_bytes: Option<u64>,
}

impl UploadsConfigLayer {
	pub fn merge(&mut self, other: UploadsConfigLayer) {
		if other.max_bytes.is_some() {
			self.max_bytes = other.max_bytes;
		}
	}

	pub fn finalize(self) -> UploadsConfig {
		UploadsConfig {
			max_bytes: self.max_bytes.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
		}
	}
}
