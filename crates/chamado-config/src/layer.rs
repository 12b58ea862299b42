// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::Deserialize;

use crate::sections::{
	ApiConfigLayer, LoggingConfigLayer, PushConfigLayer, SessionConfigLayer, UploadsConfigLayer,
};

/// One source's view of the configuration. Every field is optional so layers
/// can be stacked.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PortalConfigLayer {
	#[serde(default)]
	pub api: Option<ApiConfigLayer>,
	#[serde(default)]
	pub push: Option<PushConfigLayer>,
	#[serde(default)]
	pub uploads: Option<UploadsConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
	#[serde(default)]
	pub session: Option<SessionConfigLayer>,
}

impl PortalConfigLayer {
	/// Overlays `other` on top of `self`; fields set in `other` win.
	pub fn merge(&mut self, other: PortalConfigLayer) {
		merge_section(&mut self.api, other.api, ApiConfigLayer::merge);
		merge_section(&mut self.push, other.push, PushConfigLayer::merge);
		merge_section(&mut self.uploads, other.uploads, UploadsConfigLayer::merge);
		merge_section(&mut self.logging, other.logging, LoggingConfigLayer::merge);
		merge_section(&mut self.session, other.session, SessionConfigLayer::merge);
	}
}

fn merge_section<T>(base: &mut Option<T>, overlay: Option<T>, merge: impl FnOnce(&mut T, T)) {
	match (base.as_mut(), overlay) {
		(Some(base), Some(overlay)) => merge(base, overlay),
		(None, Some(overlay)) => *base = Some(overlay),
		(_, None) => {}
	}
}
