// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections. Each has a `*ConfigLayer` (partial, mergeable) and
//! a resolved `*Config`.

mod api;
mod logging;
mod push;
mod session;
mod uploads;

pub use api::{ApiConfig, ApiConfigLayer, DEFAULT_BASE_URL};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
pub use push::{PushConfig, PushConfigLayer};
pub use session::{SessionConfig, SessionConfigLayer};
pub use uploads::{UploadsConfig, UploadsConfigLayer, DEFAULT_MAX_UPLOAD_BYTES};
