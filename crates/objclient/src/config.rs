//! Client-wide settings shared by every backend.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::watchdog::DEFAULT_STALL_TIMEOUT;

/// Tuning knobs that apply to every backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientSettings {
    /// Cancel a streaming read/write after this many seconds without progress
    #[serde(default = "default_stall_timeout_secs")]
    pub stall_timeout_secs: u64,

    /// Upper bound for a single non-streaming request (exist, info, copy,
    /// remove). Zero disables the bound; the caller's context still applies.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Maximum number of keys fetched per listing page
    #[serde(default = "default_list_page_size")]
    pub list_page_size: usize,

    /// Maximum number of deletes in flight during a batch removal
    #[serde(default = "default_delete_concurrency")]
    pub delete_concurrency: usize,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            stall_timeout_secs: default_stall_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            list_page_size: default_list_page_size(),
            delete_concurrency: default_delete_concurrency(),
        }
    }
}

impl ClientSettings {
    /// Inactivity window for the stall watchdog.
    pub fn stall_timeout(&self) -> Duration {
        Duration::from_secs(self.stall_timeout_secs.max(1))
    }

    /// Per-request bound, if enabled.
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    /// Listing page size, never zero.
    pub fn page_size(&self) -> usize {
        self.list_page_size.max(1)
    }

    /// Delete concurrency, never zero.
    pub fn delete_parallelism(&self) -> usize {
        self.delete_concurrency.max(1)
    }
}

fn default_stall_timeout_secs() -> u64 {
    DEFAULT_STALL_TIMEOUT.as_secs()
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_list_page_size() -> usize {
    1000
}

fn default_delete_concurrency() -> usize {
    10
}

/// Parse a boolean-as-string toggle with a feature-dependent default.
///
/// A feature that is on by default stays on unless the value is literally
/// `"false"`; a feature that is off by default is only turned on by the
/// literal `"true"`. Anything else (including the empty string) keeps the
/// default.
pub fn parse_bool(value: &str, default: bool) -> bool {
    if default {
        value != "false"
    } else {
        value == "true"
    }
}
