// SPDX-FileCopyrightText: 2026 Taskbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the taskbridge bot.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level taskbridge configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values; the Discord ids
/// are only required when the bot actually serves (see
/// [`validate_for_serve`](crate::validation::validate_for_serve)).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TaskbridgeConfig {
    /// Process-level settings.
    #[serde(default)]
    pub bot: BotConfig,

    /// Discord connection and channel layout.
    #[serde(default)]
    pub discord: DiscordConfig,

    /// Automation backend (n8n) settings.
    #[serde(default)]
    pub webhook: WebhookConfig,

    /// Workflow timing and bookkeeping settings.
    #[serde(default)]
    pub workflow: WorkflowConfig,
}

/// Process-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Name used in log lines and the startup banner.
    #[serde(default = "default_bot_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_bot_name() -> String {
    "taskbridge".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Discord connection settings and the guild's channel layout.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DiscordConfig {
    /// Discord bot token. `None` means the bot cannot serve.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// The guild the bot operates in.
    #[serde(default)]
    pub guild_id: Option<u64>,

    /// Forums holding unassigned tickets; a checkmark there claims the ticket.
    #[serde(default)]
    pub unassigned_forum_ids: Vec<u64>,

    /// Shared forum where tickets wait for PM approval.
    #[serde(default)]
    pub review_forum_id: Option<u64>,

    /// Category holding each user's private working forum.
    #[serde(default)]
    pub working_category_id: Option<u64>,

    /// Category holding the per-assignee completed-tasks forums.
    #[serde(default)]
    pub completed_category_id: Option<u64>,

    /// Role allowed to approve and deny reviews.
    #[serde(default)]
    pub pm_role_id: Option<u64>,

    /// Register the slash commands on the guild when the gateway is ready.
    #[serde(default = "default_register_commands")]
    pub register_commands: bool,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            guild_id: None,
            unassigned_forum_ids: Vec::new(),
            review_forum_id: None,
            working_category_id: None,
            completed_category_id: None,
            pm_role_id: None,
            register_commands: default_register_commands(),
        }
    }
}

fn default_register_commands() -> bool {
    true
}

/// Automation backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WebhookConfig {
    /// Base URL of the n8n instance; endpoint paths are appended to it.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Total attempts per call, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff base: attempt `n` waits `base * 2^(n-1)` before retrying.
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Jira browse URL prefix (`https://acme.atlassian.net/browse/`) used for
    /// "view in Jira" links. `None` omits the links.
    #[serde(default)]
    pub jira_browse_url: Option<String>,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            jira_browse_url: None,
        }
    }
}

impl WebhookConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}

fn default_base_url() -> String {
    "http://localhost:5678".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    1000
}

/// Workflow timing and in-memory bookkeeping.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WorkflowConfig {
    /// Processing-lock entries older than this are stale.
    #[serde(default = "default_lock_ttl_secs")]
    pub lock_ttl_secs: u64,

    /// Maximum number of live processing-lock entries.
    #[serde(default = "default_lock_capacity")]
    pub lock_capacity: usize,

    /// Lifetime of a ticket → thread hint.
    #[serde(default = "default_hint_ttl_secs")]
    pub hint_ttl_secs: u64,

    /// Delay before short cleanups (working thread after approval).
    #[serde(default = "default_short_delay_ms")]
    pub short_delay_ms: u64,

    /// Delay before medium cleanups (source thread after a claim).
    #[serde(default = "default_medium_delay_ms")]
    pub medium_delay_ms: u64,

    /// Delay before long cleanups (review thread after approve/deny).
    #[serde(default = "default_long_delay_ms")]
    pub long_delay_ms: u64,

    /// Character budget for a posted ticket description.
    #[serde(default = "default_description_limit")]
    pub description_limit: usize,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            lock_ttl_secs: default_lock_ttl_secs(),
            lock_capacity: default_lock_capacity(),
            hint_ttl_secs: default_hint_ttl_secs(),
            short_delay_ms: default_short_delay_ms(),
            medium_delay_ms: default_medium_delay_ms(),
            long_delay_ms: default_long_delay_ms(),
            description_limit: default_description_limit(),
        }
    }
}

impl WorkflowConfig {
    pub fn lock_ttl(&self) -> Duration {
        Duration::from_secs(self.lock_ttl_secs)
    }

    pub fn hint_ttl(&self) -> Duration {
        Duration::from_secs(self.hint_ttl_secs)
    }

    pub fn short_delay(&self) -> Duration {
        Duration::from_millis(self.short_delay_ms)
    }

    pub fn medium_delay(&self) -> Duration {
        Duration::from_millis(self.medium_delay_ms)
    }

    pub fn long_delay(&self) -> Duration {
        Duration::from_millis(self.long_delay_ms)
    }
}

fn default_lock_ttl_secs() -> u64 {
    30
}

fn default_lock_capacity() -> usize {
    1024
}

fn default_hint_ttl_secs() -> u64 {
    120
}

fn default_short_delay_ms() -> u64 {
    2000
}

fn default_medium_delay_ms() -> u64 {
    2500
}

fn default_long_delay_ms() -> u64 {
    3000
}

fn default_description_limit() -> usize {
    1900
}
