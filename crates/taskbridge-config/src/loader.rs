// SPDX-FileCopyrightText: 2026 Taskbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./taskbridge.toml` > `~/.config/taskbridge/taskbridge.toml`
//! > `/etc/taskbridge/taskbridge.toml` with environment variable overrides via
//! the `TASKBRIDGE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::TaskbridgeConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/taskbridge/taskbridge.toml";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "taskbridge.toml";

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/taskbridge/taskbridge.toml` (system-wide)
/// 3. `~/.config/taskbridge/taskbridge.toml` (user XDG config)
/// 4. `./taskbridge.toml` (local directory)
/// 5. `TASKBRIDGE_*` environment variables
pub fn load_config() -> Result<TaskbridgeConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<TaskbridgeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TaskbridgeConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<TaskbridgeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TaskbridgeConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for XDG config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(TaskbridgeConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("taskbridge/taskbridge.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")`: `TASKBRIDGE_DISCORD_BOT_TOKEN`
/// must map to `discord.bot_token`, not `discord.bot.token`.
fn env_provider() -> Env {
    Env::prefixed("TASKBRIDGE_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        let mapped = map_env_key(key.as_str());
        mapped.into()
    })
}

/// Maps a lowercased, prefix-stripped env key onto its dotted config path.
fn map_env_key(key: &str) -> String {
    for section in ["bot", "discord", "webhook", "workflow"] {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(map_env_key("discord_bot_token"), "discord.bot_token");
        assert_eq!(map_env_key("webhook_base_url"), "webhook.base_url");
        assert_eq!(map_env_key("workflow_lock_ttl_secs"), "workflow.lock_ttl_secs");
        assert_eq!(map_env_key("bot_log_level"), "bot.log_level");
        assert_eq!(map_env_key("unknown"), "unknown");
    }

    #[test]
    fn env_override_applies_to_nested_key() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("TASKBRIDGE_DISCORD_BOT_TOKEN", "secret-token");
            jail.set_env("TASKBRIDGE_WEBHOOK_MAX_ATTEMPTS", "5");
            let config: TaskbridgeConfig = Figment::new()
                .merge(Serialized::defaults(TaskbridgeConfig::default()))
                .merge(env_provider())
                .extract()?;
            assert_eq!(config.discord.bot_token.as_deref(), Some("secret-token"));
            assert_eq!(config.webhook.max_attempts, 5);
            Ok(())
        });
    }
}
