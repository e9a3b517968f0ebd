// SPDX-FileCopyrightText: 2026 Taskbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! [`validate_config`] checks semantic constraints that hold for any
//! configuration. [`validate_for_serve`] additionally requires everything the
//! bot needs to connect to Discord and route events.

use crate::diagnostic::ConfigError;
use crate::model::TaskbridgeConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Discord rejects message content longer than this.
const DISCORD_MESSAGE_LIMIT: usize = 2000;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &TaskbridgeConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.bot.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "bot.log_level `{}` must be one of: {}",
                config.bot.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    let base_url = config.webhook.base_url.trim();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        errors.push(ConfigError::Validation {
            message: format!("webhook.base_url `{base_url}` must start with http:// or https://"),
        });
    }

    if config.webhook.max_attempts == 0 || config.webhook.max_attempts > 10 {
        errors.push(ConfigError::Validation {
            message: format!(
                "webhook.max_attempts must be between 1 and 10, got {}",
                config.webhook.max_attempts
            ),
        });
    }

    if config.webhook.timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "webhook.timeout_secs must be at least 1".to_string(),
        });
    }

    if let Some(ref browse) = config.webhook.jira_browse_url
        && !(browse.starts_with("http://") || browse.starts_with("https://"))
    {
        errors.push(ConfigError::Validation {
            message: format!(
                "webhook.jira_browse_url `{browse}` must start with http:// or https://"
            ),
        });
    }

    if config.workflow.lock_ttl_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "workflow.lock_ttl_secs must be at least 1".to_string(),
        });
    }

    if config.workflow.lock_capacity == 0 {
        errors.push(ConfigError::Validation {
            message: "workflow.lock_capacity must be at least 1".to_string(),
        });
    }

    if config.workflow.description_limit == 0
        || config.workflow.description_limit > DISCORD_MESSAGE_LIMIT
    {
        errors.push(ConfigError::Validation {
            message: format!(
                "workflow.description_limit must be between 1 and {DISCORD_MESSAGE_LIMIT}, got {}",
                config.workflow.description_limit
            ),
        });
    }

    let discord = &config.discord;
    if let Some(review) = discord.review_forum_id
        && discord.unassigned_forum_ids.contains(&review)
    {
        errors.push(ConfigError::Validation {
            message: format!(
                "discord.review_forum_id {review} is also listed in discord.unassigned_forum_ids"
            ),
        });
    }

    if discord.working_category_id.is_some()
        && discord.working_category_id == discord.completed_category_id
    {
        errors.push(ConfigError::Validation {
            message: "discord.working_category_id and discord.completed_category_id must differ"
                .to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate that a configuration has everything `taskbridge serve` needs.
pub fn validate_for_serve(config: &TaskbridgeConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = match validate_config(config) {
        Ok(()) => Vec::new(),
        Err(errors) => errors,
    };

    let discord = &config.discord;
    match discord.bot_token.as_deref() {
        Some(token) if !token.trim().is_empty() => {}
        Some(_) => errors.push(ConfigError::Validation {
            message: "discord.bot_token cannot be empty".to_string(),
        }),
        None => errors.push(ConfigError::MissingKey {
            key: "discord.bot_token".to_string(),
        }),
    }

    let required_ids = [
        ("discord.guild_id", discord.guild_id),
        ("discord.review_forum_id", discord.review_forum_id),
        ("discord.working_category_id", discord.working_category_id),
        ("discord.completed_category_id", discord.completed_category_id),
        ("discord.pm_role_id", discord.pm_role_id),
    ];
    for (key, value) in required_ids {
        match value {
            None => errors.push(ConfigError::MissingKey {
                key: key.to_string(),
            }),
            Some(0) => errors.push(ConfigError::Validation {
                message: format!("{key} must be a non-zero Discord id"),
            }),
            Some(_) => {}
        }
    }

    if discord.unassigned_forum_ids.contains(&0) {
        errors.push(ConfigError::Validation {
            message: "discord.unassigned_forum_ids must not contain 0".to_string(),
        });
    }

    if discord.unassigned_forum_ids.is_empty() {
        errors.push(ConfigError::Validation {
            message: "discord.unassigned_forum_ids must list at least one forum".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn serve_ready() -> TaskbridgeConfig {
        let mut config = TaskbridgeConfig::default();
        config.discord.bot_token = Some("token".into());
        config.discord.guild_id = Some(1);
        config.discord.unassigned_forum_ids = vec![10];
        config.discord.review_forum_id = Some(11);
        config.discord.working_category_id = Some(20);
        config.discord.completed_category_id = Some(21);
        config.discord.pm_role_id = Some(30);
        config
    }

    fn has_message(errors: &[ConfigError], needle: &str) -> bool {
        errors.iter().any(|e| match e {
            ConfigError::Validation { message } => message.contains(needle),
            ConfigError::MissingKey { key } => key.contains(needle),
            _ => false,
        })
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&TaskbridgeConfig::default()).is_ok());
    }

    #[test]
    fn default_config_is_not_ready_to_serve() {
        let errors = validate_for_serve(&TaskbridgeConfig::default()).unwrap_err();
        assert!(has_message(&errors, "discord.bot_token"));
        assert!(has_message(&errors, "discord.pm_role_id"));
        assert!(has_message(&errors, "unassigned_forum_ids"));
    }

    #[test]
    fn complete_config_is_ready_to_serve() {
        assert!(validate_for_serve(&serve_ready()).is_ok());
    }

    #[test]
    fn bad_base_url_fails_validation() {
        let mut config = TaskbridgeConfig::default();
        config.webhook.base_url = "localhost:5678".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "webhook.base_url"));
    }

    #[test]
    fn zero_attempts_fails_validation() {
        let mut config = TaskbridgeConfig::default();
        config.webhook.max_attempts = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "max_attempts"));
    }

    #[test]
    fn oversized_description_limit_fails_validation() {
        let mut config = TaskbridgeConfig::default();
        config.workflow.description_limit = 4000;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "description_limit"));
    }

    #[test]
    fn zero_ids_are_rejected() {
        let mut config = serve_ready();
        config.discord.pm_role_id = Some(0);
        config.discord.unassigned_forum_ids = vec![10, 0];
        let errors = validate_for_serve(&config).unwrap_err();
        assert!(has_message(&errors, "discord.pm_role_id must be a non-zero"));
        assert!(has_message(&errors, "must not contain 0"));
    }

    #[test]
    fn review_forum_cannot_double_as_unassigned() {
        let mut config = serve_ready();
        config.discord.unassigned_forum_ids = vec![10, 11];
        let errors = validate_for_serve(&config).unwrap_err();
        assert!(has_message(&errors, "review_forum_id"));
    }

    #[test]
    fn shared_category_fails_validation() {
        let mut config = serve_ready();
        config.discord.completed_category_id = Some(20);
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "completed_category_id"));
    }

    #[test]
    fn unknown_log_level_fails_validation() {
        let mut config = TaskbridgeConfig::default();
        config.bot.log_level = "verbose".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "bot.log_level"));
    }

    #[test]
    fn collects_every_error() {
        let mut config = TaskbridgeConfig::default();
        config.webhook.max_attempts = 0;
        config.webhook.timeout_secs = 0;
        config.workflow.lock_capacity = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
