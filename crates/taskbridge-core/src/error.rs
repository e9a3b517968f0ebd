// SPDX-FileCopyrightText: 2026 Taskbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the taskbridge bot.

use thiserror::Error;

/// The primary error type used across taskbridge crates.
///
/// Variants map onto the user-facing error taxonomy: validation and
/// permission failures never reach the backend, webhook failures carry the
/// backend's own message, and Discord failures are usually logged and
/// swallowed by the caller.
#[derive(Debug, Error)]
pub enum TaskbridgeError {
    /// Configuration errors (invalid TOML, missing ids, bad URLs).
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed user input (ticket key, email), rejected before any network call.
    #[error("{0}")]
    Validation(String),

    /// The actor lacks the role or ownership an action requires.
    #[error("{0}")]
    Permission(String),

    /// The automation backend reported a failure, or every retry failed.
    #[error("{message}")]
    Webhook { message: String },

    /// Discord API errors (missing access, unknown channel, rate limiting).
    #[error("discord error: {message}")]
    Discord {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Another event already holds the processing lock for this ticket action.
    #[error("{key} is already being processed ({action})")]
    Busy { key: String, action: String },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TaskbridgeError {
    /// Builds a [`TaskbridgeError::Discord`] without an underlying source.
    pub fn discord(message: impl Into<String>) -> Self {
        Self::Discord {
            message: message.into(),
            source: None,
        }
    }

    /// Builds a [`TaskbridgeError::Webhook`] from a backend message.
    pub fn webhook(message: impl Into<String>) -> Self {
        Self::Webhook {
            message: message.into(),
        }
    }
}
