// SPDX-FileCopyrightText: 2026 Taskbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the taskbridge bot.
//!
//! This crate provides the error type, the Jira ticket domain types, the
//! platform-neutral Discord models, and the [`DiscordApi`] capability trait
//! shared by every other crate in the workspace.

pub mod error;
pub mod ticket;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::TaskbridgeError;
pub use ticket::{validate_email, TicketKey, TicketStatus};
pub use traits::DiscordApi;
pub use types::{ChannelId, GuildId, MessageId, RoleId, UserId};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taskbridge_error_has_all_variants() {
        let _config = TaskbridgeError::Config("test".into());
        let _validation = TaskbridgeError::Validation("test".into());
        let _permission = TaskbridgeError::Permission("test".into());
        let _webhook = TaskbridgeError::webhook("test");
        let _discord = TaskbridgeError::Discord {
            message: "test".into(),
            source: Some(Box::new(std::io::Error::other("test"))),
        };
        let _busy = TaskbridgeError::Busy {
            key: "KAN-1".into(),
            action: "approve".into(),
        };
        let _internal = TaskbridgeError::Internal("test".into());
    }

    #[test]
    fn error_messages_carry_backend_text() {
        let err = TaskbridgeError::webhook("Ticket not found");
        assert_eq!(err.to_string(), "Ticket not found");

        let err = TaskbridgeError::discord("Missing Access");
        assert_eq!(err.to_string(), "discord error: Missing Access");

        let err = TaskbridgeError::Busy {
            key: "KAN-1".into(),
            action: "approve".into(),
        };
        assert_eq!(err.to_string(), "KAN-1 is already being processed (approve)");
    }

    #[test]
    fn discord_api_is_object_safe() {
        fn _assert_object_safe(_api: &dyn DiscordApi) {}
    }
}
