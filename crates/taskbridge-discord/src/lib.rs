// SPDX-FileCopyrightText: 2026 Taskbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Discord adapter for taskbridge.
//!
//! Implements [`DiscordApi`](taskbridge_core::traits::DiscordApi) on top of
//! serenity's REST client and provides the gateway [`Handler`] that turns
//! reactions and slash commands into workflow calls.

pub mod adapter;
pub mod commands;
pub mod convert;
pub mod handler;

use serenity::all::GatewayIntents;

pub use adapter::SerenityDiscord;
pub use commands::{Invocation, definitions};
pub use handler::Handler;

/// Gateway intents the bot needs: guild structure and message reactions.
pub fn intents() -> GatewayIntents {
    GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGE_REACTIONS
}
