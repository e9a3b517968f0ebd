// SPDX-FileCopyrightText: 2026 Taskbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capability traits the workflow consumes.
//!
//! Discord is consumed as an opaque async API through [`DiscordApi`]; the
//! serenity-backed adapter and the in-memory test double both implement it.

pub mod discord;

pub use discord::DiscordApi;
