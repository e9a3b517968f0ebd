// SPDX-FileCopyrightText: 2026 Taskbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for taskbridge integration tests.
//!
//! Provides an in-memory Discord guild so workflow tests run fast and
//! deterministically without a gateway connection.
//!
//! # Components
//!
//! - [`MockDiscord`] - Mock guild implementing `DiscordApi`, with call capture
//!   and failure injection

pub mod mock_discord;

pub use mock_discord::{Call, MockDiscord, Op};
