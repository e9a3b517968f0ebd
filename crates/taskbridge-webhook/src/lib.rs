// SPDX-FileCopyrightText: 2026 Taskbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client for the n8n automation layer that mediates every Jira mutation.
//!
//! [`WebhookClient::execute`] is the retrying primitive; the typed endpoint
//! methods in [`endpoints`] sit on top of it and turn a `success: false`
//! envelope into [`TaskbridgeError::Webhook`](taskbridge_core::TaskbridgeError).

pub mod client;
pub mod endpoints;
pub mod types;

pub use client::{backoff_delay, RequestOptions, WebhookClient, WebhookResponse};
pub use types::{
    AssignTicket, AssignedTicket, Assignee, MoveTicket, MovedTicket, Registration, TaskSummary,
};
