// SPDX-FileCopyrightText: 2026 Taskbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket workflow orchestration for the taskbridge bot.
//!
//! The [`Orchestrator`] is the central coordinator that:
//! - Classifies reactions and slash commands into workflow transitions
//! - Mutates Jira through the automation backend
//! - Locates the Discord threads that currently represent each ticket
//! - Reconciles Discord with best-effort, delayed cleanup

pub mod commands;
pub mod format;
pub mod hints;
pub mod lifecycle;
pub mod lock;
pub mod naming;
pub mod orchestrator;
pub mod provisioner;
pub mod resolver;
pub mod routing;
pub mod shutdown;

pub use commands::{Command, TaskAction};
pub use format::{Reply, ReplyKind};
pub use lifecycle::{CleanupAction, CleanupJob, CleanupOutcome, ThreadLifecycle};
pub use lock::ProcessingLock;
pub use orchestrator::{Delays, Layout, Orchestrator};
pub use resolver::{Resolution, ResolutionTier, ThreadResolver};
pub use routing::{EmojiClass, ParentKind, Transition, classify};
