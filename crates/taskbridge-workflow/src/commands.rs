// SPDX-FileCopyrightText: 2026 Taskbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slash commands, independent of how the gateway delivers them.

use std::collections::BTreeMap;
use std::str::FromStr;

use strum::{Display, EnumString, IntoEnumIterator};
use taskbridge_core::types::DiscordUser;
use taskbridge_core::{TaskbridgeError, TicketKey, TicketStatus, validate_email};
use taskbridge_webhook::TaskSummary;
use tracing::{info, warn};

use crate::format::Reply;
use crate::orchestrator::Orchestrator;

/// Sub-commands of `/task`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum TaskAction {
    Review,
    Done,
    Deny,
    Quit,
}

/// A parsed slash command. Arguments are kept raw and validated on dispatch
/// so every rejection produces a reply rather than a silent drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Register {
        email: String,
    },
    Unregister,
    WhoAmI,
    Tasks {
        status: Option<String>,
    },
    Task {
        action: TaskAction,
        ticket: String,
        reason: Option<String>,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Register { .. } => "register",
            Self::Unregister => "unregister",
            Self::WhoAmI => "whoami",
            Self::Tasks { .. } => "tasks",
            Self::Task { .. } => "task",
        }
    }
}

impl Orchestrator {
    /// Runs a slash command for `actor` and returns the reply to show them.
    pub async fn dispatch_command(&self, actor: &DiscordUser, command: Command) -> Reply {
        info!(actor = %actor.id, command = command.name(), "dispatching command");
        match command {
            Command::Register { email } => self.register(actor, &email).await,
            Command::Unregister => self.unregister(actor).await,
            Command::WhoAmI => self.whoami(actor).await,
            Command::Tasks { status } => self.tasks(actor, status.as_deref()).await,
            Command::Task {
                action,
                ticket,
                reason,
            } => {
                let key = match TicketKey::parse(&ticket) {
                    Ok(key) => key,
                    Err(e) => return Reply::from_error("task", &e),
                };
                match action {
                    TaskAction::Review => self.review_command(actor, &key).await,
                    TaskAction::Done => self.approve(actor, &key, None).await,
                    TaskAction::Deny => {
                        let reason = reason.as_deref().map(str::trim).filter(|r| !r.is_empty());
                        self.deny(actor, &key, reason, None).await
                    }
                    TaskAction::Quit => self.quit(actor, &key).await,
                }
            }
        }
    }

    async fn review_command(&self, actor: &DiscordUser, key: &TicketKey) -> Reply {
        match self.own_working_thread(actor, key).await {
            Some(thread) => self.submit_review(actor, key, Some(&thread)).await,
            None => Reply::failure(format!(
                "{key} is not in your working forum; only your own tickets can be submitted for review"
            )),
        }
    }

    async fn register(&self, actor: &DiscordUser, email: &str) -> Reply {
        if let Err(e) = validate_email(email) {
            return Reply::from_error("register", &e);
        }
        let email = email.trim();
        match self.webhook.register_user(actor.id, &actor.username, email).await {
            Ok(registration) => {
                let linked = registration.jira_email.unwrap_or_else(|| email.to_string());
                info!(actor = %actor.id, "user registered");
                Reply::success(format!("Linked your Discord account to {linked}"))
            }
            Err(e) => {
                warn!(actor = %actor.id, error = %e, "registration failed");
                Reply::from_error("Could not register", &e)
            }
        }
    }

    async fn unregister(&self, actor: &DiscordUser) -> Reply {
        match self.webhook.unregister_user(actor.id).await {
            Ok(_) => Reply::success("Your Jira email link was removed"),
            Err(e) => Reply::from_error("Could not unregister", &e),
        }
    }

    async fn whoami(&self, actor: &DiscordUser) -> Reply {
        match self.webhook.lookup_registration(actor.id).await {
            Ok(registration) => match registration.jira_email {
                Some(email) => {
                    let mut text = format!("{} is linked to {email}", actor.shown_name());
                    if let Some(at) = registration.registered_at {
                        text.push_str(&format!(" (since {at})"));
                    }
                    Reply::success(text)
                }
                None => Reply::warning("You are not registered. Use /register <email> first"),
            },
            Err(e) => Reply::from_error("Could not look up your registration", &e),
        }
    }

    async fn tasks(&self, actor: &DiscordUser, status: Option<&str>) -> Reply {
        let status = match status.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => match TicketStatus::from_str(raw) {
                Ok(status) => Some(status),
                Err(_) => {
                    let err = TaskbridgeError::Validation(format!(
                        "`{raw}` is not a status (expected one of: {})",
                        TicketStatus::iter().map(|s| s.to_string()).collect::<Vec<_>>().join(", ")
                    ));
                    return Reply::from_error("tasks", &err);
                }
            },
            None => None,
        };
        match self.webhook.user_tasks(actor.id, status).await {
            Ok(tasks) => Reply::success(render_tasks(&tasks, status)),
            Err(e) => Reply::from_error("Could not fetch your tasks", &e),
        }
    }
}

/// Renders a task list grouped by status, in workflow order. Statuses the
/// bot does not know are collected under "Other".
pub fn render_tasks(tasks: &[TaskSummary], filter: Option<TicketStatus>) -> String {
    if tasks.is_empty() {
        return match filter {
            Some(status) => format!("You have no tasks in {status}"),
            None => "You have no tasks".to_string(),
        };
    }

    let mut known: BTreeMap<usize, Vec<&TaskSummary>> = BTreeMap::new();
    let mut other = Vec::new();
    for task in tasks {
        match task.known_status() {
            Some(status) => known
                .entry(TicketStatus::iter().position(|s| s == status).unwrap_or(usize::MAX))
                .or_default()
                .push(task),
            None => other.push(task),
        }
    }

    let mut out = format!("Your tasks ({})", tasks.len());
    let statuses: Vec<TicketStatus> = TicketStatus::iter().collect();
    for (index, group) in known {
        let Some(status) = statuses.get(index) else {
            continue;
        };
        out.push_str(&format!("\n\n{} **{status}**", status.glyph()));
        for task in group {
            out.push_str(&format!("\n• {}: {}", task.key, task.summary));
        }
    }
    if !other.is_empty() {
        out.push_str("\n\n**Other**");
        for task in other {
            out.push_str(&format!("\n• {}: {} ({})", task.key, task.summary, task.status));
        }
    }
    out
}
