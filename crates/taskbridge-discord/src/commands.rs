// SPDX-FileCopyrightText: 2026 Taskbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slash command definitions and interaction parsing.

use serenity::all::{
    CommandInteraction, CommandOptionType, CreateCommand, CreateCommandOption, ResolvedOption,
    ResolvedValue,
};
use strum::IntoEnumIterator;
use taskbridge_core::TicketStatus;
use taskbridge_workflow::{Command, TaskAction};

/// The guild commands the bot registers on startup.
pub fn definitions() -> Vec<CreateCommand> {
    let ticket = || {
        CreateCommandOption::new(CommandOptionType::String, "ticket", "Jira ticket key, e.g. KAN-42")
            .required(true)
    };

    let mut status = CreateCommandOption::new(
        CommandOptionType::String,
        "status",
        "Only show tasks in this status",
    )
    .required(false);
    for s in TicketStatus::iter() {
        status = status.add_string_choice(s.to_string(), s.to_string());
    }

    vec![
        CreateCommand::new("register")
            .description("Link your Discord account to your Jira email")
            .add_option(
                CreateCommandOption::new(CommandOptionType::String, "email", "Your Jira email")
                    .required(true),
            ),
        CreateCommand::new("unregister").description("Remove your Jira email link"),
        CreateCommand::new("whoami").description("Show which Jira email you are linked to"),
        CreateCommand::new("tasks")
            .description("List the Jira tickets assigned to you")
            .add_option(status),
        CreateCommand::new("task")
            .description("Move one of your tickets through the workflow")
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::SubCommand,
                    "review",
                    "Submit your ticket for PM review",
                )
                .add_sub_option(ticket()),
            )
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::SubCommand,
                    "done",
                    "Approve a ticket in review (PM only)",
                )
                .add_sub_option(ticket()),
            )
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::SubCommand,
                    "deny",
                    "Send a ticket back to In Progress (PM only)",
                )
                .add_sub_option(ticket())
                .add_sub_option(
                    CreateCommandOption::new(
                        CommandOptionType::String,
                        "reason",
                        "Why the ticket was sent back",
                    )
                    .required(false),
                ),
            )
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::SubCommand,
                    "quit",
                    "Give a ticket back to the unassigned pool",
                )
                .add_sub_option(ticket()),
            ),
    ]
}

/// A command invocation flattened to plain strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    pub name: String,
    pub subcommand: Option<String>,
    pub args: Vec<(String, String)>,
}

impl Invocation {
    pub fn from_interaction(command: &CommandInteraction) -> Self {
        let mut invocation = Self {
            name: command.data.name.clone(),
            ..Self::default()
        };
        let options = command.data.options();
        for option in &options {
            match &option.value {
                ResolvedValue::SubCommand(inner) => {
                    invocation.subcommand = Some(option.name.to_string());
                    invocation.collect(inner);
                }
                _ => invocation.collect(std::slice::from_ref(option)),
            }
        }
        invocation
    }

    fn collect(&mut self, options: &[ResolvedOption<'_>]) {
        for option in options {
            if let ResolvedValue::String(value) = &option.value {
                self.args.push((option.name.to_string(), value.to_string()));
            }
        }
    }

    fn arg(&self, name: &str) -> Option<String> {
        self.args
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    }

    /// `None` for commands the bot does not know.
    pub fn to_command(&self) -> Option<Command> {
        match self.name.as_str() {
            "register" => Some(Command::Register {
                email: self.arg("email").unwrap_or_default(),
            }),
            "unregister" => Some(Command::Unregister),
            "whoami" => Some(Command::WhoAmI),
            "tasks" => Some(Command::Tasks {
                status: self.arg("status"),
            }),
            "task" => {
                let action: TaskAction = self.subcommand.as_deref()?.parse().ok()?;
                Some(Command::Task {
                    action,
                    ticket: self.arg("ticket").unwrap_or_default(),
                    reason: self.arg("reason"),
                })
            }
            _ => None,
        }
    }
}
