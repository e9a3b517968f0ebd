// SPDX-FileCopyrightText: 2026 Taskbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway event handler feeding reactions and slash commands into the
//! workflow.

use std::sync::Arc;

use async_trait::async_trait;
use serenity::all::{
    CommandInteraction, Context, EditInteractionResponse, EventHandler, Interaction, Reaction,
    Ready,
};
use serenity::model::id as sid;
use taskbridge_workflow::{Orchestrator, Reply};
use tracing::{debug, error, info, warn};

use crate::commands::{Invocation, definitions};
use crate::convert::{to_reaction_event, to_user};

/// Routes gateway events to the [`Orchestrator`].
pub struct Handler {
    orchestrator: Arc<Orchestrator>,
    register_commands: bool,
}

impl Handler {
    pub fn new(orchestrator: Arc<Orchestrator>, register_commands: bool) -> Self {
        Self {
            orchestrator,
            register_commands,
        }
    }

    async fn register(&self, ctx: &Context) {
        let guild = sid::GuildId::new(self.orchestrator.layout().guild.0);
        match guild.set_commands(&ctx.http, definitions()).await {
            Ok(commands) => info!(guild = %guild, count = commands.len(), "registered slash commands"),
            Err(e) => error!(guild = %guild, error = %e, "failed to register slash commands"),
        }
    }

    async fn handle_command(&self, ctx: &Context, command: &CommandInteraction) {
        // Workflow commands can outlast the three-second interaction window.
        if let Err(e) = command.defer_ephemeral(&ctx.http).await {
            warn!(command = %command.data.name, error = %e, "failed to defer interaction");
            return;
        }

        let invocation = Invocation::from_interaction(command);
        let reply = match invocation.to_command() {
            Some(parsed) => {
                let actor = to_user(&command.user);
                self.orchestrator.dispatch_command(&actor, parsed).await
            }
            None => {
                debug!(command = %invocation.name, "unknown command");
                Reply::failure(format!("Unknown command /{}", invocation.name))
            }
        };

        if let Err(e) = command
            .edit_response(&ctx.http, EditInteractionResponse::new().content(reply.to_string()))
            .await
        {
            warn!(command = %invocation.name, error = %e, "failed to send command reply");
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(user = %ready.user.name, guilds = ready.guilds.len(), "discord gateway ready");
        if self.register_commands {
            self.register(&ctx).await;
        }
    }

    async fn reaction_add(&self, _ctx: Context, reaction: Reaction) {
        let Some(event) = to_reaction_event(&reaction) else {
            return;
        };
        if let Some(reply) = self.orchestrator.handle_reaction(&event).await {
            debug!(
                message = %event.message_id,
                user = %event.user_id,
                success = reply.is_success(),
                "reaction handled"
            );
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Command(command) = interaction {
            self.handle_command(&ctx, &command).await;
        }
    }
}
