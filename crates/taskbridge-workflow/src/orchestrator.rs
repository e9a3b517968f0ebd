// SPDX-FileCopyrightText: 2026 Taskbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The ticket workflow state machine.
//!
//! Each transition follows the same shape: gate, lock, mutate Jira through
//! the backend, then reconcile Discord. Once the backend call succeeds the
//! transition counts as done; Discord reconciliation is best effort and only
//! shows up in logs.

use std::sync::Arc;
use std::time::Duration;

use taskbridge_config::TaskbridgeConfig;
use taskbridge_config::model::WorkflowConfig;
use taskbridge_core::types::{ChannelInfo, DiscordUser, OutgoingMessage, ReactionEvent, Thread};
use taskbridge_core::{
    ChannelId, DiscordApi, GuildId, RoleId, TaskbridgeError, TicketKey, TicketStatus, UserId,
};
use taskbridge_webhook::{Assignee, AssignTicket, MoveTicket, WebhookClient};
use tracing::{debug, error, info, warn};

use crate::format::Reply;
use crate::hints::ThreadHints;
use crate::lifecycle::ThreadLifecycle;
use crate::lock::{LockGuard, ProcessingLock};
use crate::naming::{forum_name, title_from_thread_name};
use crate::provisioner::{CompletedPost, ForumProvisioner, ReviewPost, TicketPost};
use crate::resolver::{Identity, Resolution, ThreadResolver};
use crate::routing::{EmojiClass, ParentKind, QUIT_ACTION, Transition, classify, extract_ticket_key};

/// Where each workflow stage lives in the guild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub guild: GuildId,
    pub unassigned_forums: Vec<ChannelId>,
    pub review_forum: ChannelId,
    pub working_category: ChannelId,
    pub completed_category: ChannelId,
    pub pm_role: RoleId,
    pub jira_browse_url: Option<String>,
}

impl Layout {
    /// Reads the layout from a configuration that passed serve validation.
    pub fn from_config(config: &TaskbridgeConfig) -> Result<Self, TaskbridgeError> {
        let discord = &config.discord;
        let required = |key: &str, value: Option<u64>| {
            value.ok_or_else(|| TaskbridgeError::Config(format!("discord.{key} is required")))
        };
        Ok(Self {
            guild: GuildId(required("guild_id", discord.guild_id)?),
            unassigned_forums: discord.unassigned_forum_ids.iter().copied().map(ChannelId).collect(),
            review_forum: ChannelId(required("review_forum_id", discord.review_forum_id)?),
            working_category: ChannelId(required("working_category_id", discord.working_category_id)?),
            completed_category: ChannelId(required("completed_category_id", discord.completed_category_id)?),
            pm_role: RoleId(required("pm_role_id", discord.pm_role_id)?),
            jira_browse_url: config.webhook.jira_browse_url.clone(),
        })
    }
}

/// Cleanup delays, shortest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delays {
    pub short: Duration,
    pub medium: Duration,
    pub long: Duration,
}

impl From<&WorkflowConfig> for Delays {
    fn from(config: &WorkflowConfig) -> Self {
        Self {
            short: config.short_delay(),
            medium: config.medium_delay(),
            long: config.long_delay(),
        }
    }
}

pub struct Orchestrator {
    pub(crate) discord: Arc<dyn DiscordApi>,
    pub(crate) webhook: WebhookClient,
    pub(crate) layout: Layout,
    lock: ProcessingLock,
    hints: Arc<ThreadHints>,
    resolver: ThreadResolver,
    lifecycle: ThreadLifecycle,
    provisioner: ForumProvisioner,
    delays: Delays,
}

impl Orchestrator {
    pub fn new(
        discord: Arc<dyn DiscordApi>,
        webhook: WebhookClient,
        layout: Layout,
        config: &WorkflowConfig,
    ) -> Self {
        let hints = Arc::new(ThreadHints::new(config.hint_ttl()));
        let guild = layout.guild;
        Self {
            lock: ProcessingLock::new(config.lock_ttl(), config.lock_capacity),
            resolver: ThreadResolver::new(Arc::clone(&discord), guild, Arc::clone(&hints)),
            lifecycle: ThreadLifecycle::new(Arc::clone(&discord), guild, Arc::clone(&hints)),
            hints,
            provisioner: ForumProvisioner::new(
                Arc::clone(&discord),
                guild,
                layout.jira_browse_url.clone(),
                config.description_limit,
            ),
            delays: Delays::from(config),
            discord,
            webhook,
            layout,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn lifecycle(&self) -> &ThreadLifecycle {
        &self.lifecycle
    }

    pub fn lock(&self) -> &ProcessingLock {
        &self.lock
    }

    /// Routes a reaction. Returns the reply posted in the thread, or `None`
    /// when the reaction is not a workflow trigger.
    pub async fn handle_reaction(&self, event: &ReactionEvent) -> Option<Reply> {
        if event.user_id == self.discord.bot_user_id() {
            return None;
        }
        if event.guild_id.is_some_and(|g| g != self.layout.guild) {
            return None;
        }
        let emoji = EmojiClass::from_emoji(&event.emoji)?;

        let actor = match self.discord.user(event.user_id).await {
            Ok(user) => user,
            Err(e) => {
                error!(user = %event.user_id, error = %e, "could not fetch reacting user");
                return None;
            }
        };
        if actor.bot {
            return None;
        }

        let thread = match self.discord.channel(event.channel_id).await {
            Ok(ChannelInfo::Thread(thread)) => thread,
            Ok(_) => return None,
            Err(e) => {
                error!(channel = %event.channel_id, error = %e, "could not fetch reaction channel");
                return None;
            }
        };
        let message = match self.discord.message(thread.id, event.message_id).await {
            Ok(message) => message,
            Err(e) => {
                error!(thread = %thread.id, message = %event.message_id, error = %e, "could not fetch reacted message");
                return None;
            }
        };
        let Some(key) = extract_ticket_key(&thread.name, &message.embeds) else {
            debug!(thread = %thread.id, "reaction on message without a ticket key");
            return None;
        };

        let parent = self.parent_kind(&thread, &actor).await;
        let Some(transition) = classify(emoji, parent) else {
            debug!(ticket = %key, %emoji, %parent, "reaction is not a transition");
            return None;
        };
        info!(ticket = %key, %transition, actor = %actor.id, "routing reaction");

        if transition == Transition::SubmitReview
            && let Err(e) = self
                .discord
                .remove_reaction(thread.id, event.message_id, actor.id, &event.emoji)
                .await
        {
            warn!(ticket = %key, thread = %thread.id, error = %e, "could not remove submit reaction");
        }

        let reply = match transition {
            Transition::Claim => self.claim(&actor, &thread, &key).await,
            Transition::Approve => self.approve(&actor, &key, Some(&thread)).await,
            Transition::Deny => self.deny(&actor, &key, None, Some(&thread)).await,
            Transition::SubmitReview => self.submit_review(&actor, &key, Some(&thread)).await,
        };

        let notice = OutgoingMessage::text(format!("{} {reply}", actor.id.mention()));
        if let Err(e) = self.discord.send_message(thread.id, notice).await {
            warn!(ticket = %key, thread = %thread.id, error = %e, "could not post reply");
        }
        Some(reply)
    }

    async fn parent_kind(&self, thread: &Thread, actor: &DiscordUser) -> ParentKind {
        if self.layout.unassigned_forums.contains(&thread.parent_id) {
            return ParentKind::Unassigned;
        }
        if thread.parent_id == self.layout.review_forum {
            return ParentKind::Review;
        }
        match self.discord.channel(thread.parent_id).await {
            Ok(ChannelInfo::Forum(forum)) if forum.category_id == Some(self.layout.working_category) => {
                if forum.name == forum_name(&actor.username) || forum.grants_view_to(actor.id) {
                    ParentKind::OwnWorking
                } else {
                    ParentKind::OtherWorking
                }
            }
            Ok(_) => ParentKind::Unknown,
            Err(e) => {
                warn!(forum = %thread.parent_id, error = %e, "could not fetch thread parent");
                ParentKind::Unknown
            }
        }
    }

    fn acquire(&self, key: &TicketKey, action: &'static str) -> Result<LockGuard, Reply> {
        self.lock
            .try_acquire(key, action)
            .map_err(|e| Reply::from_error(action, &e))
    }

    /// Fails unless `actor` holds the PM role. Runs before any backend call.
    async fn require_pm(&self, actor: &DiscordUser, verb: &str) -> Result<(), TaskbridgeError> {
        let roles = self
            .discord
            .member_roles(self.layout.guild, actor.id)
            .await
            .map_err(|e| {
                warn!(actor = %actor.id, error = %e, "could not fetch member roles");
                TaskbridgeError::Permission(format!("Could not verify your roles, so you cannot {verb} tickets"))
            })?;
        if roles.contains(&self.layout.pm_role) {
            Ok(())
        } else {
            Err(TaskbridgeError::Permission(format!(
                "Only members with the {} role can {verb} tickets",
                self.layout.pm_role.mention()
            )))
        }
    }

    /// ✅ in an unassigned forum: assign the ticket and move it to the
    /// actor's working forum.
    pub async fn claim(&self, actor: &DiscordUser, source: &Thread, key: &TicketKey) -> Reply {
        let _guard = match self.acquire(key, Transition::Claim.lock_action()) {
            Ok(guard) => guard,
            Err(reply) => return reply,
        };

        let request = AssignTicket::claim(actor.id, &actor.username, &actor.tag(), key, source.id);
        let assigned = match self.webhook.assign_ticket(&request).await {
            Ok(assigned) => assigned,
            Err(e) => {
                warn!(ticket = %key, actor = %actor.id, error = %e, "claim rejected");
                return Reply::from_error(&format!("Could not claim {key}"), &e);
            }
        };
        info!(ticket = %key, actor = %actor.id, "ticket claimed");

        let title = assigned
            .summary
            .clone()
            .or_else(|| title_from_thread_name(key, &source.name).map(str::to_string))
            .unwrap_or_default();

        let forum = match self
            .provisioner
            .find_or_create_user_forum(actor, self.layout.working_category)
            .await
        {
            Ok(forum) => forum,
            Err(e) => {
                warn!(ticket = %key, actor = %actor.id, error = %e, "could not provision working forum");
                return Reply::warning(format!(
                    "{key} is assigned to you, but your working forum could not be set up: {e}"
                ));
            }
        };

        let post = TicketPost {
            key: key.clone(),
            title,
            status: TicketStatus::InProgress,
            priority: assigned.priority,
            assignee: actor.shown_name().to_string(),
            labels: assigned.labels,
            description: assigned.description,
        };
        let Some(thread) = self.provisioner.create_ticket_thread(&forum, &post).await else {
            return Reply::warning(format!(
                "{key} is assigned to you, but its thread could not be created in {}",
                forum.id.mention()
            ));
        };

        self.hints.remember(key, &forum, &thread);
        self.lifecycle
            .delete_with_delay(source.id, "claimed", self.delays.medium, true);
        Reply::success(format!(
            "{key} is now assigned to {}. Continue in {}",
            actor.shown_name(),
            thread.id.mention()
        ))
    }

    /// Approves a ticket under review and files it as completed.
    pub async fn approve(&self, actor: &DiscordUser, key: &TicketKey, review_thread: Option<&Thread>) -> Reply {
        if let Err(e) = self.require_pm(actor, "approve").await {
            return Reply::from_error("approve", &e);
        }
        let _guard = match self.acquire(key, Transition::Approve.lock_action()) {
            Ok(guard) => guard,
            Err(reply) => return reply,
        };

        let request = MoveTicket::approve(key, &actor.username, actor.id);
        let moved = match self.webhook.move_ticket(&request).await {
            Ok(moved) => moved,
            Err(e) => {
                warn!(ticket = %key, actor = %actor.id, error = %e, "approval rejected");
                return Reply::from_error(&format!("Could not approve {key}"), &e);
            }
        };
        info!(ticket = %key, approver = %actor.id, "ticket approved");

        let assignee = self.assignee_identity(moved.assignee.as_ref()).await;
        let resolution = self
            .resolver
            .resolve(self.layout.working_category, assignee.identity(), key)
            .await;
        match &resolution.thread {
            Some(thread) => {
                self.lifecycle
                    .delete_with_delay(thread.id, "approved", self.delays.short, true);
            }
            None => debug!(ticket = %key, "no working thread to clean up after approval"),
        }

        let title = moved
            .summary
            .clone()
            .or_else(|| {
                review_thread
                    .or(resolution.thread.as_ref())
                    .and_then(|t| title_from_thread_name(key, &t.name))
                    .map(str::to_string)
            })
            .unwrap_or_default();
        let assignee_name = moved
            .assignee
            .as_ref()
            .and_then(Assignee::label)
            .or(assignee.username.as_deref())
            .unwrap_or("unassigned")
            .to_string();
        let completed = CompletedPost {
            key: key.clone(),
            title,
            assignee: assignee_name,
            approver: actor.id,
        };
        self.provisioner
            .create_completed_thread(self.layout.completed_category, &completed)
            .await;

        self.retire_review_thread(key, review_thread, "approved").await;
        Reply::success(format!("{key} approved and moved to {}", TicketStatus::Done))
    }

    /// Sends a ticket under review back to its assignee.
    pub async fn deny(
        &self,
        actor: &DiscordUser,
        key: &TicketKey,
        reason: Option<&str>,
        review_thread: Option<&Thread>,
    ) -> Reply {
        if let Err(e) = self.require_pm(actor, "deny").await {
            return Reply::from_error("deny", &e);
        }
        let _guard = match self.acquire(key, Transition::Deny.lock_action()) {
            Ok(guard) => guard,
            Err(reply) => return reply,
        };

        let request = MoveTicket::deny(key, &actor.username, actor.id, reason);
        let moved = match self.webhook.move_ticket(&request).await {
            Ok(moved) => moved,
            Err(e) => {
                warn!(ticket = %key, actor = %actor.id, error = %e, "denial rejected");
                return Reply::from_error(&format!("Could not deny {key}"), &e);
            }
        };
        info!(ticket = %key, denier = %actor.id, "ticket denied");

        let assignee = self.assignee_identity(moved.assignee.as_ref()).await;
        let resolution = self
            .resolver
            .resolve(self.layout.working_category, assignee.identity(), key)
            .await;
        match &resolution.thread {
            Some(thread) => {
                if thread.archived {
                    self.lifecycle.unarchive(thread.id).await;
                }
                let who = match assignee.user_id {
                    Some(id) => id.mention(),
                    None => moved
                        .assignee
                        .as_ref()
                        .and_then(Assignee::label)
                        .unwrap_or("Assignee")
                        .to_string(),
                };
                let mut notice = format!(
                    "{who}, {key} was sent back to {} by {}.",
                    TicketStatus::InProgress,
                    actor.shown_name()
                );
                if let Some(reason) = reason {
                    notice.push_str(&format!("\nReason: {reason}"));
                }
                if let Err(e) = self
                    .discord
                    .send_message(thread.id, OutgoingMessage::text(notice))
                    .await
                {
                    warn!(ticket = %key, thread = %thread.id, error = %e, "could not post denial notice");
                }
            }
            None => debug!(ticket = %key, "no working thread to notify after denial"),
        }

        self.retire_review_thread(key, review_thread, "denied").await;
        Reply::success(format!("{key} denied and moved back to {}", TicketStatus::InProgress))
    }

    /// Moves the actor's ticket into review and opens the review thread.
    pub async fn submit_review(&self, actor: &DiscordUser, key: &TicketKey, working_thread: Option<&Thread>) -> Reply {
        let _guard = match self.acquire(key, Transition::SubmitReview.lock_action()) {
            Ok(guard) => guard,
            Err(reply) => return reply,
        };

        let request = MoveTicket::submit(key, &actor.username, actor.id);
        let moved = match self.webhook.move_ticket(&request).await {
            Ok(moved) => moved,
            Err(e) => {
                warn!(ticket = %key, actor = %actor.id, error = %e, "review submission rejected");
                return Reply::from_error(&format!("Could not submit {key} for review"), &e);
            }
        };
        info!(ticket = %key, submitter = %actor.id, "ticket submitted for review");

        let title = moved
            .summary
            .or_else(|| {
                working_thread
                    .and_then(|t| title_from_thread_name(key, &t.name))
                    .map(str::to_string)
            })
            .unwrap_or_default();
        let review = ReviewPost {
            key: key.clone(),
            title,
            submitter: actor.id,
            pm_role: Some(self.layout.pm_role),
        };
        match self
            .provisioner
            .create_review_thread(self.layout.review_forum, &review)
            .await
        {
            Some(thread) => Reply::success(format!(
                "{key} submitted for review in {}",
                thread.id.mention()
            )),
            None => Reply::warning(format!(
                "{key} is {} but the review thread could not be created",
                TicketStatus::InReview
            )),
        }
    }

    /// Hands a ticket back: unassigns it and archives the actor's thread.
    pub async fn quit(&self, actor: &DiscordUser, key: &TicketKey) -> Reply {
        let _guard = match self.acquire(key, QUIT_ACTION) {
            Ok(guard) => guard,
            Err(reply) => return reply,
        };

        if let Err(e) = self.webhook.quit_ticket(key, actor.id, &actor.username).await {
            warn!(ticket = %key, actor = %actor.id, error = %e, "quit rejected");
            return Reply::from_error(&format!("Could not quit {key}"), &e);
        }
        info!(ticket = %key, actor = %actor.id, "ticket returned");

        let resolution = self
            .resolver
            .resolve(
                self.layout.working_category,
                Identity::user(actor.id, &actor.username),
                key,
            )
            .await;
        if let Some(thread) = &resolution.thread {
            let notice = format!(
                "{} quit {key}; it is back in {}.",
                actor.shown_name(),
                TicketStatus::ToDo
            );
            if let Err(e) = self
                .discord
                .send_message(thread.id, OutgoingMessage::text(notice))
                .await
            {
                warn!(ticket = %key, thread = %thread.id, error = %e, "could not post quit notice");
            }
            self.lifecycle.archive_with_delay(thread.id, self.delays.short);
        } else {
            debug!(ticket = %key, "no working thread to archive after quit");
        }

        Reply::success(format!("You quit {key}; it is back in {}", TicketStatus::ToDo))
    }

    /// Locates the working thread of `key` in the actor's own forum.
    pub async fn own_working_thread(&self, actor: &DiscordUser, key: &TicketKey) -> Option<Thread> {
        let resolution = self
            .resolver
            .resolve(
                self.layout.working_category,
                Identity::user(actor.id, &actor.username),
                key,
            )
            .await;
        if in_own_forum(&resolution, actor) {
            resolution.thread
        } else {
            None
        }
    }

    async fn retire_review_thread(&self, key: &TicketKey, known: Option<&Thread>, reason: &str) {
        let thread = match known {
            Some(thread) => Some(thread.clone()),
            None => self.lifecycle.find_thread(self.layout.review_forum, key).await,
        };
        match thread {
            Some(thread) => {
                self.lifecycle
                    .delete_with_delay(thread.id, reason, self.delays.long, true);
            }
            None => debug!(ticket = %key, "no review thread to clean up"),
        }
    }

    async fn assignee_identity(&self, assignee: Option<&Assignee>) -> KnownUser {
        let Some(email) = assignee.and_then(|a| a.email_address.as_deref()) else {
            return KnownUser::default();
        };
        let Some(id) = self.webhook.lookup_user(email).await else {
            return KnownUser::default();
        };
        let username = match self.discord.user(id).await {
            Ok(user) => Some(user.username),
            Err(e) => {
                debug!(user = %id, error = %e, "could not fetch assignee");
                None
            }
        };
        KnownUser {
            user_id: Some(id),
            username,
        }
    }
}

fn in_own_forum(resolution: &Resolution, actor: &DiscordUser) -> bool {
    resolution
        .forum
        .as_ref()
        .is_some_and(|f| f.name == forum_name(&actor.username) || f.grants_view_to(actor.id))
}

/// Owned counterpart of [`Identity`] for users discovered mid-transition.
#[derive(Debug, Default)]
struct KnownUser {
    user_id: Option<UserId>,
    username: Option<String>,
}

impl KnownUser {
    fn identity(&self) -> Identity<'_> {
        Identity {
            user_id: self.user_id,
            username: self.username.as_deref(),
        }
    }
}
