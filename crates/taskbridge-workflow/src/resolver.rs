// SPDX-FileCopyrightText: 2026 Taskbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Finding the thread that currently represents a ticket.
//!
//! Nothing maps tickets to threads durably, so every lookup rediscovers the
//! thread from Discord's channel tree. Strategies run strictly in order and
//! stop at the first that identifies a forum:
//!
//! 1. **Hint**: a fresh [`ThreadHints`] entry in the requested category.
//! 2. **Name**: the forum named `tasks-<sanitized username>`.
//! 3. **Permission**: a forum whose overwrites explicitly let the user view it.
//! 4. **Content**: every forum in the category, active threads then archived,
//!    until one holds a thread named after the ticket.
//!
//! Inside a forum found by name or permission the thread may be missing; the
//! forum is still returned and the content scan is skipped.

use std::sync::Arc;

use strum::Display;
use taskbridge_core::types::{Forum, Thread};
use taskbridge_core::{ChannelId, DiscordApi, GuildId, TaskbridgeError, TicketKey, UserId};
use tracing::{debug, warn};

use crate::hints::ThreadHints;
use crate::naming::forum_name;

/// Which strategy produced a [`Resolution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ResolutionTier {
    Hint,
    Name,
    Permission,
    Content,
}

/// Outcome of a resolution. Either part may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub forum: Option<Forum>,
    pub thread: Option<Thread>,
    pub tier: Option<ResolutionTier>,
}

impl Resolution {
    fn found(forum: &Forum, thread: Option<Thread>, tier: ResolutionTier) -> Self {
        Self {
            forum: Some(forum.clone()),
            thread,
            tier: Some(tier),
        }
    }

    /// True when the forum was identified from the user rather than by content.
    pub fn by_identity(&self) -> bool {
        matches!(self.tier, Some(ResolutionTier::Name | ResolutionTier::Permission))
    }
}

/// Who a resolution is for, when known.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity<'a> {
    pub user_id: Option<UserId>,
    pub username: Option<&'a str>,
}

impl<'a> Identity<'a> {
    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn user(user_id: UserId, username: &'a str) -> Self {
        Self {
            user_id: Some(user_id),
            username: Some(username),
        }
    }
}

/// Searches a forum for the ticket's thread: active threads first, then archived.
pub async fn search_forum(
    discord: &dyn DiscordApi,
    guild: GuildId,
    forum: ChannelId,
    key: &TicketKey,
) -> Result<Option<Thread>, TaskbridgeError> {
    let active = discord.active_threads(guild, forum).await?;
    if let Some(thread) = active.into_iter().find(|t| key.matches_thread_name(&t.name)) {
        return Ok(Some(thread));
    }
    let archived = discord.archived_threads(forum).await?;
    Ok(archived.into_iter().find(|t| key.matches_thread_name(&t.name)))
}

#[derive(Clone)]
pub struct ThreadResolver {
    discord: Arc<dyn DiscordApi>,
    guild: GuildId,
    hints: Arc<ThreadHints>,
}

impl ThreadResolver {
    pub fn new(discord: Arc<dyn DiscordApi>, guild: GuildId, hints: Arc<ThreadHints>) -> Self {
        Self {
            discord,
            guild,
            hints,
        }
    }

    /// Resolves the forum and thread for `key` inside `category`.
    ///
    /// Never fails: a forum whose threads cannot be listed is skipped, and a
    /// category that cannot be listed yields an empty resolution.
    pub async fn resolve(
        &self,
        category: ChannelId,
        identity: Identity<'_>,
        key: &TicketKey,
    ) -> Resolution {
        if let Some(hint) = self.hints.get(key)
            && hint.forum.category_id == Some(category)
        {
            debug!(ticket = %key, thread = %hint.thread.id, "resolved from hint");
            return Resolution::found(&hint.forum, Some(hint.thread), ResolutionTier::Hint);
        }

        let forums = match self.discord.category_forums(self.guild, category).await {
            Ok(forums) => forums,
            Err(e) => {
                warn!(ticket = %key, %category, error = %e, "could not list category forums");
                return Resolution::default();
            }
        };

        if let Some((forum, tier)) = identify(&forums, identity) {
            let thread = match search_forum(self.discord.as_ref(), self.guild, forum.id, key).await {
                Ok(thread) => thread,
                Err(e) => {
                    warn!(ticket = %key, forum = %forum.id, error = %e, "could not search user forum");
                    None
                }
            };
            match &thread {
                Some(t) => {
                    debug!(ticket = %key, forum = %forum.name, %tier, thread = %t.id, "resolved thread");
                    self.hints.remember(key, forum, t);
                }
                None => debug!(ticket = %key, forum = %forum.name, %tier, "user forum has no thread for ticket"),
            }
            return Resolution::found(forum, thread, tier);
        }

        for forum in &forums {
            match search_forum(self.discord.as_ref(), self.guild, forum.id, key).await {
                Ok(Some(thread)) => {
                    debug!(ticket = %key, forum = %forum.name, thread = %thread.id, "resolved thread by content");
                    self.hints.remember(key, forum, &thread);
                    return Resolution::found(forum, Some(thread), ResolutionTier::Content);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(ticket = %key, forum = %forum.id, error = %e, "skipping forum during content search");
                }
            }
        }

        debug!(ticket = %key, %category, forums = forums.len(), "no thread found for ticket");
        Resolution::default()
    }
}

/// Identity-based forum match: exact canonical name first, then an explicit
/// view grant for the user.
fn identify<'f>(forums: &'f [Forum], identity: Identity<'_>) -> Option<(&'f Forum, ResolutionTier)> {
    let by_name = identity.username.and_then(|username| {
        let wanted = forum_name(username);
        forums.iter().find(|f| f.name == wanted)
    });
    if let Some(forum) = by_name {
        return Some((forum, ResolutionTier::Name));
    }

    let user = identity.user_id?;
    forums
        .iter()
        .find(|f| f.grants_view_to(user))
        .map(|f| (f, ResolutionTier::Permission))
}
