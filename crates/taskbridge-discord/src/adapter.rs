// SPDX-FileCopyrightText: 2026 Taskbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`DiscordApi`] over serenity's REST client.

use std::sync::Arc;

use async_trait::async_trait;
use serenity::all::{
    ChannelType, CreateChannel, CreateForumPost, EditThread, Http, ReactionType,
};
use serenity::model::id as sid;
use taskbridge_core::TaskbridgeError;
use taskbridge_core::traits::DiscordApi;
use taskbridge_core::types::{
    ChannelId, ChannelInfo, DiscordUser, Forum, ForumPost, GuildId, MessageId, MessageInfo,
    NewForum, NewForumPost, OutgoingMessage, RoleId, Thread, UserId,
};
use tracing::debug;

use crate::convert::{
    create_message, discord_error, to_channel_info, to_embed, to_forum, to_overwrite, to_thread,
    to_user,
};

/// Archived threads fetched per forum. Older posts fall off the third
/// resolver tier.
const ARCHIVED_PAGE_LIMIT: u64 = 100;

/// Discord REST access for the workflow.
pub struct SerenityDiscord {
    http: Arc<Http>,
    bot_user: UserId,
}

impl SerenityDiscord {
    /// Wraps an authenticated HTTP client and looks up the bot's own user.
    pub async fn connect(http: Arc<Http>) -> Result<Self, TaskbridgeError> {
        let me = http
            .get_current_user()
            .await
            .map_err(|e| discord_error("failed to fetch bot user", e))?;
        debug!(bot = %me.id, name = %me.name, "discord REST client ready");
        Ok(Self::new(http, UserId(me.id.get())))
    }

    pub fn new(http: Arc<Http>, bot_user: UserId) -> Self {
        Self { http, bot_user }
    }

    pub fn http(&self) -> &Arc<Http> {
        &self.http
    }
}

fn channel(id: ChannelId) -> sid::ChannelId {
    sid::ChannelId::new(id.0)
}

fn guild(id: GuildId) -> sid::GuildId {
    sid::GuildId::new(id.0)
}

fn unicode(emoji: &str) -> ReactionType {
    ReactionType::Unicode(emoji.to_string())
}

#[async_trait]
impl DiscordApi for SerenityDiscord {
    fn bot_user_id(&self) -> UserId {
        self.bot_user
    }

    async fn channel(&self, id: ChannelId) -> Result<ChannelInfo, TaskbridgeError> {
        let fetched = channel(id)
            .to_channel(&*self.http)
            .await
            .map_err(|e| discord_error("failed to fetch channel", e))?;
        Ok(to_channel_info(fetched))
    }

    async fn category_forums(
        &self,
        guild_id: GuildId,
        category: ChannelId,
    ) -> Result<Vec<Forum>, TaskbridgeError> {
        let channels = guild(guild_id)
            .channels(&*self.http)
            .await
            .map_err(|e| discord_error("failed to list guild channels", e))?;
        let mut forums: Vec<Forum> = channels
            .values()
            .filter(|c| c.kind == ChannelType::Forum && c.parent_id == Some(channel(category)))
            .map(to_forum)
            .collect();
        forums.sort_by_key(|f| f.id);
        Ok(forums)
    }

    async fn active_threads(
        &self,
        guild_id: GuildId,
        forum: ChannelId,
    ) -> Result<Vec<Thread>, TaskbridgeError> {
        let data = guild(guild_id)
            .get_active_threads(&*self.http)
            .await
            .map_err(|e| discord_error("failed to list active threads", e))?;
        Ok(data
            .threads
            .iter()
            .filter(|t| t.parent_id == Some(channel(forum)))
            .map(to_thread)
            .collect())
    }

    async fn archived_threads(&self, forum: ChannelId) -> Result<Vec<Thread>, TaskbridgeError> {
        let data = channel(forum)
            .get_archived_public_threads(&*self.http, None, Some(ARCHIVED_PAGE_LIMIT))
            .await
            .map_err(|e| discord_error("failed to list archived threads", e))?;
        Ok(data.threads.iter().map(to_thread).collect())
    }

    async fn create_forum(&self, guild_id: GuildId, forum: NewForum) -> Result<Forum, TaskbridgeError> {
        let builder = CreateChannel::new(&forum.name)
            .kind(ChannelType::Forum)
            .category(channel(forum.category_id))
            .permissions(forum.overwrites.iter().map(to_overwrite));
        let created = guild(guild_id)
            .create_channel(&*self.http, builder)
            .await
            .map_err(|e| discord_error("failed to create forum", e))?;
        Ok(to_forum(&created))
    }

    async fn create_forum_post(
        &self,
        forum: ChannelId,
        post: NewForumPost,
    ) -> Result<ForumPost, TaskbridgeError> {
        let builder = CreateForumPost::new(&post.name, create_message(&post.message));
        let created = channel(forum)
            .create_forum_post(&*self.http, builder)
            .await
            .map_err(|e| discord_error("failed to create forum post", e))?;
        // A forum post's starter message shares the thread's id.
        Ok(ForumPost {
            starter_message: MessageId(created.id.get()),
            thread: to_thread(&created),
        })
    }

    async fn send_message(
        &self,
        target: ChannelId,
        message: OutgoingMessage,
    ) -> Result<MessageId, TaskbridgeError> {
        let sent = channel(target)
            .send_message(&*self.http, create_message(&message))
            .await
            .map_err(|e| discord_error("failed to send message", e))?;
        Ok(MessageId(sent.id.get()))
    }

    async fn message(
        &self,
        target: ChannelId,
        message: MessageId,
    ) -> Result<MessageInfo, TaskbridgeError> {
        let fetched = channel(target)
            .message(&*self.http, sid::MessageId::new(message.0))
            .await
            .map_err(|e| discord_error("failed to fetch message", e))?;
        Ok(MessageInfo {
            id: MessageId(fetched.id.get()),
            channel_id: ChannelId(fetched.channel_id.get()),
            content: fetched.content.clone(),
            embeds: fetched.embeds.iter().map(to_embed).collect(),
        })
    }

    async fn add_reaction(
        &self,
        target: ChannelId,
        message: MessageId,
        emoji: &str,
    ) -> Result<(), TaskbridgeError> {
        channel(target)
            .create_reaction(&*self.http, sid::MessageId::new(message.0), unicode(emoji))
            .await
            .map_err(|e| discord_error("failed to add reaction", e))
    }

    async fn remove_reaction(
        &self,
        target: ChannelId,
        message: MessageId,
        user: UserId,
        emoji: &str,
    ) -> Result<(), TaskbridgeError> {
        channel(target)
            .delete_reaction(
                &*self.http,
                sid::MessageId::new(message.0),
                Some(sid::UserId::new(user.0)),
                unicode(emoji),
            )
            .await
            .map_err(|e| discord_error("failed to remove reaction", e))
    }

    async fn delete_channel(&self, target: ChannelId) -> Result<(), TaskbridgeError> {
        channel(target)
            .delete(&*self.http)
            .await
            .map(|_| ())
            .map_err(|e| discord_error("failed to delete channel", e))
    }

    async fn set_archived(&self, thread: ChannelId, archived: bool) -> Result<(), TaskbridgeError> {
        channel(thread)
            .edit_thread(&*self.http, EditThread::new().archived(archived))
            .await
            .map(|_| ())
            .map_err(|e| discord_error("failed to update thread archive state", e))
    }

    async fn user(&self, id: UserId) -> Result<DiscordUser, TaskbridgeError> {
        let user = sid::UserId::new(id.0)
            .to_user(&*self.http)
            .await
            .map_err(|e| discord_error("failed to fetch user", e))?;
        Ok(to_user(&user))
    }

    async fn member_roles(
        &self,
        guild_id: GuildId,
        user: UserId,
    ) -> Result<Vec<RoleId>, TaskbridgeError> {
        let member = guild(guild_id)
            .member(&*self.http, sid::UserId::new(user.0))
            .await
            .map_err(|e| discord_error("failed to fetch guild member", e))?;
        Ok(member.roles.iter().map(|r| RoleId(r.get())).collect())
    }
}
