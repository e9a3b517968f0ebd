// SPDX-FileCopyrightText: 2026 Taskbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Discord capability surface used by the workflow.

use async_trait::async_trait;

use crate::error::TaskbridgeError;
use crate::types::{
    ChannelId, ChannelInfo, DiscordUser, Forum, ForumPost, GuildId, MessageId, MessageInfo,
    NewForum, NewForumPost, OutgoingMessage, RoleId, Thread, UserId,
};

/// The Discord operations the workflow relies on.
///
/// Implementations map their platform errors into
/// [`TaskbridgeError::Discord`]. Every method is a single API round trip (or
/// a paginated listing); retry and fallback policy live in the workflow.
#[async_trait]
pub trait DiscordApi: Send + Sync + 'static {
    /// The bot's own user id, used for forum permission overwrites.
    fn bot_user_id(&self) -> UserId;

    /// Fetches a channel and classifies it as thread, forum, or other.
    async fn channel(&self, id: ChannelId) -> Result<ChannelInfo, TaskbridgeError>;

    /// Lists the forum channels whose parent is `category`.
    async fn category_forums(
        &self,
        guild: GuildId,
        category: ChannelId,
    ) -> Result<Vec<Forum>, TaskbridgeError>;

    /// Lists the active (unarchived) threads of a forum.
    async fn active_threads(
        &self,
        guild: GuildId,
        forum: ChannelId,
    ) -> Result<Vec<Thread>, TaskbridgeError>;

    /// Lists the archived threads of a forum.
    async fn archived_threads(&self, forum: ChannelId) -> Result<Vec<Thread>, TaskbridgeError>;

    /// Creates a forum channel.
    async fn create_forum(&self, guild: GuildId, forum: NewForum)
        -> Result<Forum, TaskbridgeError>;

    /// Creates a post in a forum: a thread plus its starter message.
    async fn create_forum_post(
        &self,
        forum: ChannelId,
        post: NewForumPost,
    ) -> Result<ForumPost, TaskbridgeError>;

    /// Sends a message into a channel or thread.
    async fn send_message(
        &self,
        channel: ChannelId,
        message: OutgoingMessage,
    ) -> Result<MessageId, TaskbridgeError>;

    /// Fetches a single message.
    async fn message(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> Result<MessageInfo, TaskbridgeError>;

    /// Adds the bot's reaction to a message.
    async fn add_reaction(
        &self,
        channel: ChannelId,
        message: MessageId,
        emoji: &str,
    ) -> Result<(), TaskbridgeError>;

    /// Removes one user's reaction from a message.
    async fn remove_reaction(
        &self,
        channel: ChannelId,
        message: MessageId,
        user: UserId,
        emoji: &str,
    ) -> Result<(), TaskbridgeError>;

    /// Deletes a channel or thread.
    async fn delete_channel(&self, channel: ChannelId) -> Result<(), TaskbridgeError>;

    /// Archives or unarchives a thread.
    async fn set_archived(&self, thread: ChannelId, archived: bool)
        -> Result<(), TaskbridgeError>;

    /// Fetches a user.
    async fn user(&self, id: UserId) -> Result<DiscordUser, TaskbridgeError>;

    /// Fetches the role ids held by a guild member.
    async fn member_roles(&self, guild: GuildId, user: UserId)
        -> Result<Vec<RoleId>, TaskbridgeError>;
}
