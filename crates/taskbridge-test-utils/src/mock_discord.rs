// SPDX-FileCopyrightText: 2026 Taskbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory Discord guild for deterministic testing.
//!
//! `MockDiscord` implements `DiscordApi` over a small model of categories,
//! forums, threads, and messages. Every call is recorded for assertions and
//! any operation can be made to fail, globally or for one target id.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use taskbridge_core::types::{
    ChannelInfo, DiscordUser, Forum, ForumPost, MessageInfo, NewForum, NewForumPost,
    OutgoingMessage, PermissionGrant, Thread,
};
use taskbridge_core::{ChannelId, DiscordApi, GuildId, MessageId, RoleId, TaskbridgeError, UserId};

/// Discord operations, used to record calls and inject failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Channel,
    CategoryForums,
    ActiveThreads,
    ArchivedThreads,
    CreateForum,
    CreateForumPost,
    SendMessage,
    Message,
    AddReaction,
    RemoveReaction,
    DeleteChannel,
    SetArchived,
    User,
    MemberRoles,
}

/// One recorded call: the operation and the id it targeted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub op: Op,
    pub target: u64,
    /// Extra detail: a channel name, emoji, or message text.
    pub detail: String,
}

#[derive(Debug, Clone)]
enum MockChannel {
    Category,
    Forum(Forum),
    Thread(Thread),
    Text,
}

#[derive(Debug, Clone)]
struct StoredMessage {
    info: MessageInfo,
    reactions: Vec<(UserId, String)>,
}

#[derive(Debug)]
struct State {
    next_id: u64,
    channels: BTreeMap<ChannelId, MockChannel>,
    messages: BTreeMap<MessageId, StoredMessage>,
    users: HashMap<UserId, DiscordUser>,
    roles: HashMap<UserId, Vec<RoleId>>,
    failing: HashSet<(Op, Option<u64>)>,
    calls: Vec<Call>,
}

impl State {
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn record(&mut self, op: Op, target: u64, detail: impl Into<String>) -> Result<(), TaskbridgeError> {
        self.calls.push(Call {
            op,
            target,
            detail: detail.into(),
        });
        if self.failing.contains(&(op, None)) || self.failing.contains(&(op, Some(target))) {
            return Err(TaskbridgeError::discord(format!("injected {op:?} failure on {target}")));
        }
        Ok(())
    }

    fn thread_mut(&mut self, id: ChannelId) -> Result<&mut Thread, TaskbridgeError> {
        match self.channels.get_mut(&id) {
            Some(MockChannel::Thread(thread)) => Ok(thread),
            _ => Err(TaskbridgeError::discord(format!("unknown thread {id}"))),
        }
    }

    fn push_message(&mut self, id: MessageId, channel: ChannelId, message: OutgoingMessage) {
        self.messages.insert(
            id,
            StoredMessage {
                info: MessageInfo {
                    id,
                    channel_id: channel,
                    content: message.content.unwrap_or_default(),
                    embeds: message.embeds,
                },
                reactions: Vec::new(),
            },
        );
    }
}

/// A mock guild implementing [`DiscordApi`].
///
/// Ids are allocated from a counter starting at 1000, so ids chosen by tests
/// below that never collide.
#[derive(Clone)]
pub struct MockDiscord {
    guild: GuildId,
    bot: DiscordUser,
    state: Arc<Mutex<State>>,
}

impl MockDiscord {
    /// Creates an empty guild whose bot user is `bot`.
    pub fn new(guild: GuildId, bot: DiscordUser) -> Self {
        let mut users = HashMap::new();
        users.insert(bot.id, bot.clone());
        Self {
            guild,
            bot,
            state: Arc::new(Mutex::new(State {
                next_id: 1000,
                channels: BTreeMap::new(),
                messages: BTreeMap::new(),
                users,
                roles: HashMap::new(),
                failing: HashSet::new(),
                calls: Vec::new(),
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn guild_id(&self) -> GuildId {
        self.guild
    }

    pub fn bot(&self) -> &DiscordUser {
        &self.bot
    }

    // --- Setup ---

    /// Adds a category channel.
    pub fn add_category(&self) -> ChannelId {
        let mut state = self.state();
        let id = ChannelId(state.allocate());
        state.channels.insert(id, MockChannel::Category);
        id
    }

    /// Adds a forum, optionally under a category.
    pub fn add_forum(
        &self,
        category: Option<ChannelId>,
        name: &str,
        overwrites: Vec<PermissionGrant>,
    ) -> ChannelId {
        let mut state = self.state();
        let id = ChannelId(state.allocate());
        state.channels.insert(
            id,
            MockChannel::Forum(Forum {
                id,
                name: name.to_string(),
                category_id: category,
                overwrites,
            }),
        );
        id
    }

    /// Adds a thread to a forum, with an empty starter message sharing its id.
    pub fn add_thread(&self, forum: ChannelId, name: &str, archived: bool) -> ChannelId {
        let mut state = self.state();
        let id = ChannelId(state.allocate());
        state.channels.insert(
            id,
            MockChannel::Thread(Thread {
                id,
                name: name.to_string(),
                parent_id: forum,
                archived,
            }),
        );
        state.push_message(MessageId(id.0), id, OutgoingMessage::default());
        id
    }

    /// Adds a plain text channel.
    pub fn add_text_channel(&self) -> ChannelId {
        let mut state = self.state();
        let id = ChannelId(state.allocate());
        state.channels.insert(id, MockChannel::Text);
        id
    }

    /// Adds a message to a channel.
    pub fn add_message(&self, channel: ChannelId, message: OutgoingMessage) -> MessageId {
        let mut state = self.state();
        let id = MessageId(state.allocate());
        state.push_message(id, channel, message);
        id
    }

    /// Registers a user, optionally as a guild member with roles.
    pub fn add_user(&self, user: DiscordUser, roles: Vec<RoleId>) {
        let mut state = self.state();
        state.roles.insert(user.id, roles);
        state.users.insert(user.id, user);
    }

    /// Makes every call of `op` fail.
    pub fn fail(&self, op: Op) {
        self.state().failing.insert((op, None));
    }

    /// Makes calls of `op` targeting `id` fail.
    pub fn fail_for(&self, op: Op, id: u64) {
        self.state().failing.insert((op, Some(id)));
    }

    /// Removes every injected failure.
    pub fn heal(&self) {
        self.state().failing.clear();
    }

    // --- Inspection ---

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    /// Calls of one operation.
    pub fn calls_of(&self, op: Op) -> Vec<Call> {
        self.state()
            .calls
            .iter()
            .filter(|c| c.op == op)
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    pub fn exists(&self, id: ChannelId) -> bool {
        self.state().channels.contains_key(&id)
    }

    pub fn thread(&self, id: ChannelId) -> Option<Thread> {
        match self.state().channels.get(&id) {
            Some(MockChannel::Thread(thread)) => Some(thread.clone()),
            _ => None,
        }
    }

    pub fn forum(&self, id: ChannelId) -> Option<Forum> {
        match self.state().channels.get(&id) {
            Some(MockChannel::Forum(forum)) => Some(forum.clone()),
            _ => None,
        }
    }

    /// Forums under a category, in creation order.
    pub fn forums_in(&self, category: ChannelId) -> Vec<Forum> {
        self.state()
            .channels
            .values()
            .filter_map(|c| match c {
                MockChannel::Forum(f) if f.category_id == Some(category) => Some(f.clone()),
                _ => None,
            })
            .collect()
    }

    /// Threads of a forum, archived or not, in creation order.
    pub fn threads_in(&self, forum: ChannelId) -> Vec<Thread> {
        self.state()
            .channels
            .values()
            .filter_map(|c| match c {
                MockChannel::Thread(t) if t.parent_id == forum => Some(t.clone()),
                _ => None,
            })
            .collect()
    }

    /// Messages posted in a channel, in order.
    pub fn messages_in(&self, channel: ChannelId) -> Vec<MessageInfo> {
        self.state()
            .messages
            .values()
            .filter(|m| m.info.channel_id == channel)
            .map(|m| m.info.clone())
            .collect()
    }

    /// Reactions currently on a message.
    pub fn reactions_on(&self, message: MessageId) -> Vec<(UserId, String)> {
        self.state()
            .messages
            .get(&message)
            .map(|m| m.reactions.clone())
            .unwrap_or_default()
    }
}

impl Default for MockDiscord {
    fn default() -> Self {
        Self::new(
            GuildId(1),
            DiscordUser {
                id: UserId(999),
                username: "taskbridge".to_string(),
                display_name: None,
                bot: true,
            },
        )
    }
}

#[async_trait]
impl DiscordApi for MockDiscord {
    fn bot_user_id(&self) -> UserId {
        self.bot.id
    }

    async fn channel(&self, id: ChannelId) -> Result<ChannelInfo, TaskbridgeError> {
        let mut state = self.state();
        state.record(Op::Channel, id.0, "")?;
        match state.channels.get(&id) {
            Some(MockChannel::Thread(t)) => Ok(ChannelInfo::Thread(t.clone())),
            Some(MockChannel::Forum(f)) => Ok(ChannelInfo::Forum(f.clone())),
            Some(MockChannel::Category | MockChannel::Text) => Ok(ChannelInfo::Other(id)),
            None => Err(TaskbridgeError::discord(format!("unknown channel {id}"))),
        }
    }

    async fn category_forums(
        &self,
        _guild: GuildId,
        category: ChannelId,
    ) -> Result<Vec<Forum>, TaskbridgeError> {
        self.state().record(Op::CategoryForums, category.0, "")?;
        Ok(self.forums_in(category))
    }

    async fn active_threads(
        &self,
        _guild: GuildId,
        forum: ChannelId,
    ) -> Result<Vec<Thread>, TaskbridgeError> {
        self.state().record(Op::ActiveThreads, forum.0, "")?;
        Ok(self.threads_in(forum).into_iter().filter(|t| !t.archived).collect())
    }

    async fn archived_threads(&self, forum: ChannelId) -> Result<Vec<Thread>, TaskbridgeError> {
        self.state().record(Op::ArchivedThreads, forum.0, "")?;
        Ok(self.threads_in(forum).into_iter().filter(|t| t.archived).collect())
    }

    async fn create_forum(&self, _guild: GuildId, forum: NewForum) -> Result<Forum, TaskbridgeError> {
        let mut state = self.state();
        state.record(Op::CreateForum, forum.category_id.0, forum.name.clone())?;
        let id = ChannelId(state.allocate());
        let created = Forum {
            id,
            name: forum.name,
            category_id: Some(forum.category_id),
            overwrites: forum.overwrites,
        };
        state.channels.insert(id, MockChannel::Forum(created.clone()));
        Ok(created)
    }

    async fn create_forum_post(
        &self,
        forum: ChannelId,
        post: NewForumPost,
    ) -> Result<ForumPost, TaskbridgeError> {
        let mut state = self.state();
        state.record(Op::CreateForumPost, forum.0, post.name.clone())?;
        if !matches!(state.channels.get(&forum), Some(MockChannel::Forum(_))) {
            return Err(TaskbridgeError::discord(format!("unknown forum {forum}")));
        }
        let id = ChannelId(state.allocate());
        let thread = Thread {
            id,
            name: post.name,
            parent_id: forum,
            archived: false,
        };
        state.channels.insert(id, MockChannel::Thread(thread.clone()));
        state.push_message(MessageId(id.0), id, post.message);
        Ok(ForumPost {
            thread,
            starter_message: MessageId(id.0),
        })
    }

    async fn send_message(
        &self,
        channel: ChannelId,
        message: OutgoingMessage,
    ) -> Result<MessageId, TaskbridgeError> {
        let mut state = self.state();
        state.record(
            Op::SendMessage,
            channel.0,
            message.content.clone().unwrap_or_default(),
        )?;
        if !state.channels.contains_key(&channel) {
            return Err(TaskbridgeError::discord(format!("unknown channel {channel}")));
        }
        let id = MessageId(state.allocate());
        state.push_message(id, channel, message);
        Ok(id)
    }

    async fn message(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> Result<MessageInfo, TaskbridgeError> {
        let mut state = self.state();
        state.record(Op::Message, message.0, "")?;
        state
            .messages
            .get(&message)
            .filter(|m| m.info.channel_id == channel)
            .map(|m| m.info.clone())
            .ok_or_else(|| TaskbridgeError::discord(format!("unknown message {message}")))
    }

    async fn add_reaction(
        &self,
        _channel: ChannelId,
        message: MessageId,
        emoji: &str,
    ) -> Result<(), TaskbridgeError> {
        let mut state = self.state();
        state.record(Op::AddReaction, message.0, emoji)?;
        let bot = self.bot.id;
        let stored = state
            .messages
            .get_mut(&message)
            .ok_or_else(|| TaskbridgeError::discord(format!("unknown message {message}")))?;
        stored.reactions.push((bot, emoji.to_string()));
        Ok(())
    }

    async fn remove_reaction(
        &self,
        _channel: ChannelId,
        message: MessageId,
        user: UserId,
        emoji: &str,
    ) -> Result<(), TaskbridgeError> {
        let mut state = self.state();
        state.record(Op::RemoveReaction, message.0, emoji)?;
        if let Some(stored) = state.messages.get_mut(&message) {
            stored.reactions.retain(|(u, e)| !(*u == user && e == emoji));
        }
        Ok(())
    }

    async fn delete_channel(&self, channel: ChannelId) -> Result<(), TaskbridgeError> {
        let mut state = self.state();
        state.record(Op::DeleteChannel, channel.0, "")?;
        match state.channels.remove(&channel) {
            Some(_) => {
                state.messages.retain(|_, m| m.info.channel_id != channel);
                Ok(())
            }
            None => Err(TaskbridgeError::discord(format!("unknown channel {channel}"))),
        }
    }

    async fn set_archived(&self, thread: ChannelId, archived: bool) -> Result<(), TaskbridgeError> {
        let mut state = self.state();
        state.record(Op::SetArchived, thread.0, archived.to_string())?;
        state.thread_mut(thread)?.archived = archived;
        Ok(())
    }

    async fn user(&self, id: UserId) -> Result<DiscordUser, TaskbridgeError> {
        let mut state = self.state();
        state.record(Op::User, id.0, "")?;
        state
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| TaskbridgeError::discord(format!("unknown user {id}")))
    }

    async fn member_roles(&self, _guild: GuildId, user: UserId) -> Result<Vec<RoleId>, TaskbridgeError> {
        let mut state = self.state();
        state.record(Op::MemberRoles, user.0, "")?;
        state
            .roles
            .get(&user)
            .cloned()
            .ok_or_else(|| TaskbridgeError::discord(format!("{user} is not a member")))
    }
}
