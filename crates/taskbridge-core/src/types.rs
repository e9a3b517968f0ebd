// SPDX-FileCopyrightText: 2026 Taskbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Platform-neutral views of the Discord objects the workflow touches.
//!
//! The Discord adapter converts its API models into these types so the
//! workflow crate never depends on a Discord library directly.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

snowflake!(
    /// Identifier of a Discord guild (server).
    GuildId
);
snowflake!(
    /// Identifier of any channel: category, forum, or thread.
    ChannelId
);
snowflake!(
    /// Identifier of a Discord user.
    UserId
);
snowflake!(
    /// Identifier of a message.
    MessageId
);
snowflake!(
    /// Identifier of a guild role.
    RoleId
);

impl UserId {
    /// Discord mention syntax (`<@123>`).
    pub fn mention(self) -> String {
        format!("<@{}>", self.0)
    }
}

impl RoleId {
    /// Discord role mention syntax (`<@&123>`).
    pub fn mention(self) -> String {
        format!("<@&{}>", self.0)
    }
}

impl ChannelId {
    /// Discord channel mention syntax (`<#123>`).
    pub fn mention(self) -> String {
        format!("<#{}>", self.0)
    }
}

/// A channel permission the bot grants or denies on forums.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ViewChannel,
    SendMessages,
    ManageThreads,
}

/// Who a permission overwrite applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverwriteTarget {
    Member(UserId),
    Role(RoleId),
}

/// A single permission overwrite on a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionGrant {
    pub target: OverwriteTarget,
    pub allow: Vec<Permission>,
    pub deny: Vec<Permission>,
}

/// A forum channel living under a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forum {
    pub id: ChannelId,
    pub name: String,
    pub category_id: Option<ChannelId>,
    pub overwrites: Vec<PermissionGrant>,
}

impl Forum {
    /// Returns true when an overwrite explicitly allows `user` to view this forum.
    pub fn grants_view_to(&self, user: UserId) -> bool {
        self.overwrites.iter().any(|grant| {
            grant.target == OverwriteTarget::Member(user)
                && grant.allow.contains(&Permission::ViewChannel)
        })
    }
}

/// A thread (forum post) inside a forum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thread {
    pub id: ChannelId,
    pub name: String,
    pub parent_id: ChannelId,
    pub archived: bool,
}

/// What a channel id turned out to be when fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelInfo {
    Thread(Thread),
    Forum(Forum),
    Other(ChannelId),
}

/// The subset of a Discord user the workflow needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscordUser {
    pub id: UserId,
    pub username: String,
    pub display_name: Option<String>,
    pub bot: bool,
}

impl DiscordUser {
    /// Name shown to humans: global display name, else username.
    pub fn shown_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }

    /// The legacy tag sent to the backend. Discord dropped discriminators,
    /// so this is the username alone.
    pub fn tag(&self) -> String {
        self.username.clone()
    }
}

/// One field of an embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// A rich embed, either read from a message or about to be posted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub colour: Option<u32>,
    pub fields: Vec<EmbedField>,
    pub footer: Option<String>,
}

impl Embed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn colour(mut self, colour: u32) -> Self {
        self.colour = Some(colour);
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }
}

/// A message read back from Discord.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageInfo {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub content: String,
    pub embeds: Vec<Embed>,
}

/// A message to send.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub content: Option<String>,
    pub embeds: Vec<Embed>,
}

impl OutgoingMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            embeds: Vec::new(),
        }
    }

    pub fn embed(embed: Embed) -> Self {
        Self {
            content: None,
            embeds: vec![embed],
        }
    }

    /// Adds text content alongside any embeds.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }
}

/// Request to create a forum channel inside a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewForum {
    pub name: String,
    pub category_id: ChannelId,
    pub overwrites: Vec<PermissionGrant>,
}

/// Request to create a post (thread plus starter message) in a forum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewForumPost {
    pub name: String,
    pub message: OutgoingMessage,
}

/// A freshly created forum post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForumPost {
    pub thread: Thread,
    /// The starter message carrying the post's embed.
    pub starter_message: MessageId,
}

/// A reaction added to a message, as delivered by the gateway.
///
/// The gateway may deliver this without the reacting user's full data; the
/// workflow fetches it before routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionEvent {
    pub guild_id: Option<GuildId>,
    pub channel_id: ChannelId,
    pub message_id: MessageId,
    pub user_id: UserId,
    /// Unicode glyph, or the custom emoji's name.
    pub emoji: String,
}
