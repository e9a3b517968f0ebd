// SPDX-FileCopyrightText: 2026 Taskbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversions between serenity models and the platform-neutral types in
//! `taskbridge-core`.

use serenity::all::{
    Channel, ChannelType, CreateEmbed, CreateEmbedFooter, CreateMessage, GuildChannel,
    PermissionOverwrite, PermissionOverwriteType, Permissions, Reaction, ReactionType, User,
};
use serenity::model::channel::Embed as SerenityEmbed;
use taskbridge_core::TaskbridgeError;
use taskbridge_core::types::{
    ChannelId, ChannelInfo, DiscordUser, Embed, EmbedField, Forum, GuildId, MessageId,
    OutgoingMessage, OverwriteTarget, Permission, PermissionGrant, ReactionEvent, RoleId, Thread,
    UserId,
};

/// Wraps a serenity error, keeping it as the source.
pub fn discord_error(context: &str, e: serenity::Error) -> TaskbridgeError {
    TaskbridgeError::Discord {
        message: format!("{context}: {e}"),
        source: Some(Box::new(e)),
    }
}

pub fn to_permissions(permissions: &[Permission]) -> Permissions {
    permissions
        .iter()
        .fold(Permissions::empty(), |acc, permission| acc | to_permission(*permission))
}

fn to_permission(permission: Permission) -> Permissions {
    match permission {
        Permission::ViewChannel => Permissions::VIEW_CHANNEL,
        // Posting in a forum and replying inside its threads are separate bits.
        Permission::SendMessages => {
            Permissions::SEND_MESSAGES | Permissions::SEND_MESSAGES_IN_THREADS
        }
        Permission::ManageThreads => Permissions::MANAGE_THREADS,
    }
}

pub fn from_permissions(permissions: Permissions) -> Vec<Permission> {
    let mut out = Vec::new();
    if permissions.contains(Permissions::VIEW_CHANNEL) {
        out.push(Permission::ViewChannel);
    }
    if permissions.contains(Permissions::SEND_MESSAGES) {
        out.push(Permission::SendMessages);
    }
    if permissions.contains(Permissions::MANAGE_THREADS) {
        out.push(Permission::ManageThreads);
    }
    out
}

pub fn to_overwrite(grant: &PermissionGrant) -> PermissionOverwrite {
    let kind = match grant.target {
        OverwriteTarget::Member(user) => PermissionOverwriteType::Member(user.0.into()),
        OverwriteTarget::Role(role) => PermissionOverwriteType::Role(role.0.into()),
    };
    PermissionOverwrite {
        allow: to_permissions(&grant.allow),
        deny: to_permissions(&grant.deny),
        kind,
    }
}

/// Overwrites of kinds the workflow does not model are dropped.
pub fn from_overwrite(overwrite: &PermissionOverwrite) -> Option<PermissionGrant> {
    let target = match overwrite.kind {
        PermissionOverwriteType::Member(user) => OverwriteTarget::Member(UserId(user.get())),
        PermissionOverwriteType::Role(role) => OverwriteTarget::Role(RoleId(role.get())),
        _ => return None,
    };
    Some(PermissionGrant {
        target,
        allow: from_permissions(overwrite.allow),
        deny: from_permissions(overwrite.deny),
    })
}

pub fn is_thread(kind: ChannelType) -> bool {
    matches!(
        kind,
        ChannelType::PublicThread | ChannelType::PrivateThread | ChannelType::NewsThread
    )
}

pub fn to_thread(channel: &GuildChannel) -> Thread {
    Thread {
        id: ChannelId(channel.id.get()),
        name: channel.name.clone(),
        parent_id: ChannelId(channel.parent_id.map(|p| p.get()).unwrap_or_default()),
        archived: channel
            .thread_metadata
            .as_ref()
            .is_some_and(|meta| meta.archived),
    }
}

pub fn to_forum(channel: &GuildChannel) -> Forum {
    Forum {
        id: ChannelId(channel.id.get()),
        name: channel.name.clone(),
        category_id: channel.parent_id.map(|p| ChannelId(p.get())),
        overwrites: channel
            .permission_overwrites
            .iter()
            .filter_map(from_overwrite)
            .collect(),
    }
}

pub fn to_channel_info(channel: Channel) -> ChannelInfo {
    match channel {
        Channel::Guild(guild_channel) if is_thread(guild_channel.kind) => {
            ChannelInfo::Thread(to_thread(&guild_channel))
        }
        Channel::Guild(guild_channel) if guild_channel.kind == ChannelType::Forum => {
            ChannelInfo::Forum(to_forum(&guild_channel))
        }
        other => ChannelInfo::Other(ChannelId(other.id().get())),
    }
}

pub fn to_embed(embed: &SerenityEmbed) -> Embed {
    Embed {
        title: embed.title.clone(),
        url: embed.url.clone(),
        description: embed.description.clone(),
        colour: embed.colour.map(|c| c.0),
        fields: embed
            .fields
            .iter()
            .map(|field| EmbedField {
                name: field.name.clone(),
                value: field.value.clone(),
                inline: field.inline,
            })
            .collect(),
        footer: embed.footer.as_ref().map(|footer| footer.text.clone()),
    }
}

pub fn create_embed(embed: &Embed) -> CreateEmbed {
    let mut builder = CreateEmbed::new();
    if let Some(title) = &embed.title {
        builder = builder.title(title);
    }
    if let Some(url) = &embed.url {
        builder = builder.url(url);
    }
    if let Some(description) = &embed.description {
        builder = builder.description(description);
    }
    if let Some(colour) = embed.colour {
        builder = builder.colour(colour);
    }
    for field in &embed.fields {
        builder = builder.field(&field.name, &field.value, field.inline);
    }
    if let Some(footer) = &embed.footer {
        builder = builder.footer(CreateEmbedFooter::new(footer));
    }
    builder
}

pub fn create_message(message: &OutgoingMessage) -> CreateMessage {
    let mut builder = CreateMessage::new();
    if let Some(content) = &message.content {
        builder = builder.content(content);
    }
    if !message.embeds.is_empty() {
        builder = builder.embeds(message.embeds.iter().map(create_embed).collect());
    }
    builder
}

pub fn to_user(user: &User) -> DiscordUser {
    DiscordUser {
        id: UserId(user.id.get()),
        username: user.name.clone(),
        display_name: user.global_name.clone(),
        bot: user.bot,
    }
}

/// The unicode glyph, or a custom emoji's name.
pub fn emoji_name(reaction: &ReactionType) -> Option<String> {
    match reaction {
        ReactionType::Unicode(glyph) => Some(glyph.clone()),
        ReactionType::Custom { name, .. } => name.clone(),
        _ => None,
    }
}

/// Gateway reactions without a user id or a usable emoji are dropped.
pub fn to_reaction_event(reaction: &Reaction) -> Option<ReactionEvent> {
    Some(ReactionEvent {
        guild_id: reaction.guild_id.map(|g| GuildId(g.get())),
        channel_id: ChannelId(reaction.channel_id.get()),
        message_id: MessageId(reaction.message_id.get()),
        user_id: UserId(reaction.user_id?.get()),
        emoji: emoji_name(&reaction.emoji)?,
    })
}
