// SPDX-FileCopyrightText: 2026 Taskbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Creating the Discord side of a ticket: user forums and the posts in them.

use std::sync::Arc;

use taskbridge_core::types::{
    DiscordUser, Embed, Forum, ForumPost, NewForum, NewForumPost, OutgoingMessage, OverwriteTarget,
    Permission, PermissionGrant, Thread,
};
use taskbridge_core::{
    ChannelId, DiscordApi, GuildId, RoleId, TaskbridgeError, TicketKey, TicketStatus, UserId,
};
use tracing::{debug, info, warn};

use crate::format::{jira_to_markdown, truncate_with_suffix};
use crate::naming::{forum_name, thread_name};
use crate::routing::EmojiClass;

const TICKET_COLOUR: u32 = 0x0052CC;
const REVIEW_COLOUR: u32 = 0xFFAB00;
const DONE_COLOUR: u32 = 0x36B37E;

/// Everything posted into a freshly claimed ticket's thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketPost {
    pub key: TicketKey,
    pub title: String,
    pub status: TicketStatus,
    pub priority: Option<String>,
    pub assignee: String,
    pub labels: Vec<String>,
    pub description: Option<String>,
}

/// A ticket entering review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewPost {
    pub key: TicketKey,
    pub title: String,
    pub submitter: UserId,
    pub pm_role: Option<RoleId>,
}

/// A ticket that reached Done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedPost {
    pub key: TicketKey,
    pub title: String,
    /// Jira display name of the assignee; also names the completed forum.
    pub assignee: String,
    pub approver: UserId,
}

#[derive(Clone)]
pub struct ForumProvisioner {
    discord: Arc<dyn DiscordApi>,
    guild: GuildId,
    jira_browse_url: Option<String>,
    description_limit: usize,
}

impl ForumProvisioner {
    pub fn new(
        discord: Arc<dyn DiscordApi>,
        guild: GuildId,
        jira_browse_url: Option<String>,
        description_limit: usize,
    ) -> Self {
        Self {
            discord,
            guild,
            jira_browse_url,
            description_limit,
        }
    }

    /// Jira link for a ticket, when a browse URL is configured.
    pub fn browse_url(&self, key: &TicketKey) -> Option<String> {
        self.jira_browse_url
            .as_deref()
            .map(|base| format!("{}/{key}", base.trim_end_matches('/')))
    }

    /// Overwrites of a private working forum: hidden from `@everyone`, open to
    /// its owner and to the bot.
    pub fn working_overwrites(&self, owner: UserId) -> Vec<PermissionGrant> {
        vec![
            PermissionGrant {
                // The @everyone role shares the guild's id.
                target: OverwriteTarget::Role(RoleId(self.guild.0)),
                allow: vec![],
                deny: vec![Permission::ViewChannel],
            },
            PermissionGrant {
                target: OverwriteTarget::Member(owner),
                allow: vec![Permission::ViewChannel, Permission::SendMessages],
                deny: vec![],
            },
            PermissionGrant {
                target: OverwriteTarget::Member(self.discord.bot_user_id()),
                allow: vec![
                    Permission::ViewChannel,
                    Permission::SendMessages,
                    Permission::ManageThreads,
                ],
                deny: vec![],
            },
        ]
    }

    /// The user's private forum in `category`, created when missing.
    ///
    /// An existing forum is recognised by its canonical name or, for users who
    /// renamed themselves, by an explicit view grant.
    pub async fn find_or_create_user_forum(
        &self,
        user: &DiscordUser,
        category: ChannelId,
    ) -> Result<Forum, TaskbridgeError> {
        let forums = self.discord.category_forums(self.guild, category).await?;
        let wanted = forum_name(&user.username);
        if let Some(forum) = forums
            .iter()
            .find(|f| f.name == wanted)
            .or_else(|| forums.iter().find(|f| f.grants_view_to(user.id)))
        {
            debug!(user = %user.id, forum = %forum.name, "found user forum");
            return Ok(forum.clone());
        }

        let forum = self
            .discord
            .create_forum(
                self.guild,
                NewForum {
                    name: wanted,
                    category_id: category,
                    overwrites: self.working_overwrites(user.id),
                },
            )
            .await?;
        info!(user = %user.id, forum = %forum.name, %category, "created user forum");
        Ok(forum)
    }

    /// A forum everyone can see, found by name in `category` or created.
    pub async fn find_or_create_open_forum(
        &self,
        name: &str,
        category: ChannelId,
    ) -> Result<Forum, TaskbridgeError> {
        let forums = self.discord.category_forums(self.guild, category).await?;
        if let Some(forum) = forums.into_iter().find(|f| f.name == name) {
            return Ok(forum);
        }
        let forum = self
            .discord
            .create_forum(
                self.guild,
                NewForum {
                    name: name.to_string(),
                    category_id: category,
                    overwrites: Vec::new(),
                },
            )
            .await?;
        info!(forum = %forum.name, %category, "created open forum");
        Ok(forum)
    }

    /// Posts a claimed ticket into a working forum.
    ///
    /// The starter message carries the ticket embed and the 📋 reaction used
    /// to submit for review; the converted description follows as a second
    /// message. Returns `None` when the post cannot be created.
    pub async fn create_ticket_thread(&self, forum: &Forum, ticket: &TicketPost) -> Option<Thread> {
        let mut embed = Embed::new()
            .title(thread_name(&ticket.key, &ticket.title))
            .colour(TICKET_COLOUR)
            .field("Status", ticket.status.to_string(), true)
            .field("Priority", ticket.priority.as_deref().unwrap_or("None"), true)
            .field("Assignee", ticket.assignee.as_str(), true);
        let labels = if ticket.labels.is_empty() {
            "None".to_string()
        } else {
            ticket.labels.join(", ")
        };
        embed = embed
            .field("Labels", labels, false)
            .footer("React with 📋 when ready for review");
        if let Some(url) = self.browse_url(&ticket.key) {
            embed = embed.url(url);
        }

        let post = self
            .post(
                forum.id,
                &ticket.key,
                thread_name(&ticket.key, &ticket.title),
                OutgoingMessage::embed(embed),
            )
            .await?;

        if let Err(e) = self
            .discord
            .add_reaction(post.thread.id, post.starter_message, EmojiClass::Submit.glyph())
            .await
        {
            warn!(ticket = %ticket.key, thread = %post.thread.id, error = %e, "could not add submit reaction");
        }

        if let Some(description) = ticket.description.as_deref().filter(|d| !d.trim().is_empty()) {
            let body = self.description_body(&ticket.key, description);
            if let Err(e) = self
                .discord
                .send_message(post.thread.id, OutgoingMessage::text(body))
                .await
            {
                warn!(ticket = %ticket.key, thread = %post.thread.id, error = %e, "could not post description");
            }
        }

        info!(ticket = %ticket.key, forum = %forum.name, thread = %post.thread.id, "created ticket thread");
        Some(post.thread)
    }

    /// Posts a ticket into the review forum with approve/deny affordances,
    /// pinging the PM role.
    pub async fn create_review_thread(&self, review_forum: ChannelId, review: &ReviewPost) -> Option<Thread> {
        let mut embed = Embed::new()
            .title(thread_name(&review.key, &review.title))
            .colour(REVIEW_COLOUR)
            .field("Status", TicketStatus::InReview.to_string(), true)
            .field("Submitted by", review.submitter.mention(), true)
            .footer("React ✅ to approve or ❌ to send back");
        if let Some(url) = self.browse_url(&review.key) {
            embed = embed.url(url);
        }
        let mut message = OutgoingMessage::embed(embed);
        if let Some(role) = review.pm_role {
            message = message.with_content(format!("{} {} is ready for review", role.mention(), review.key));
        }

        let post = self
            .post(review_forum, &review.key, thread_name(&review.key, &review.title), message)
            .await?;

        for emoji in [EmojiClass::Approve, EmojiClass::Deny] {
            if let Err(e) = self
                .discord
                .add_reaction(post.thread.id, post.starter_message, emoji.glyph())
                .await
            {
                warn!(ticket = %review.key, thread = %post.thread.id, emoji = %emoji, error = %e, "could not add review reaction");
            }
        }

        info!(ticket = %review.key, thread = %post.thread.id, "created review thread");
        Some(post.thread)
    }

    /// Records a finished ticket in the assignee's completed-tasks forum.
    pub async fn create_completed_thread(&self, category: ChannelId, done: &CompletedPost) -> Option<Thread> {
        let forum = match self
            .find_or_create_open_forum(&forum_name(&done.assignee), category)
            .await
        {
            Ok(forum) => forum,
            Err(e) => {
                warn!(ticket = %done.key, assignee = %done.assignee, error = %e, "could not provision completed forum");
                return None;
            }
        };

        let mut embed = Embed::new()
            .title(thread_name(&done.key, &done.title))
            .colour(DONE_COLOUR)
            .field("Status", TicketStatus::Done.to_string(), true)
            .field("Assignee", done.assignee.as_str(), true)
            .field("Approved by", done.approver.mention(), true);
        if let Some(url) = self.browse_url(&done.key) {
            embed = embed.url(url);
        }

        let post = self
            .post(forum.id, &done.key, thread_name(&done.key, &done.title), OutgoingMessage::embed(embed))
            .await?;
        info!(ticket = %done.key, forum = %forum.name, thread = %post.thread.id, "created completed thread");
        Some(post.thread)
    }

    fn description_body(&self, key: &TicketKey, description: &str) -> String {
        let markdown = jira_to_markdown(description);
        let suffix = match self.browse_url(key) {
            Some(url) => format!("…\n\n[View full description in Jira]({url})"),
            None => "…\n\n*(truncated, view the full description in Jira)*".to_string(),
        };
        let budget = self.description_limit.saturating_sub(suffix.chars().count());
        if markdown.chars().count() <= self.description_limit {
            markdown
        } else {
            truncate_with_suffix(&markdown, budget, &suffix)
        }
    }

    async fn post(
        &self,
        forum: ChannelId,
        key: &TicketKey,
        name: String,
        message: OutgoingMessage,
    ) -> Option<ForumPost> {
        match self
            .discord
            .create_forum_post(forum, NewForumPost { name, message })
            .await
        {
            Ok(post) => Some(post),
            Err(e) => {
                warn!(ticket = %key, %forum, error = %e, "could not create forum post");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskbridge_test_utils::{MockDiscord, Op};

    fn key(s: &str) -> TicketKey {
        TicketKey::parse(s).unwrap()
    }

    fn alice() -> DiscordUser {
        DiscordUser {
            id: UserId(7),
            username: "Alice.Smith".into(),
            display_name: None,
            bot: false,
        }
    }

    fn provisioner(discord: &MockDiscord, browse: Option<&str>) -> ForumProvisioner {
        ForumProvisioner::new(
            Arc::new(discord.clone()),
            discord.guild_id(),
            browse.map(str::to_string),
            1900,
        )
    }

    fn ticket(description: Option<&str>) -> TicketPost {
        TicketPost {
            key: key("KAN-1"),
            title: "KAN-1: Fix login".into(),
            status: TicketStatus::InProgress,
            priority: Some("High".into()),
            assignee: "Alice".into(),
            labels: vec!["auth".into(), "web".into()],
            description: description.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn creates_private_forum_once() {
        let discord = MockDiscord::default();
        let category = discord.add_category();
        let provisioner = provisioner(&discord, None);

        let forum = provisioner.find_or_create_user_forum(&alice(), category).await.unwrap();
        assert_eq!(forum.name, "tasks-alicesmith");
        assert!(forum.grants_view_to(UserId(7)));
        let everyone = forum
            .overwrites
            .iter()
            .find(|g| g.target == OverwriteTarget::Role(RoleId(discord.guild_id().0)))
            .unwrap();
        assert_eq!(everyone.deny, vec![Permission::ViewChannel]);
        let bot = forum
            .overwrites
            .iter()
            .find(|g| g.target == OverwriteTarget::Member(discord.bot().id))
            .unwrap();
        assert!(bot.allow.contains(&Permission::ManageThreads));

        let again = provisioner.find_or_create_user_forum(&alice(), category).await.unwrap();
        assert_eq!(again.id, forum.id);
        assert_eq!(discord.calls_of(Op::CreateForum).len(), 1);
    }

    #[tokio::test]
    async fn renamed_user_keeps_granted_forum() {
        let discord = MockDiscord::default();
        let category = discord.add_category();
        let provisioner = provisioner(&discord, None);
        let original = provisioner.find_or_create_user_forum(&alice(), category).await.unwrap();

        let renamed = DiscordUser {
            username: "alice2".into(),
            ..alice()
        };
        let found = provisioner.find_or_create_user_forum(&renamed, category).await.unwrap();
        assert_eq!(found.id, original.id);
    }

    #[tokio::test]
    async fn ticket_thread_has_embed_reaction_and_description() {
        let discord = MockDiscord::default();
        let category = discord.add_category();
        let provisioner = provisioner(&discord, Some("https://acme.atlassian.net/browse/"));
        let forum = provisioner.find_or_create_user_forum(&alice(), category).await.unwrap();

        let thread = provisioner
            .create_ticket_thread(&forum, &ticket(Some("h2. Steps\n* open *login*")))
            .await
            .unwrap();

        assert_eq!(thread.name, "KAN-1: Fix login");
        let messages = discord.messages_in(thread.id);
        assert_eq!(messages.len(), 2);
        let embed = &messages[0].embeds[0];
        assert_eq!(embed.url.as_deref(), Some("https://acme.atlassian.net/browse/KAN-1"));
        let names: Vec<_> = embed.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["Status", "Priority", "Assignee", "Labels"]);
        assert_eq!(embed.fields[3].value, "auth, web");
        assert_eq!(messages[1].content, "## Steps\n- open **login**");
        assert_eq!(
            discord.reactions_on(messages[0].id),
            vec![(discord.bot().id, "📋".to_string())]
        );
    }

    #[tokio::test]
    async fn long_description_is_truncated_with_link() {
        let discord = MockDiscord::default();
        let category = discord.add_category();
        let provisioner = provisioner(&discord, Some("https://acme.atlassian.net/browse"));
        let forum = provisioner.find_or_create_user_forum(&alice(), category).await.unwrap();
        let long = "word ".repeat(1000);

        let thread = provisioner.create_ticket_thread(&forum, &ticket(Some(&long))).await.unwrap();
        let body = &discord.messages_in(thread.id)[1].content;
        assert!(body.chars().count() <= 1900);
        assert!(body.ends_with("(https://acme.atlassian.net/browse/KAN-1)"));
    }

    #[tokio::test]
    async fn failed_post_returns_none() {
        let discord = MockDiscord::default();
        let category = discord.add_category();
        let provisioner = provisioner(&discord, None);
        let forum = provisioner.find_or_create_user_forum(&alice(), category).await.unwrap();
        discord.fail(Op::CreateForumPost);

        assert!(provisioner.create_ticket_thread(&forum, &ticket(None)).await.is_none());
    }

    #[tokio::test]
    async fn reaction_failure_still_returns_thread() {
        let discord = MockDiscord::default();
        let category = discord.add_category();
        let provisioner = provisioner(&discord, None);
        let forum = provisioner.find_or_create_user_forum(&alice(), category).await.unwrap();
        discord.fail(Op::AddReaction);

        assert!(provisioner.create_ticket_thread(&forum, &ticket(None)).await.is_some());
    }

    #[tokio::test]
    async fn review_thread_pings_role_and_offers_votes() {
        let discord = MockDiscord::default();
        let review = discord.add_forum(None, "review", vec![]);
        let provisioner = provisioner(&discord, None);

        let thread = provisioner
            .create_review_thread(
                review,
                &ReviewPost {
                    key: key("KAN-3"),
                    title: "Ship it".into(),
                    submitter: UserId(7),
                    pm_role: Some(RoleId(55)),
                },
            )
            .await
            .unwrap();

        let starter = &discord.messages_in(thread.id)[0];
        assert!(starter.content.starts_with("<@&55>"));
        let emojis: Vec<_> = discord
            .reactions_on(starter.id)
            .into_iter()
            .map(|(_, e)| e)
            .collect();
        assert_eq!(emojis, ["✅", "❌"]);
    }

    #[tokio::test]
    async fn completed_thread_lands_in_open_assignee_forum() {
        let discord = MockDiscord::default();
        let completed = discord.add_category();
        let provisioner = provisioner(&discord, None);

        let thread = provisioner
            .create_completed_thread(
                completed,
                &CompletedPost {
                    key: key("KAN-4"),
                    title: "Done thing".into(),
                    assignee: "Alice Smith".into(),
                    approver: UserId(9),
                },
            )
            .await
            .unwrap();

        let forum = discord.forum(thread.parent_id).unwrap();
        assert_eq!(forum.name, "tasks-alicesmith");
        assert!(forum.overwrites.is_empty());
        assert_eq!(forum.category_id, Some(completed));
    }
}
