// SPDX-FileCopyrightText: 2026 Taskbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end workflow transitions against a mock guild and a mocked n8n.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use taskbridge_config::model::{WebhookConfig, WorkflowConfig};
use taskbridge_core::types::{
    DiscordUser, Embed, OutgoingMessage, OverwriteTarget, Permission, PermissionGrant, ReactionEvent,
};
use taskbridge_core::{ChannelId, MessageId, RoleId, TicketKey, UserId};
use taskbridge_test_utils::{MockDiscord, Op};
use taskbridge_webhook::WebhookClient;
use taskbridge_workflow::{Command, Layout, Orchestrator, ReplyKind, TaskAction};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PM_ROLE: RoleId = RoleId(77);

fn alice() -> DiscordUser {
    DiscordUser {
        id: UserId(7),
        username: "alice".into(),
        display_name: Some("Alice Smith".into()),
        bot: false,
    }
}

fn paula() -> DiscordUser {
    DiscordUser {
        id: UserId(8),
        username: "paula".into(),
        display_name: None,
        bot: false,
    }
}

fn key(s: &str) -> TicketKey {
    TicketKey::parse(s).expect("valid key")
}

struct Harness {
    discord: MockDiscord,
    server: MockServer,
    orchestrator: Orchestrator,
    unassigned: ChannelId,
    review: ChannelId,
    working: ChannelId,
    completed: ChannelId,
}

impl Harness {
    async fn new() -> Self {
        let discord = MockDiscord::default();
        let server = MockServer::start().await;
        let working = discord.add_category();
        let completed = discord.add_category();
        let unassigned = discord.add_forum(None, "unassigned", vec![]);
        let review = discord.add_forum(None, "review", vec![]);
        discord.add_user(alice(), vec![]);
        discord.add_user(paula(), vec![PM_ROLE]);

        let layout = Layout {
            guild: discord.guild_id(),
            unassigned_forums: vec![unassigned],
            review_forum: review,
            working_category: working,
            completed_category: completed,
            pm_role: PM_ROLE,
            jira_browse_url: Some("https://acme.atlassian.net/browse/".into()),
        };
        let workflow = WorkflowConfig {
            short_delay_ms: 0,
            medium_delay_ms: 0,
            long_delay_ms: 0,
            ..WorkflowConfig::default()
        };
        let webhook = WebhookClient::new(&WebhookConfig::default())
            .expect("client")
            .with_base_url(server.uri())
            .with_retry_base_delay(Duration::from_millis(5));
        let orchestrator = Orchestrator::new(Arc::new(discord.clone()), webhook, layout, &workflow);

        Self {
            discord,
            server,
            orchestrator,
            unassigned,
            review,
            working,
            completed,
        }
    }

    fn reaction(&self, thread: ChannelId, user: &DiscordUser, emoji: &str) -> ReactionEvent {
        self.reaction_on(thread, MessageId(thread.0), user, emoji)
    }

    fn reaction_on(&self, thread: ChannelId, message: MessageId, user: &DiscordUser, emoji: &str) -> ReactionEvent {
        ReactionEvent {
            guild_id: Some(self.discord.guild_id()),
            channel_id: thread,
            message_id: message,
            user_id: user.id,
            emoji: emoji.into(),
        }
    }

    fn working_forum(&self, owner: &DiscordUser) -> ChannelId {
        self.discord.add_forum(
            Some(self.working),
            &format!("tasks-{}", owner.username),
            vec![PermissionGrant {
                target: OverwriteTarget::Member(owner.id),
                allow: vec![Permission::ViewChannel, Permission::SendMessages],
                deny: vec![],
            }],
        )
    }

    async fn settle(&self) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.orchestrator.lifecycle().pending_jobs() > 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("cleanup jobs finished");
    }

    async fn webhook_calls(&self) -> usize {
        self.server.received_requests().await.map_or(0, |r| r.len())
    }
}

async fn mount_lookup(server: &MockServer, reply: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/webhook/lookup-user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply))
        .mount(server)
        .await;
}

#[tokio::test]
async fn claim_moves_ticket_into_new_working_forum() {
    let h = Harness::new().await;
    let source = h.discord.add_thread(h.unassigned, "KAN-1: Fix login", false);
    Mock::given(method("POST"))
        .and(path("/webhook/assign-ticket"))
        .and(body_partial_json(json!({
            "discordUserId": "7",
            "jiraTicketKey": "KAN-1",
            "threadId": source.0.to_string(),
            "action": "claim"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "summary": "Fix login",
            "description": "h1. Steps\n* reproduce",
            "priority": "High",
            "labels": ["auth"]
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let reply = h
        .orchestrator
        .handle_reaction(&h.reaction(source, &alice(), "✅"))
        .await
        .expect("claim handled");
    assert_eq!(reply.kind, ReplyKind::Success, "{reply}");
    h.settle().await;

    let forums = h.discord.forums_in(h.working);
    assert_eq!(forums.len(), 1);
    assert_eq!(forums[0].name, "tasks-alice");
    assert!(forums[0].grants_view_to(UserId(7)));

    let threads = h.discord.threads_in(forums[0].id);
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0].name, "KAN-1: Fix login");
    let messages = h.discord.messages_in(threads[0].id);
    assert_eq!(messages[1].content, "# Steps\n- reproduce");

    assert!(!h.discord.exists(source), "source thread is deleted after the claim");
}

#[tokio::test]
async fn claim_with_jira_shaped_fields_still_provisions() {
    let h = Harness::new().await;
    let source = h.discord.add_thread(h.unassigned, "KAN-55: Fix bug", false);
    Mock::given(method("POST"))
        .and(path("/webhook/assign-ticket"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "summary": "Fix bug",
            "labels": null,
            "priority": {"name": "High"},
            "description": {"type": "doc", "version": 1, "content": []}
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let reply = h
        .orchestrator
        .handle_reaction(&h.reaction(source, &alice(), "✅"))
        .await
        .expect("claim handled");
    assert_eq!(reply.kind, ReplyKind::Success, "{reply}");
    h.settle().await;

    let forums = h.discord.forums_in(h.working);
    assert_eq!(forums.len(), 1);
    let threads = h.discord.threads_in(forums[0].id);
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0].name, "KAN-55: Fix bug");
    assert!(!h.discord.exists(source));
}

#[tokio::test]
async fn rejected_claim_leaves_discord_alone() {
    let h = Harness::new().await;
    let source = h.discord.add_thread(h.unassigned, "KAN-1: Fix login", false);
    Mock::given(method("POST"))
        .and(path("/webhook/assign-ticket"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": "Ticket already assigned"
        })))
        .mount(&h.server)
        .await;

    let reply = h
        .orchestrator
        .handle_reaction(&h.reaction(source, &alice(), "✅"))
        .await
        .expect("claim handled");
    assert_eq!(reply.to_string(), "❌ Could not claim KAN-1: Ticket already assigned");
    assert!(h.discord.calls_of(Op::CreateForum).is_empty());
    assert!(h.discord.exists(source));
    assert_eq!(h.orchestrator.lifecycle().pending_jobs(), 0);
}

#[tokio::test]
async fn approve_requires_pm_role_before_any_backend_call() {
    let h = Harness::new().await;
    let review = h.discord.add_thread(h.review, "KAN-2: Ship it", false);

    let reply = h
        .orchestrator
        .handle_reaction(&h.reaction(review, &alice(), "✅"))
        .await
        .expect("approval handled");

    assert_eq!(reply.kind, ReplyKind::Failure);
    assert!(reply.text.contains("<@&77>"), "{reply}");
    assert_eq!(h.webhook_calls().await, 0);
    assert!(h.discord.exists(review));
}

#[tokio::test]
async fn deny_command_requires_pm_role_before_any_backend_call() {
    let h = Harness::new().await;
    let reply = h
        .orchestrator
        .dispatch_command(
            &alice(),
            Command::Task {
                action: TaskAction::Deny,
                ticket: "KAN-2".into(),
                reason: Some("nope".into()),
            },
        )
        .await;
    assert_eq!(reply.kind, ReplyKind::Failure);
    assert_eq!(h.webhook_calls().await, 0);
}

#[tokio::test]
async fn approve_cleans_up_and_files_completion() {
    let h = Harness::new().await;
    let own = h.working_forum(&alice());
    let working = h.discord.add_thread(own, "KAN-3: Feature", false);
    let review = h.discord.add_thread(h.review, "KAN-3: Feature", false);
    Mock::given(method("POST"))
        .and(path("/webhook/move-ticket"))
        .and(body_partial_json(json!({
            "jiraTicketKey": "KAN-3",
            "targetStatus": "Done",
            "approvedBy": "paula"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "summary": "Feature",
            "assignee": {"emailAddress": "alice@acme.io", "displayName": "Alice Smith"}
        })))
        .expect(1)
        .mount(&h.server)
        .await;
    mount_lookup(&h.server, json!({"success": true, "discordId": "7"})).await;

    let reply = h
        .orchestrator
        .handle_reaction(&h.reaction(review, &paula(), "✅"))
        .await
        .expect("approval handled");
    assert_eq!(reply.kind, ReplyKind::Success, "{reply}");
    h.settle().await;

    assert!(!h.discord.exists(working));
    assert!(!h.discord.exists(review));
    let completed = h.discord.forums_in(h.completed);
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].name, "tasks-alicesmith");
    assert_eq!(h.discord.threads_in(completed[0].id)[0].name, "KAN-3: Feature");
}

#[tokio::test]
async fn deny_with_unresolvable_assignee_still_completes() {
    let h = Harness::new().await;
    let other = h.working_forum(&alice());
    h.discord.add_thread(other, "KAN-40: unrelated", false);
    let review = h.discord.add_thread(h.review, "KAN-4: Work", false);
    Mock::given(method("POST"))
        .and(path("/webhook/move-ticket"))
        .and(body_partial_json(json!({"jiraTicketKey": "KAN-4", "targetStatus": "In Progress"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "assignee": {"emailAddress": "ghost@acme.io", "displayName": "Ghost"}
        })))
        .expect(1)
        .mount(&h.server)
        .await;
    mount_lookup(&h.server, json!({"success": true})).await;

    let reply = h
        .orchestrator
        .handle_reaction(&h.reaction(review, &paula(), "❌"))
        .await
        .expect("denial handled");
    assert_eq!(reply.kind, ReplyKind::Success, "{reply}");
    h.settle().await;

    assert!(!h.discord.exists(review), "review thread is retired");
    assert!(h.discord.calls_of(Op::SetArchived).is_empty());
}

#[tokio::test]
async fn deny_command_reopens_archived_thread_with_reason() {
    let h = Harness::new().await;
    let own = h.working_forum(&alice());
    let working = h.discord.add_thread(own, "KAN-5: Parser", true);
    let review = h.discord.add_thread(h.review, "KAN-5: Parser", false);
    Mock::given(method("POST"))
        .and(path("/webhook/move-ticket"))
        .and(body_partial_json(json!({
            "jiraTicketKey": "KAN-5",
            "targetStatus": "In Progress",
            "deniedBy": "paula",
            "reason": "missing tests"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "assignee": {"emailAddress": "alice@acme.io", "displayName": "Alice Smith"}
        })))
        .expect(1)
        .mount(&h.server)
        .await;
    mount_lookup(&h.server, json!({"success": true, "discordId": 7})).await;

    let reply = h
        .orchestrator
        .dispatch_command(
            &paula(),
            Command::Task {
                action: TaskAction::Deny,
                ticket: "KAN-5".into(),
                reason: Some("missing tests".into()),
            },
        )
        .await;
    assert_eq!(reply.kind, ReplyKind::Success, "{reply}");
    h.settle().await;

    assert!(!h.discord.thread(working).expect("working thread").archived);
    let notice = h
        .discord
        .messages_in(working)
        .into_iter()
        .find(|m| m.content.starts_with("<@7>"))
        .expect("denial notice");
    assert!(notice.content.contains("Reason: missing tests"));
    assert!(!h.discord.exists(review), "review thread found by key and retired");
}

#[tokio::test]
async fn key_is_read_from_browse_url_when_thread_name_lacks_it() {
    let h = Harness::new().await;
    let review = h.discord.add_thread(h.review, "Review request", false);
    let message = h.discord.add_message(
        review,
        OutgoingMessage::embed(
            Embed::new()
                .title("Please review")
                .url("https://acme.atlassian.net/browse/KAN-9"),
        ),
    );
    Mock::given(method("POST"))
        .and(path("/webhook/move-ticket"))
        .and(body_partial_json(json!({"jiraTicketKey": "KAN-9", "targetStatus": "Done"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&h.server)
        .await;

    let reply = h
        .orchestrator
        .handle_reaction(&h.reaction_on(review, message, &paula(), "✅"))
        .await
        .expect("approval handled");
    assert_eq!(reply.kind, ReplyKind::Success, "{reply}");
    h.settle().await;
}

#[tokio::test]
async fn submit_reaction_is_removed_and_review_thread_opened() {
    let h = Harness::new().await;
    let own = h.working_forum(&alice());
    let working = h.discord.add_thread(own, "KAN-6: Docs", false);
    Mock::given(method("POST"))
        .and(path("/webhook/move-ticket"))
        .and(body_partial_json(json!({
            "jiraTicketKey": "KAN-6",
            "targetStatus": "In Review",
            "submittedBy": "alice"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&h.server)
        .await;

    let reply = h
        .orchestrator
        .handle_reaction(&h.reaction(working, &alice(), ":clipboard:"))
        .await
        .expect("submission handled");
    assert_eq!(reply.kind, ReplyKind::Success, "{reply}");

    let removed = h.discord.calls_of(Op::RemoveReaction);
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].target, working.0);

    let reviews = h.discord.threads_in(h.review);
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].name, "KAN-6: Docs");
    let starter = &h.discord.messages_in(reviews[0].id)[0];
    assert!(starter.content.starts_with("<@&77>"));
}

#[tokio::test]
async fn submit_in_someone_elses_forum_is_ignored() {
    let h = Harness::new().await;
    let theirs = h.working_forum(&paula());
    let thread = h.discord.add_thread(theirs, "KAN-7: Not yours", false);

    let reply = h
        .orchestrator
        .handle_reaction(&h.reaction(thread, &alice(), "📋"))
        .await;
    assert!(reply.is_none());
    assert_eq!(h.webhook_calls().await, 0);
    assert!(h.discord.calls_of(Op::RemoveReaction).is_empty());
}

#[tokio::test]
async fn busy_ticket_short_circuits() {
    let h = Harness::new().await;
    let source = h.discord.add_thread(h.unassigned, "KAN-8: Busy", false);
    let _held = h
        .orchestrator
        .lock()
        .try_acquire(&key("KAN-8"), "claim")
        .expect("lock free");

    let reply = h
        .orchestrator
        .handle_reaction(&h.reaction(source, &alice(), "✅"))
        .await
        .expect("claim handled");
    assert_eq!(reply.kind, ReplyKind::Warning);
    assert!(reply.text.contains("already being processed"));
    assert_eq!(h.webhook_calls().await, 0);
}

#[tokio::test]
async fn bots_and_stray_emoji_are_ignored() {
    let h = Harness::new().await;
    let source = h.discord.add_thread(h.unassigned, "KAN-1: a", false);
    let bot = h.discord.bot().clone();

    assert!(h.orchestrator.handle_reaction(&h.reaction(source, &bot, "✅")).await.is_none());
    assert!(h.orchestrator.handle_reaction(&h.reaction(source, &alice(), "👍")).await.is_none());

    let helper = DiscordUser {
        id: UserId(50),
        username: "ci-bot".into(),
        display_name: None,
        bot: true,
    };
    h.discord.add_user(helper.clone(), vec![]);
    assert!(h.orchestrator.handle_reaction(&h.reaction(source, &helper, "✅")).await.is_none());
    assert_eq!(h.webhook_calls().await, 0);
}

#[tokio::test]
async fn unfetchable_message_aborts_silently() {
    let h = Harness::new().await;
    let source = h.discord.add_thread(h.unassigned, "KAN-1: a", false);
    h.discord.fail(Op::Message);

    assert!(h.orchestrator.handle_reaction(&h.reaction(source, &alice(), "✅")).await.is_none());
    assert_eq!(h.webhook_calls().await, 0);
}

#[tokio::test]
async fn quit_archives_working_thread() {
    let h = Harness::new().await;
    let own = h.working_forum(&alice());
    let working = h.discord.add_thread(own, "KAN-10: Refactor", false);
    Mock::given(method("POST"))
        .and(path("/webhook/quit-ticket"))
        .and(body_partial_json(json!({"jiraTicketKey": "KAN-10", "discordUserId": "7"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&h.server)
        .await;

    let reply = h
        .orchestrator
        .dispatch_command(
            &alice(),
            Command::Task {
                action: TaskAction::Quit,
                ticket: "KAN-10".into(),
                reason: None,
            },
        )
        .await;
    assert_eq!(reply.kind, ReplyKind::Success, "{reply}");
    h.settle().await;

    assert!(h.discord.thread(working).expect("thread kept").archived);
    assert!(h
        .discord
        .messages_in(working)
        .iter()
        .any(|m| m.content.contains("quit KAN-10")));
}

#[tokio::test]
async fn review_command_needs_own_thread() {
    let h = Harness::new().await;
    let theirs = h.working_forum(&paula());
    h.discord.add_thread(theirs, "KAN-11: Theirs", false);

    let reply = h
        .orchestrator
        .dispatch_command(
            &alice(),
            Command::Task {
                action: TaskAction::Review,
                ticket: "KAN-11".into(),
                reason: None,
            },
        )
        .await;
    assert_eq!(reply.kind, ReplyKind::Failure);
    assert_eq!(h.webhook_calls().await, 0);
}

#[tokio::test]
async fn malformed_input_never_reaches_backend() {
    let h = Harness::new().await;

    let reply = h
        .orchestrator
        .dispatch_command(
            &paula(),
            Command::Task {
                action: TaskAction::Done,
                ticket: "kan-1".into(),
                reason: None,
            },
        )
        .await;
    assert_eq!(reply.kind, ReplyKind::Failure);
    assert!(reply.text.contains("not a valid ticket key"));

    let reply = h
        .orchestrator
        .dispatch_command(&alice(), Command::Register { email: "not-an-email".into() })
        .await;
    assert_eq!(reply.kind, ReplyKind::Failure);

    let reply = h
        .orchestrator
        .dispatch_command(&alice(), Command::Tasks { status: Some("Blocked".into()) })
        .await;
    assert_eq!(reply.kind, ReplyKind::Failure);

    assert_eq!(h.webhook_calls().await, 0);
}

#[tokio::test]
async fn register_and_tasks_commands() {
    let h = Harness::new().await;
    Mock::given(method("POST"))
        .and(path("/webhook/register-user"))
        .and(body_partial_json(json!({"discordUserId": "7", "jiraEmail": "alice@acme.io"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "jiraEmail": "alice@acme.io"
        })))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/webhook/get-user-tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "tasks": [
                {"key": "KAN-1", "summary": "One", "status": "In Progress"},
                {"key": "KAN-2", "summary": "Two", "status": "To Do"}
            ]
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let reply = h
        .orchestrator
        .dispatch_command(&alice(), Command::Register { email: " alice@acme.io ".into() })
        .await;
    assert_eq!(reply.to_string(), "✅ Linked your Discord account to alice@acme.io");

    let reply = h
        .orchestrator
        .dispatch_command(&alice(), Command::Tasks { status: None })
        .await;
    assert_eq!(reply.kind, ReplyKind::Success);
    let to_do = reply.text.find("To Do").expect("to do group");
    let in_progress = reply.text.find("In Progress").expect("in progress group");
    assert!(to_do < in_progress);
}
