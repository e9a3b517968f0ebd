// SPDX-FileCopyrightText: 2026 Taskbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed endpoint behaviour against a mocked n8n instance.

use std::time::Duration;

use serde_json::json;
use taskbridge_config::model::WebhookConfig;
use taskbridge_core::{TaskbridgeError, TicketKey, TicketStatus, UserId};
use taskbridge_webhook::{AssignTicket, MoveTicket, WebhookClient};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> WebhookClient {
    WebhookClient::new(&WebhookConfig::default())
        .expect("client")
        .with_base_url(server.uri())
        .with_retry_base_delay(Duration::from_millis(5))
}

fn key(s: &str) -> TicketKey {
    TicketKey::parse(s).expect("valid key")
}

#[tokio::test]
async fn assign_ticket_returns_ticket_details() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook/assign-ticket"))
        .and(body_partial_json(json!({"jiraTicketKey": "KAN-55", "action": "claim"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "summary": "Fix bug",
            "priority": "High",
            "labels": ["backend"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = AssignTicket::claim(UserId(1), "alice", "alice", &key("KAN-55"), 10u64);
    let ticket = client(&server).assign_ticket(&request).await.expect("assigned");
    assert_eq!(ticket.summary.as_deref(), Some("Fix bug"));
    assert_eq!(ticket.priority.as_deref(), Some("High"));
    assert_eq!(ticket.labels, vec!["backend".to_string()]);
    assert!(ticket.description.is_none());
}

#[tokio::test]
async fn assign_ticket_accepts_nulls_and_jira_objects() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook/assign-ticket"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "summary": "Fix bug",
            "labels": null,
            "priority": {"id": "3", "name": "Medium"},
            "description": {"type": "doc", "version": 1, "content": []}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = AssignTicket::claim(UserId(1), "alice", "alice", &key("KAN-55"), 10u64);
    let ticket = client(&server).assign_ticket(&request).await.expect("assigned");
    assert_eq!(ticket.summary.as_deref(), Some("Fix bug"));
    assert_eq!(ticket.priority.as_deref(), Some("Medium"));
    assert!(ticket.labels.is_empty());
    assert!(ticket.description.is_none());
}

#[tokio::test]
async fn move_ticket_success_survives_unexpected_assignee_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook/move-ticket"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "summary": "Fix bug",
            "assignee": "alice@example.com"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let moved = client(&server)
        .move_ticket(&MoveTicket::approve(&key("KAN-5"), "paula", UserId(8)))
        .await
        .expect("moved");
    assert_eq!(moved.summary.as_deref(), Some("Fix bug"));
    assert!(moved.assignee.is_none());
}

#[tokio::test]
async fn move_ticket_failure_carries_backend_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook/move-ticket"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": "Transition not allowed"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server)
        .move_ticket(&MoveTicket::approve(&key("KAN-1"), "pm", UserId(2)))
        .await
        .unwrap_err();
    assert!(matches!(err, TaskbridgeError::Webhook { .. }));
    assert_eq!(err.to_string(), "Transition not allowed");
}

#[tokio::test]
async fn lookup_user_parses_string_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook/lookup-user"))
        .and(body_partial_json(json!({"jiraEmail": "alice@x.com"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "discordId": "4242"})),
        )
        .mount(&server)
        .await;

    assert_eq!(client(&server).lookup_user("alice@x.com").await, Some(UserId(4242)));
}

#[tokio::test]
async fn lookup_user_without_id_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook/lookup-user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .mount(&server)
        .await;

    assert_eq!(client(&server).lookup_user("ghost@x.com").await, None);
}

#[tokio::test]
async fn lookup_registration_sends_lookup_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/webhook/register-user"))
        .and(query_param("discordUserId", "9"))
        .and(query_param("action", "lookup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "jiraEmail": "bob@x.com",
            "registeredAt": "2026-01-02T03:04:05Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let registration = client(&server).lookup_registration(UserId(9)).await.expect("found");
    assert_eq!(registration.jira_email.as_deref(), Some("bob@x.com"));
    assert_eq!(registration.registered_at.as_deref(), Some("2026-01-02T03:04:05Z"));
}

#[tokio::test]
async fn unregister_uses_delete() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/webhook/register-user"))
        .and(body_partial_json(json!({"discordUserId": "9"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).unregister_user(UserId(9)).await.expect("unregistered");
}

#[tokio::test]
async fn user_tasks_filters_by_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/webhook/get-user-tasks"))
        .and(query_param("status", "In Progress"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "tasks": [{"key": "KAN-3", "summary": "Write docs", "status": "In Progress"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tasks = client(&server)
        .user_tasks(UserId(9), Some(TicketStatus::InProgress))
        .await
        .expect("tasks");
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].key, "KAN-3");
    assert_eq!(tasks[0].known_status(), Some(TicketStatus::InProgress));
}

#[tokio::test]
async fn quit_ticket_exhausted_retries_is_webhook_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook/quit-ticket"))
        .respond_with(ResponseTemplate::new(502))
        .expect(3)
        .mount(&server)
        .await;

    let err = client(&server)
        .quit_ticket(&key("KAN-8"), UserId(1), "alice")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("failed after 3 attempts"), "got: {err}");
}
