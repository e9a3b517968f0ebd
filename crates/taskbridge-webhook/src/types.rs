// SPDX-FileCopyrightText: 2026 Taskbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request bodies and typed replies of the n8n webhook endpoints.
//!
//! Discord ids travel as strings. Replies are lenient: every field is
//! optional and unknown fields are ignored, since the backend owns the shape.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use taskbridge_core::{TicketKey, TicketStatus, UserId};

// --- Requests ---

/// Body of `POST /webhook/assign-ticket`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignTicket {
    pub discord_user_id: String,
    pub discord_username: String,
    pub discord_tag: String,
    pub jira_ticket_key: TicketKey,
    pub thread_id: String,
    pub action: &'static str,
}

impl AssignTicket {
    /// A claim of `key` by the given user, triggered from `thread_id`.
    pub fn claim(
        user_id: UserId,
        username: &str,
        tag: &str,
        key: &TicketKey,
        thread_id: impl ToString,
    ) -> Self {
        Self {
            discord_user_id: user_id.to_string(),
            discord_username: username.to_string(),
            discord_tag: tag.to_string(),
            jira_ticket_key: key.clone(),
            thread_id: thread_id.to_string(),
            action: "claim",
        }
    }
}

/// Body of `POST /webhook/move-ticket`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveTicket {
    pub jira_ticket_key: TicketKey,
    pub target_status: TicketStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denied_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discord_user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl MoveTicket {
    fn to(key: &TicketKey, target_status: TicketStatus) -> Self {
        Self {
            jira_ticket_key: key.clone(),
            target_status,
            approved_by: None,
            denied_by: None,
            submitted_by: None,
            discord_user_id: None,
            reason: None,
        }
    }

    /// Review approved: the ticket moves to Done.
    pub fn approve(key: &TicketKey, approver: &str, approver_id: UserId) -> Self {
        Self {
            approved_by: Some(approver.to_string()),
            discord_user_id: Some(approver_id.to_string()),
            ..Self::to(key, TicketStatus::Done)
        }
    }

    /// Review denied: the ticket goes back to In Progress.
    pub fn deny(key: &TicketKey, denier: &str, denier_id: UserId, reason: Option<&str>) -> Self {
        Self {
            denied_by: Some(denier.to_string()),
            discord_user_id: Some(denier_id.to_string()),
            reason: reason.map(str::to_string),
            ..Self::to(key, TicketStatus::InProgress)
        }
    }

    /// Work submitted for review.
    pub fn submit(key: &TicketKey, submitter: &str, submitter_id: UserId) -> Self {
        Self {
            submitted_by: Some(submitter.to_string()),
            discord_user_id: Some(submitter_id.to_string()),
            ..Self::to(key, TicketStatus::InReview)
        }
    }
}

/// Body of `POST /webhook/register-user`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUser {
    pub discord_user_id: String,
    pub discord_username: String,
    pub jira_email: String,
}

/// Body of `DELETE /webhook/register-user`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnregisterUser {
    pub discord_user_id: String,
}

/// Body of `POST /webhook/lookup-user`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupUser {
    pub jira_email: String,
}

/// Body of `POST /webhook/quit-ticket`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuitTicket {
    pub jira_ticket_key: TicketKey,
    pub discord_user_id: String,
    pub discord_username: String,
}

// --- Replies ---

/// Any present value that does not fit `T`, `null` included, becomes
/// `T::default()`.
fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// A plain string, or a Jira object naming itself (`{"name": "High"}`).
fn named_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Object(map) => map
            .get("name")
            .or_else(|| map.get("value"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    })
}

/// Ticket details returned once a claim succeeds.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AssignedTicket {
    #[serde(deserialize_with = "or_default")]
    pub summary: Option<String>,
    /// Rich-text (ADF) descriptions are not rendered and read as absent.
    #[serde(deserialize_with = "or_default")]
    pub description: Option<String>,
    #[serde(deserialize_with = "named_string")]
    pub priority: Option<String>,
    #[serde(deserialize_with = "or_default")]
    pub labels: Vec<String>,
}

/// Jira's view of an assignee.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Assignee {
    #[serde(deserialize_with = "or_default")]
    pub email_address: Option<String>,
    #[serde(deserialize_with = "or_default")]
    pub display_name: Option<String>,
    #[serde(deserialize_with = "or_default")]
    pub name: Option<String>,
}

impl Assignee {
    /// Best human-readable name: display name, then account name, then email.
    pub fn label(&self) -> Option<&str> {
        self.display_name
            .as_deref()
            .or(self.name.as_deref())
            .or(self.email_address.as_deref())
    }
}

/// Result of a status move.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MovedTicket {
    #[serde(deserialize_with = "or_default")]
    pub summary: Option<String>,
    #[serde(deserialize_with = "or_default")]
    pub assignee: Option<Assignee>,
}

/// A user's email registration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Registration {
    #[serde(deserialize_with = "or_default")]
    pub jira_email: Option<String>,
    #[serde(deserialize_with = "or_default")]
    pub registered_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct LookupUserReply {
    pub discord_id: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct Empty {}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct UserTasksReply {
    #[serde(deserialize_with = "or_default")]
    pub tasks: Vec<TaskSummary>,
}

/// One entry of `/webhook/get-user-tasks`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaskSummary {
    pub key: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub status: String,
}

impl TaskSummary {
    /// The status as a known workflow state, if it is one.
    pub fn known_status(&self) -> Option<TicketStatus> {
        self.status.parse().ok()
    }
}
