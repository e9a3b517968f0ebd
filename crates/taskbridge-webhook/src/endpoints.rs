// SPDX-FileCopyrightText: 2026 Taskbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed wrappers over the individual n8n webhooks.

use reqwest::Method;
use taskbridge_core::{TaskbridgeError, TicketKey, TicketStatus, UserId};
use tracing::{debug, warn};

use crate::client::{RequestOptions, WebhookClient};
use crate::types::{
    AssignTicket, AssignedTicket, Empty, LookupUser, LookupUserReply, MoveTicket, MovedTicket,
    QuitTicket, RegisterUser, Registration, TaskSummary, UnregisterUser, UserTasksReply,
};

pub const ASSIGN_TICKET: &str = "/webhook/assign-ticket";
pub const MOVE_TICKET: &str = "/webhook/move-ticket";
pub const REGISTER_USER: &str = "/webhook/register-user";
pub const LOOKUP_USER: &str = "/webhook/lookup-user";
pub const QUIT_TICKET: &str = "/webhook/quit-ticket";
pub const GET_USER_TASKS: &str = "/webhook/get-user-tasks";

fn body<T: serde::Serialize>(value: &T) -> Result<RequestOptions, TaskbridgeError> {
    serde_json::to_value(value)
        .map(RequestOptions::json)
        .map_err(|e| TaskbridgeError::Internal(format!("failed to encode webhook body: {e}")))
}

impl WebhookClient {
    /// Assigns a ticket to the claiming user.
    pub async fn assign_ticket(&self, request: &AssignTicket) -> Result<AssignedTicket, TaskbridgeError> {
        self.execute(Method::POST, ASSIGN_TICKET, body(request)?)
            .await
            .into_result()
    }

    /// Moves a ticket to a new status.
    pub async fn move_ticket(&self, request: &MoveTicket) -> Result<MovedTicket, TaskbridgeError> {
        self.execute(Method::POST, MOVE_TICKET, body(request)?)
            .await
            .into_result()
    }

    /// Links a Discord user to a Jira email.
    pub async fn register_user(
        &self,
        user_id: UserId,
        username: &str,
        email: &str,
    ) -> Result<Registration, TaskbridgeError> {
        let request = RegisterUser {
            discord_user_id: user_id.to_string(),
            discord_username: username.to_string(),
            jira_email: email.to_string(),
        };
        self.execute(Method::POST, REGISTER_USER, body(&request)?)
            .await
            .into_result()
    }

    /// Removes a Discord user's email link.
    pub async fn unregister_user(&self, user_id: UserId) -> Result<Registration, TaskbridgeError> {
        let request = UnregisterUser {
            discord_user_id: user_id.to_string(),
        };
        self.execute(Method::DELETE, REGISTER_USER, body(&request)?)
            .await
            .into_result()
    }

    /// Looks up the registration of a Discord user.
    pub async fn lookup_registration(&self, user_id: UserId) -> Result<Registration, TaskbridgeError> {
        let options = RequestOptions::query([
            ("discordUserId", user_id.to_string()),
            ("action", "lookup".to_string()),
        ]);
        self.execute(Method::GET, REGISTER_USER, options)
            .await
            .into_result()
    }

    /// Maps a Jira email back to a Discord user.
    ///
    /// An unknown email, a backend failure, and an unparseable id all come
    /// back as `None`: the caller falls back to searching by content.
    pub async fn lookup_user(&self, email: &str) -> Option<UserId> {
        let request = LookupUser {
            jira_email: email.to_string(),
        };
        let options = match body(&request) {
            Ok(options) => options,
            Err(e) => {
                warn!(error = %e, "skipping user lookup");
                return None;
            }
        };
        let reply: LookupUserReply = match self
            .execute(Method::POST, LOOKUP_USER, options)
            .await
            .into_result()
        {
            Ok(reply) => reply,
            Err(e) => {
                debug!(email, error = %e, "user lookup failed");
                return None;
            }
        };

        let id = match reply.discord_id? {
            serde_json::Value::String(s) => s.parse().ok(),
            serde_json::Value::Number(n) => n.as_u64(),
            _ => None,
        };
        if id.is_none() {
            debug!(email, "no Discord account linked to email");
        }
        id.map(UserId)
    }

    /// Unassigns a ticket from the quitting user.
    pub async fn quit_ticket(
        &self,
        key: &TicketKey,
        user_id: UserId,
        username: &str,
    ) -> Result<(), TaskbridgeError> {
        let request = QuitTicket {
            jira_ticket_key: key.clone(),
            discord_user_id: user_id.to_string(),
            discord_username: username.to_string(),
        };
        self.execute(Method::POST, QUIT_TICKET, body(&request)?)
            .await
            .into_result::<Empty>()
            .map(|_| ())
    }

    /// Lists the tickets assigned to a user, optionally filtered by status.
    pub async fn user_tasks(
        &self,
        user_id: UserId,
        status: Option<TicketStatus>,
    ) -> Result<Vec<TaskSummary>, TaskbridgeError> {
        let mut query = vec![("discordUserId".to_string(), user_id.to_string())];
        if let Some(status) = status {
            query.push(("status".to_string(), status.to_string()));
        }
        let options = RequestOptions { body: None, query };
        self.execute(Method::GET, GET_USER_TASKS, options)
            .await
            .into_result::<UserTasksReply>()
            .map(|reply| reply.tasks)
    }
}
