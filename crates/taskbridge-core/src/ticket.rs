// SPDX-FileCopyrightText: 2026 Taskbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Jira ticket identity and status, plus the input validators applied before
//! any network call.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::TaskbridgeError;

static TICKET_KEY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z]+-\d+$").unwrap());

static EMBEDDED_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z]+-\d+)\b").unwrap());

static BROWSE_URL_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/browse/([A-Z]+-\d+)").unwrap());

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// A validated Jira issue key such as `KAN-123`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TicketKey(String);

impl TicketKey {
    /// Parses a ticket key, accepting surrounding whitespace but nothing else.
    pub fn parse(input: &str) -> Result<Self, TaskbridgeError> {
        let trimmed = input.trim();
        if TICKET_KEY.is_match(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(TaskbridgeError::Validation(format!(
                "`{trimmed}` is not a valid ticket key (expected something like KAN-123)"
            )))
        }
    }

    /// Extracts the key a thread name starts with (`KAN-55: Fix bug` → `KAN-55`).
    pub fn from_thread_name(name: &str) -> Option<Self> {
        let candidate: String = name
            .trim_start()
            .chars()
            .take_while(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || *c == '-')
            .collect();
        TICKET_KEY.is_match(&candidate).then_some(Self(candidate))
    }

    /// Finds the first key embedded anywhere in free text, such as an embed title.
    pub fn find_in(text: &str) -> Option<Self> {
        EMBEDDED_KEY
            .captures(text)
            .map(|caps| Self(caps[1].to_string()))
    }

    /// Extracts the key from a Jira browse URL (`https://x/browse/KAN-9`).
    pub fn from_browse_url(url: &str) -> Option<Self> {
        BROWSE_URL_KEY
            .captures(url)
            .map(|caps| Self(caps[1].to_string()))
    }

    /// Returns true when a thread name represents this ticket.
    ///
    /// The name must start with the key and the key must not continue with
    /// another digit, so `KAN-5` does not match `KAN-55: ...`.
    pub fn matches_thread_name(&self, name: &str) -> bool {
        name.strip_prefix(self.0.as_str())
            .is_some_and(|rest| !rest.starts_with(|c: char| c.is_ascii_digit()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The project part of the key (`KAN` for `KAN-123`).
    pub fn project(&self) -> &str {
        self.0.split('-').next().unwrap_or_default()
    }
}

impl fmt::Display for TicketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TicketKey {
    type Error = TaskbridgeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TicketKey> for String {
    fn from(key: TicketKey) -> Self {
        key.0
    }
}

/// Workflow status of a ticket, using Jira's exact status names on the wire.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum TicketStatus {
    #[strum(to_string = "To Do", serialize = "todo")]
    #[serde(rename = "To Do")]
    ToDo,
    #[strum(to_string = "In Progress", serialize = "inprogress")]
    #[serde(rename = "In Progress")]
    InProgress,
    #[strum(to_string = "In Review", serialize = "inreview")]
    #[serde(rename = "In Review")]
    InReview,
    #[strum(to_string = "Done", serialize = "done")]
    #[serde(rename = "Done")]
    Done,
}

impl TicketStatus {
    /// Glyph used when listing tasks grouped by status.
    pub fn glyph(self) -> &'static str {
        match self {
            Self::ToDo => "📝",
            Self::InProgress => "🔨",
            Self::InReview => "👀",
            Self::Done => "✅",
        }
    }
}

/// Validates an email address before it is sent to the backend.
pub fn validate_email(email: &str) -> Result<(), TaskbridgeError> {
    if EMAIL.is_match(email.trim()) {
        Ok(())
    } else {
        Err(TaskbridgeError::Validation(format!(
            "`{}` is not a valid email address",
            email.trim()
        )))
    }
}
