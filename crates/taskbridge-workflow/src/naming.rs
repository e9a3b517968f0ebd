// SPDX-FileCopyrightText: 2026 Taskbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canonical names for user forums and ticket threads.

use taskbridge_core::TicketKey;

/// Prefix of every per-user forum.
pub const FORUM_PREFIX: &str = "tasks-";

/// Maximum length, in characters, of the title part of a thread name.
pub const TITLE_LIMIT: usize = 90;

/// Lowercases and drops everything outside `[a-z0-9]`.
///
/// `"Test.User_123!"` becomes `"testuser123"`.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// Forum name for a user: `tasks-<sanitized>`.
pub fn forum_name(name: &str) -> String {
    format!("{FORUM_PREFIX}{}", sanitize(name))
}

/// Thread name for a ticket: `<KEY>: <title>`.
///
/// A title that already starts with `<KEY>: ` or `<KEY> ` is stripped first so
/// the key is not repeated, then cut to [`TITLE_LIMIT`] characters.
pub fn thread_name(key: &TicketKey, title: &str) -> String {
    let title = strip_key_prefix(key, title.trim()).trim();
    if title.is_empty() {
        return key.to_string();
    }
    let title: String = title.chars().take(TITLE_LIMIT).collect();
    format!("{key}: {}", title.trim_end())
}

/// The title part of a thread name, if it follows the `<KEY>: ` convention.
pub fn title_from_thread_name<'a>(key: &TicketKey, name: &'a str) -> Option<&'a str> {
    let title = name.strip_prefix(key.as_str())?.strip_prefix(':')?.trim();
    (!title.is_empty()).then_some(title)
}

fn strip_key_prefix<'a>(key: &TicketKey, title: &'a str) -> &'a str {
    let Some(rest) = title.strip_prefix(key.as_str()) else {
        return title;
    };
    rest.strip_prefix(": ")
        .or_else(|| rest.strip_prefix(' '))
        .unwrap_or(title)
}
