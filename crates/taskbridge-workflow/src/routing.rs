// SPDX-FileCopyrightText: 2026 Taskbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reaction routing: which emoji, in which forum, means which transition.

use strum::Display;
use taskbridge_core::TicketKey;
use taskbridge_core::types::Embed;

/// Emoji families the bot reacts to. Anything else is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum EmojiClass {
    /// Checkmark: claim in an unassigned forum, approve in review.
    Approve,
    /// Cross: deny in review.
    Deny,
    /// Clipboard: submit one's own work for review.
    Submit,
}

impl EmojiClass {
    /// Classifies a unicode glyph or a shortcode such as `white_check_mark`.
    pub fn from_emoji(emoji: &str) -> Option<Self> {
        let normalized: String = emoji
            .trim()
            .trim_matches(':')
            .chars()
            .filter(|c| *c != '\u{FE0F}')
            .collect();
        match normalized.as_str() {
            "✅" | "✔" | "☑" | "white_check_mark" | "heavy_check_mark" | "ballot_box_with_check" => {
                Some(Self::Approve)
            }
            "❌" | "✖" | "❎" | "x" | "heavy_multiplication_x" | "negative_squared_cross_mark" => {
                Some(Self::Deny)
            }
            "📋" | "clipboard" => Some(Self::Submit),
            _ => None,
        }
    }

    /// The canonical glyph the bot itself uses for this family.
    pub fn glyph(self) -> &'static str {
        match self {
            Self::Approve => "✅",
            Self::Deny => "❌",
            Self::Submit => "📋",
        }
    }
}

/// Where the reacted message's thread lives, relative to the actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ParentKind {
    Unassigned,
    Review,
    /// The actor's own working forum.
    OwnWorking,
    /// Someone else's working forum.
    OtherWorking,
    Unknown,
}

/// A workflow step a trigger maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Transition {
    Claim,
    Approve,
    Deny,
    SubmitReview,
}

impl Transition {
    /// Processing-lock action name.
    pub fn lock_action(self) -> &'static str {
        match self {
            Self::Claim => "claim",
            Self::Approve => "approve",
            Self::Deny => "deny",
            Self::SubmitReview => "submit_review",
        }
    }
}

/// Lock action for `/task quit`, which has no reaction form.
pub const QUIT_ACTION: &str = "quit";

/// Maps a reaction onto a transition. `None` means do nothing.
pub fn classify(emoji: EmojiClass, parent: ParentKind) -> Option<Transition> {
    match (emoji, parent) {
        (EmojiClass::Approve, ParentKind::Unassigned) => Some(Transition::Claim),
        (EmojiClass::Approve, ParentKind::Review) => Some(Transition::Approve),
        (EmojiClass::Deny, ParentKind::Review) => Some(Transition::Deny),
        (EmojiClass::Submit, ParentKind::OwnWorking) => Some(Transition::SubmitReview),
        _ => None,
    }
}

/// Finds the ticket a reacted message belongs to.
///
/// Tried in order: the thread name prefix, keys in embed titles, then Jira
/// browse URLs in embed links.
pub fn extract_ticket_key(thread_name: &str, embeds: &[Embed]) -> Option<TicketKey> {
    TicketKey::from_thread_name(thread_name)
        .or_else(|| {
            embeds
                .iter()
                .filter_map(|e| e.title.as_deref())
                .find_map(TicketKey::find_in)
        })
        .or_else(|| {
            embeds
                .iter()
                .filter_map(|e| e.url.as_deref())
                .find_map(TicketKey::from_browse_url)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emoji_aliases_are_grouped() {
        assert_eq!(EmojiClass::from_emoji("✅"), Some(EmojiClass::Approve));
        assert_eq!(EmojiClass::from_emoji("✔️"), Some(EmojiClass::Approve));
        assert_eq!(EmojiClass::from_emoji(":white_check_mark:"), Some(EmojiClass::Approve));
        assert_eq!(EmojiClass::from_emoji("❌"), Some(EmojiClass::Deny));
        assert_eq!(EmojiClass::from_emoji("x"), Some(EmojiClass::Deny));
        assert_eq!(EmojiClass::from_emoji("📋"), Some(EmojiClass::Submit));
        assert_eq!(EmojiClass::from_emoji("clipboard"), Some(EmojiClass::Submit));
        assert_eq!(EmojiClass::from_emoji("👍"), None);
    }

    #[test]
    fn classification_table() {
        use EmojiClass::*;
        use ParentKind::*;

        assert_eq!(classify(Approve, Unassigned), Some(Transition::Claim));
        assert_eq!(classify(Approve, Review), Some(Transition::Approve));
        assert_eq!(classify(Deny, Review), Some(Transition::Deny));
        assert_eq!(classify(Submit, OwnWorking), Some(Transition::SubmitReview));

        assert_eq!(classify(Submit, OtherWorking), None);
        assert_eq!(classify(Deny, Unassigned), None);
        assert_eq!(classify(Approve, OwnWorking), None);
        for emoji in [Approve, Deny, Submit] {
            assert_eq!(classify(emoji, Unknown), None);
        }
    }

    #[test]
    fn key_from_thread_name_wins() {
        let embeds = vec![Embed::new().title("KAN-2: other")];
        assert_eq!(
            extract_ticket_key("KAN-1: Fix login", &embeds).unwrap().as_str(),
            "KAN-1"
        );
    }

    #[test]
    fn key_from_embed_title() {
        let embeds = vec![Embed::new(), Embed::new().title("Ticket KAN-7 approved")];
        assert_eq!(
            extract_ticket_key("general chatter", &embeds).unwrap().as_str(),
            "KAN-7"
        );
    }

    #[test]
    fn key_from_browse_url() {
        let embeds = vec![Embed::new()
            .title("Fix login")
            .url("https://acme.atlassian.net/browse/KAN-99")];
        assert_eq!(
            extract_ticket_key("Fix login", &embeds).unwrap().as_str(),
            "KAN-99"
        );
    }

    #[test]
    fn no_key_anywhere() {
        let embeds = vec![Embed::new().title("hello").url("https://example.com")];
        assert!(extract_ticket_key("random thread", &embeds).is_none());
    }

    #[test]
    fn lock_actions() {
        assert_eq!(Transition::SubmitReview.lock_action(), "submit_review");
        assert_eq!(Transition::SubmitReview.to_string(), "submit_review");
    }
}
