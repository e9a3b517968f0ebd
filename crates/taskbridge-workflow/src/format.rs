// SPDX-FileCopyrightText: 2026 Taskbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User-facing text: glyph-prefixed replies and Jira wiki markup conversion.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use taskbridge_core::TaskbridgeError;

/// Tone of a reply, rendered as a leading glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    Success,
    Failure,
    Warning,
}

impl ReplyKind {
    pub fn glyph(self) -> &'static str {
        match self {
            Self::Success => "✅",
            Self::Failure => "❌",
            Self::Warning => "⚠️",
        }
    }
}

/// A message sent back to the user who triggered a workflow step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub kind: ReplyKind,
    pub text: String,
}

impl Reply {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: ReplyKind::Success,
            text: text.into(),
        }
    }

    pub fn failure(text: impl Into<String>) -> Self {
        Self {
            kind: ReplyKind::Failure,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            kind: ReplyKind::Warning,
            text: text.into(),
        }
    }

    /// Renders an error for the user, keeping its message verbatim.
    ///
    /// A busy lock is a warning; everything else is a failure prefixed with
    /// what was being attempted.
    pub fn from_error(context: &str, err: &TaskbridgeError) -> Self {
        match err {
            TaskbridgeError::Busy { .. } => Self::warning(err.to_string()),
            TaskbridgeError::Validation(_) | TaskbridgeError::Permission(_) => {
                Self::failure(err.to_string())
            }
            _ => Self::failure(format!("{context}: {err}")),
        }
    }

    pub fn is_success(&self) -> bool {
        self.kind == ReplyKind::Success
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.glyph(), self.text)
    }
}

/// Cuts `text` to `limit` characters, appending `suffix` when anything was cut.
pub fn truncate_with_suffix(text: &str, limit: usize, suffix: &str) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(limit).collect();
    cut.truncate(cut.trim_end().len());
    cut.push_str(suffix);
    cut
}

static HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^h([1-6])\.\s+(.*)$").unwrap());
static BULLET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([*-]+)\s+(.*)$").unwrap());
static NUMBERED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(#+)\s+(.*)$").unwrap());
static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\{(code|noformat)(?::([^}|]*))?[^}]*\}(.*)$").unwrap());
static MONOSPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{(.+?)\}\}").unwrap());
static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*\s](?:[^*\n]*[^*\s])?)\*").unwrap());
static ITALIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|[\s(])_([^_\s](?:[^_\n]*[^_\s])?)_($|[\s).,!?:;])").unwrap()
});
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\[\]|]+)\|([^\[\]]+)\]").unwrap());
static BARE_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(https?://[^\[\]|\s]+)\]").unwrap());
static COLOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{color(?::[^}]*)?\}").unwrap());

/// Converts Jira wiki markup to Discord markdown.
///
/// Covers headings, bold and italic, monospace, code and noformat blocks,
/// links, bullet and numbered lists, and block quotes. Text inside code
/// blocks is left untouched; unknown markup passes through.
pub fn jira_to_markdown(input: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut in_code = false;
    let mut in_quote = false;

    for raw in input.lines() {
        let line = raw.trim_end();

        if in_code {
            if let Some(pos) = line.find("{code}").or_else(|| line.find("{noformat}")) {
                let before = &line[..pos];
                if !before.is_empty() {
                    out.push(before.to_string());
                }
                out.push("```".to_string());
                in_code = false;
            } else {
                out.push(raw.to_string());
            }
            continue;
        }

        if let Some(caps) = CODE_FENCE.captures(line) {
            let lang = caps.get(2).map_or("", |m| m.as_str().trim());
            out.push(format!("```{lang}"));
            let rest = caps.get(3).map_or("", |m| m.as_str());
            if let Some(inner) = rest
                .strip_suffix("{code}")
                .or_else(|| rest.strip_suffix("{noformat}"))
            {
                if !inner.is_empty() {
                    out.push(inner.to_string());
                }
                out.push("```".to_string());
            } else {
                if !rest.is_empty() {
                    out.push(rest.to_string());
                }
                in_code = true;
            }
            continue;
        }

        if line.trim() == "{quote}" {
            in_quote = !in_quote;
            continue;
        }

        let converted = convert_line(line);
        if in_quote {
            out.push(format!("> {converted}"));
        } else {
            out.push(converted);
        }
    }

    if in_code {
        out.push("```".to_string());
    }
    out.join("\n").trim().to_string()
}

fn convert_line(line: &str) -> String {
    if let Some(caps) = HEADING.captures(line) {
        let level: usize = caps[1].parse().unwrap_or(1);
        let text = convert_inline(&caps[2]);
        return if level <= 3 {
            format!("{} {text}", "#".repeat(level))
        } else {
            format!("**{text}**")
        };
    }
    if let Some(text) = line.strip_prefix("bq. ") {
        return format!("> {}", convert_inline(text));
    }
    if let Some(caps) = BULLET.captures(line) {
        let depth = caps[1].len();
        return format!("{}- {}", "  ".repeat(depth - 1), convert_inline(&caps[2]));
    }
    if let Some(caps) = NUMBERED.captures(line) {
        let depth = caps[1].len();
        return format!("{}1. {}", "  ".repeat(depth - 1), convert_inline(&caps[2]));
    }
    if line.trim() == "----" {
        return "───".to_string();
    }
    convert_inline(line)
}

fn convert_inline(text: &str) -> String {
    let text = COLOR.replace_all(text, "");
    let text = MONOSPACE.replace_all(&text, "`$1`");
    let text = LINK.replace_all(&text, "[$1]($2)");
    let text = BARE_LINK.replace_all(&text, "<$1>");
    let text = BOLD.replace_all(&text, "**$1**");
    let text = ITALIC.replace_all(&text, "$1*$2*$3");
    text.into_owned()
}
