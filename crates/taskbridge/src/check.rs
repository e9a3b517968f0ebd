// SPDX-FileCopyrightText: 2026 Taskbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `taskbridge check-config` output.

use taskbridge_config::TaskbridgeConfig;

fn id(value: Option<u64>) -> String {
    value.map_or_else(|| "(unset)".to_string(), |v| v.to_string())
}

/// Human-readable summary of a validated configuration. The bot token is
/// never printed.
pub fn summary(config: &TaskbridgeConfig) -> String {
    let discord = &config.discord;
    let webhook = &config.webhook;
    let workflow = &config.workflow;

    let unassigned = discord
        .unassigned_forum_ids
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(", ");

    let mut out = format!("configuration OK ({})\n", config.bot.name);
    out.push_str(&format!("  log level:           {}\n", config.bot.log_level));
    out.push_str(&format!("  guild:               {}\n", id(discord.guild_id)));
    out.push_str(&format!("  unassigned forums:   {unassigned}\n"));
    out.push_str(&format!("  review forum:        {}\n", id(discord.review_forum_id)));
    out.push_str(&format!("  working category:    {}\n", id(discord.working_category_id)));
    out.push_str(&format!("  completed category:  {}\n", id(discord.completed_category_id)));
    out.push_str(&format!("  PM role:             {}\n", id(discord.pm_role_id)));
    out.push_str(&format!("  register commands:   {}\n", discord.register_commands));
    out.push_str(&format!(
        "  webhook:             {} ({} attempts, {}s timeout)\n",
        webhook.base_url, webhook.max_attempts, webhook.timeout_secs
    ));
    out.push_str(&format!(
        "  jira browse url:     {}\n",
        webhook.jira_browse_url.as_deref().unwrap_or("(unset)")
    ));
    out.push_str(&format!(
        "  cleanup delays:      {}ms / {}ms / {}ms",
        workflow.short_delay_ms, workflow.medium_delay_ms, workflow.long_delay_ms
    ));
    out
}
