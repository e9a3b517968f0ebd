// SPDX-FileCopyrightText: 2026 Taskbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Best-effort thread cleanup.
//!
//! By the time these run, Jira has already moved the ticket. Discord is only
//! a projection, so every operation here logs its failures and reports a
//! boolean at most. Delayed work is modelled as a [`CleanupJob`] running on a
//! tokio timer; jobs are not cancellable and a shutdown abandons them.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use taskbridge_core::types::Thread;
use taskbridge_core::{ChannelId, DiscordApi, GuildId, TicketKey};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::hints::ThreadHints;
use crate::resolver::search_forum;

/// What a scheduled job does when its delay elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupAction {
    /// Delete the thread; on failure archive it if `fallback_to_archive`.
    Delete { fallback_to_archive: bool },
    Archive,
}

/// A deferred cleanup of one thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupJob {
    pub thread: ChannelId,
    pub reason: String,
    pub delay: Duration,
    pub action: CleanupAction,
}

/// How a cleanup job ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupOutcome {
    Deleted,
    Archived,
    Failed,
}

#[derive(Clone)]
pub struct ThreadLifecycle {
    discord: Arc<dyn DiscordApi>,
    guild: GuildId,
    hints: Arc<ThreadHints>,
    pending: Arc<AtomicUsize>,
}

impl ThreadLifecycle {
    pub fn new(discord: Arc<dyn DiscordApi>, guild: GuildId, hints: Arc<ThreadHints>) -> Self {
        Self {
            discord,
            guild,
            hints,
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Jobs scheduled but not yet finished.
    pub fn pending_jobs(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Runs `job` after its delay on a background task.
    pub fn schedule(&self, job: CleanupJob) -> JoinHandle<CleanupOutcome> {
        debug!(thread = %job.thread, reason = %job.reason, delay_ms = job.delay.as_millis() as u64, action = ?job.action, "scheduled thread cleanup");
        self.hints.invalidate_thread(job.thread);
        self.pending.fetch_add(1, Ordering::SeqCst);

        let this = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(job.delay).await;
            let outcome = this.run(&job).await;
            this.pending.fetch_sub(1, Ordering::SeqCst);
            outcome
        })
    }

    /// Deletes `thread` after `delay`, archiving it instead when deletion
    /// fails and `fallback_to_archive` is set.
    pub fn delete_with_delay(
        &self,
        thread: ChannelId,
        reason: &str,
        delay: Duration,
        fallback_to_archive: bool,
    ) -> JoinHandle<CleanupOutcome> {
        self.schedule(CleanupJob {
            thread,
            reason: reason.to_string(),
            delay,
            action: CleanupAction::Delete {
                fallback_to_archive,
            },
        })
    }

    /// Archives `thread` after `delay`.
    pub fn archive_with_delay(&self, thread: ChannelId, delay: Duration) -> JoinHandle<CleanupOutcome> {
        self.schedule(CleanupJob {
            thread,
            reason: "archive".to_string(),
            delay,
            action: CleanupAction::Archive,
        })
    }

    /// Executes a job immediately.
    pub async fn run(&self, job: &CleanupJob) -> CleanupOutcome {
        self.hints.invalidate_thread(job.thread);
        match job.action {
            CleanupAction::Archive => {
                if self.archive(job.thread).await {
                    CleanupOutcome::Archived
                } else {
                    CleanupOutcome::Failed
                }
            }
            CleanupAction::Delete {
                fallback_to_archive,
            } => match self.discord.delete_channel(job.thread).await {
                Ok(()) => {
                    info!(thread = %job.thread, reason = %job.reason, "deleted thread");
                    CleanupOutcome::Deleted
                }
                Err(e) if fallback_to_archive => {
                    warn!(thread = %job.thread, reason = %job.reason, error = %e, "thread delete failed, archiving instead");
                    if self.archive(job.thread).await {
                        CleanupOutcome::Archived
                    } else {
                        CleanupOutcome::Failed
                    }
                }
                Err(e) => {
                    warn!(thread = %job.thread, reason = %job.reason, error = %e, "thread delete failed");
                    CleanupOutcome::Failed
                }
            },
        }
    }

    pub async fn archive(&self, thread: ChannelId) -> bool {
        self.set_archived(thread, true).await
    }

    pub async fn unarchive(&self, thread: ChannelId) -> bool {
        self.set_archived(thread, false).await
    }

    async fn set_archived(&self, thread: ChannelId, archived: bool) -> bool {
        self.hints.invalidate_thread(thread);
        match self.discord.set_archived(thread, archived).await {
            Ok(()) => {
                debug!(%thread, archived, "updated thread archive state");
                true
            }
            Err(e) => {
                warn!(%thread, archived, error = %e, "could not update thread archive state");
                false
            }
        }
    }

    /// The ticket's thread in a known forum, active first then archived.
    pub async fn find_thread(&self, forum: ChannelId, key: &TicketKey) -> Option<Thread> {
        match search_forum(self.discord.as_ref(), self.guild, forum, key).await {
            Ok(thread) => thread,
            Err(e) => {
                warn!(%forum, ticket = %key, error = %e, "could not search forum");
                None
            }
        }
    }
}
