//! Reduction of raw store records into the published thread list.
//!
//! The list changes through [`ListEvent`]s only. Local user actions produce
//! `Created` / `Deleted`; refreshes produce `Refreshed` / `RefreshFailed`.
//! A successful refresh replaces whatever local patches were applied before.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use super::config::TitleRules;
use super::ids::ThreadId;
use super::title::derive_title;
use super::types::{ChatRecord, ThreadSummary};

/// Group records by thread and derive one summary per thread, newest first.
///
/// The first record seen for a thread determines its title. The timestamp is
/// the latest activity time across the thread's records, or now when none has one.
#[must_use]
pub fn summarize_records(records: &[ChatRecord], rules: &TitleRules) -> Vec<ThreadSummary> {
    let mut index: HashMap<&ThreadId, usize> = HashMap::new();
    let mut grouped: Vec<(ThreadId, String, Option<DateTime<Utc>>)> = Vec::new();

    for record in records {
        let at = record.activity_time();
        if let Some(&slot) = index.get(&record.thread_id) {
            let latest = &mut grouped[slot].2;
            *latest = (*latest).max(at);
        } else {
            index.insert(&record.thread_id, grouped.len());
            grouped.push((record.thread_id.clone(), derive_title(record, rules), at));
        }
    }

    let now = Utc::now();
    let mut threads: Vec<ThreadSummary> = grouped
        .into_iter()
        .map(|(thread_id, title, at)| ThreadSummary {
            thread_id,
            title,
            timestamp: at.unwrap_or(now),
        })
        .collect();

    sort_newest_first(&mut threads);
    threads
}

/// Stable sort by timestamp, most recent first.
pub fn sort_newest_first(threads: &mut [ThreadSummary]) {
    threads.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

/// Demo threads shown when a refresh fails and placeholders are enabled.
#[must_use]
pub fn placeholder_threads() -> Vec<ThreadSummary> {
    let now = Utc::now();
    [
        ("placeholder-welcome", "Welcome to the chat"),
        ("placeholder-start", "Getting started"),
        ("placeholder-example", "Example conversation"),
    ]
    .into_iter()
    .zip(0_i64..)
    .map(|((id, title), age)| ThreadSummary {
        thread_id: ThreadId::new(id),
        title: title.to_string(),
        timestamp: now - Duration::minutes(age),
    })
    .collect()
}

/// Something that changes the published thread list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListEvent {
    /// A refresh succeeded; the server's view replaces the list.
    Refreshed(Vec<ThreadSummary>),
    /// A refresh failed; the list is kept, or replaced by placeholders.
    RefreshFailed {
        /// Threads to show instead, when placeholders are enabled.
        placeholder: Option<Vec<ThreadSummary>>,
    },
    /// A thread was created locally.
    Created(ThreadSummary),
    /// A thread was deleted on the server.
    Deleted(ThreadId),
}

/// The published, deduplicated thread list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ThreadList {
    threads: Vec<ThreadSummary>,
}

impl ThreadList {
    /// Create an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            threads: Vec::new(),
        }
    }

    /// Apply an event to the list.
    pub fn apply(&mut self, event: ListEvent) {
        match event {
            ListEvent::Refreshed(threads) | ListEvent::RefreshFailed {
                placeholder: Some(threads),
            } => self.threads = threads,
            ListEvent::RefreshFailed { placeholder: None } => {}
            ListEvent::Created(summary) => {
                self.threads.retain(|t| t.thread_id != summary.thread_id);
                self.threads.insert(0, summary);
            }
            ListEvent::Deleted(thread_id) => {
                self.threads.retain(|t| t.thread_id != thread_id);
            }
        }
    }

    /// Threads in display order.
    #[must_use]
    pub fn as_slice(&self) -> &[ThreadSummary] {
        &self.threads
    }

    /// Look up a thread.
    #[must_use]
    pub fn get(&self, thread_id: &ThreadId) -> Option<&ThreadSummary> {
        self.threads.iter().find(|t| &t.thread_id == thread_id)
    }

    /// Whether the list contains a thread.
    #[must_use]
    pub fn contains(&self, thread_id: &ThreadId) -> bool {
        self.get(thread_id).is_some()
    }

    /// Number of threads.
    #[must_use]
    pub fn len(&self) -> usize {
        self.threads.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }
}
