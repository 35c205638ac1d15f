//! Shared chat context the sidebar publishes into.
//!
//! Every mutation goes through [`SidebarContext::update`], which bumps a
//! revision counter and, when the current thread changed, notifies the
//! current-thread channel. Both notifications are sent while the write lock is
//! held, so subscribers observe changes in the order they were made.

use tokio::sync::{RwLock, watch};

use super::ids::ThreadId;
use super::reconcile::{ListEvent, ThreadList};
use super::types::{ChatRecord, ThreadSummary};

/// Snapshot of the shared chat state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContextState {
    /// Published thread list.
    pub threads: ThreadList,
    /// Currently selected thread.
    pub current_thread: Option<ThreadId>,
    /// Messages of the selected thread.
    pub prev_chats: Vec<ChatRecord>,
    /// Prompt being typed.
    pub prompt: String,
    /// Reply being shown for the last prompt.
    pub reply: Option<String>,
    /// Whether the selected thread has not been persisted yet.
    pub new_chat: bool,
}

/// Shared, observable chat state.
pub struct SidebarContext {
    state: RwLock<ContextState>,
    revision: watch::Sender<u64>,
    current: watch::Sender<Option<ThreadId>>,
}

impl Default for SidebarContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SidebarContext {
    /// Create an empty context with no selected thread.
    #[must_use]
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        let (current, _) = watch::channel(None);
        Self {
            state: RwLock::new(ContextState::default()),
            revision,
            current,
        }
    }

    /// Mutate the state and notify subscribers.
    pub async fn update<R>(&self, f: impl FnOnce(&mut ContextState) -> R) -> R {
        let mut guard = self.state.write().await;
        let result = f(&mut *guard);

        self.revision.send_modify(|rev| *rev += 1);
        let selected = &guard.current_thread;
        self.current.send_if_modified(|current| {
            if *current == *selected {
                false
            } else {
                current.clone_from(selected);
                true
            }
        });

        result
    }

    /// Apply a thread-list event.
    pub async fn apply(&self, event: ListEvent) {
        self.update(|state| state.threads.apply(event)).await;
    }

    /// Select a thread.
    pub async fn set_current_thread(&self, thread_id: ThreadId) {
        self.update(|state| state.current_thread = Some(thread_id)).await;
    }

    /// Clone of the whole state.
    pub async fn snapshot(&self) -> ContextState {
        self.state.read().await.clone()
    }

    /// Published threads in display order.
    pub async fn threads(&self) -> Vec<ThreadSummary> {
        self.state.read().await.threads.as_slice().to_vec()
    }

    /// Currently selected thread.
    pub async fn current_thread(&self) -> Option<ThreadId> {
        self.state.read().await.current_thread.clone()
    }

    /// Messages of the selected thread.
    pub async fn prev_chats(&self) -> Vec<ChatRecord> {
        self.state.read().await.prev_chats.clone()
    }

    /// Receiver notified on every update with the new revision number.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Receiver notified whenever the selected thread changes.
    #[must_use]
    pub fn subscribe_current_thread(&self) -> watch::Receiver<Option<ThreadId>> {
        self.current.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_update_bumps_revision() {
        let ctx = SidebarContext::new();
        let mut rx = ctx.subscribe();
        assert_eq!(*rx.borrow_and_update(), 0);

        ctx.update(|state| state.prompt = "hello".to_string()).await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), 1);
        assert_eq!(ctx.snapshot().await.prompt, "hello");
    }

    #[tokio::test]
    async fn test_current_thread_notifies_only_on_change() {
        let ctx = SidebarContext::new();
        let mut rx = ctx.subscribe_current_thread();

        ctx.set_current_thread(ThreadId::new("t1")).await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().clone(), Some(ThreadId::new("t1")));

        ctx.set_current_thread(ThreadId::new("t1")).await;
        ctx.update(|state| state.reply = Some("r".to_string())).await;
        assert!(!rx.has_changed().unwrap());

        ctx.set_current_thread(ThreadId::new("t2")).await;
        assert!(rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_apply_list_events() {
        let ctx = SidebarContext::new();
        ctx.apply(ListEvent::Created(ThreadSummary::new_chat(
            ThreadId::new("t1"),
            "New Chat",
        )))
        .await;
        assert_eq!(ctx.threads().await.len(), 1);

        ctx.apply(ListEvent::Deleted(ThreadId::new("t1"))).await;
        assert!(ctx.threads().await.is_empty());
    }
}
