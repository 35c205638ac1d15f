//! Thread list controller: refresh, create, switch and delete threads.
//!
//! Requests are not cancelled. Instead every refresh and every thread switch
//! is stamped with a generation number, and only the newest one is allowed to
//! publish its result.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::config::{SidebarConfig, TitleRules};
use super::context::SidebarContext;
use super::error::SidebarResult;
use super::ids::ThreadId;
use super::reconcile::{ListEvent, placeholder_threads, summarize_records};
use super::store::{HttpThreadStore, ThreadStore};
use super::types::ThreadSummary;

/// Interactive yes/no confirmation.
pub trait Confirm {
    /// Ask the user; `true` means proceed.
    fn confirm(&self, message: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, message: &str) -> bool {
        self(message)
    }
}

/// Transient view flags.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewState {
    /// A refresh is in flight.
    pub loading: bool,
    /// Last user-facing error.
    pub error: Option<String>,
}

/// Result of a refresh that did not fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The list was published with this many threads.
    Published(usize),
    /// A newer refresh started meanwhile; this response was discarded.
    Stale,
}

/// Result of a thread switch that did not fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// The previous-messages buffer now holds this many messages.
    Loaded(usize),
    /// The selection moved on before the messages arrived.
    Stale,
}

/// Result of a delete request that did not fail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The user declined; nothing was sent.
    Cancelled,
    /// The thread was deleted.
    Deleted {
        /// New thread selected because the deleted one was current.
        reselected: Option<ThreadId>,
    },
}

/// Manages the sidebar's thread list against a thread store.
pub struct ThreadListController {
    store: Arc<dyn ThreadStore>,
    context: Arc<SidebarContext>,
    titles: TitleRules,
    placeholder_on_error: bool,
    view: RwLock<ViewState>,
    refresh_generation: AtomicU64,
    switch_generation: AtomicU64,
}

impl ThreadListController {
    /// Create a controller over an arbitrary store.
    #[must_use]
    pub fn new(
        store: Arc<dyn ThreadStore>,
        context: Arc<SidebarContext>,
        config: &SidebarConfig,
    ) -> Self {
        Self {
            store,
            context,
            titles: config.titles.clone(),
            placeholder_on_error: config.placeholder_on_error,
            view: RwLock::new(ViewState::default()),
            refresh_generation: AtomicU64::new(0),
            switch_generation: AtomicU64::new(0),
        }
    }

    /// Create a controller talking to the HTTP thread store named in `config`.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn from_config(
        config: &SidebarConfig,
        context: Arc<SidebarContext>,
    ) -> SidebarResult<Self> {
        config.validate()?;
        let store = HttpThreadStore::new(config)?;
        Ok(Self::new(Arc::new(store), context, config))
    }

    /// Shared context the controller publishes into.
    #[must_use]
    pub const fn context(&self) -> &Arc<SidebarContext> {
        &self.context
    }

    /// Current view flags.
    pub async fn view(&self) -> ViewState {
        self.view.read().await.clone()
    }

    /// Reload the thread list from the store and publish it.
    ///
    /// # Errors
    /// Returns the store error; the view's `error` is set as well.
    pub async fn refresh(&self) -> SidebarResult<RefreshOutcome> {
        let generation = {
            let mut view = self.view.write().await;
            view.loading = true;
            view.error = None;
            self.refresh_generation.fetch_add(1, Ordering::SeqCst) + 1
        };
        debug!("Refresh #{generation} started");

        let result = self.store.list_records().await;

        let mut view = self.view.write().await;
        if self.refresh_generation.load(Ordering::SeqCst) != generation {
            match &result {
                Ok(records) => debug!(
                    "Discarding stale refresh #{generation} ({} records)",
                    records.len()
                ),
                Err(e) => debug!("Discarding stale refresh #{generation} failure: {e}"),
            }
            return Ok(RefreshOutcome::Stale);
        }

        match result {
            Ok(records) => {
                let threads = summarize_records(&records, &self.titles);
                let count = threads.len();
                self.context.apply(ListEvent::Refreshed(threads)).await;
                view.loading = false;
                debug!("Refresh #{generation} published {count} threads");
                Ok(RefreshOutcome::Published(count))
            }
            Err(e) => {
                warn!("Error fetching threads: {e}");
                view.error = Some(e.user_message("load threads"));
                view.loading = false;
                let placeholder = self.placeholder_on_error.then(placeholder_threads);
                self.context
                    .apply(ListEvent::RefreshFailed { placeholder })
                    .await;
                Err(e)
            }
        }
    }

    /// Start a fresh, not yet persisted thread and select it.
    pub async fn create_new_chat(&self) -> ThreadId {
        let thread_id = ThreadId::generate();
        let summary = ThreadSummary::new_chat(thread_id.clone(), self.titles.fallback.clone());

        self.context
            .update(|state| {
                state.new_chat = true;
                state.prompt.clear();
                state.reply = None;
                state.prev_chats.clear();
                state.current_thread = Some(thread_id.clone());
                state.threads.apply(ListEvent::Created(summary));
            })
            .await;

        info!("Created new chat: {thread_id}");
        thread_id
    }

    /// Select a thread and load its messages.
    ///
    /// The selection is applied immediately and kept even if loading fails.
    ///
    /// # Errors
    /// Returns the store error; the view's `error` is set as well.
    pub async fn change_thread(&self, thread_id: ThreadId) -> SidebarResult<SwitchOutcome> {
        let generation = self.switch_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.context.set_current_thread(thread_id.clone()).await;
        debug!("Switched to thread: {thread_id}");

        match self.store.thread_messages(thread_id.clone()).await {
            Ok(messages) => {
                let count = messages.len();
                let applied = self
                    .context
                    .update(|state| {
                        let newest = self.switch_generation.load(Ordering::SeqCst) == generation;
                        if !newest || state.current_thread.as_ref() != Some(&thread_id) {
                            return false;
                        }
                        state.prev_chats = messages;
                        state.new_chat = false;
                        state.reply = None;
                        true
                    })
                    .await;

                if applied {
                    Ok(SwitchOutcome::Loaded(count))
                } else {
                    debug!("Discarding stale messages for thread {thread_id}");
                    Ok(SwitchOutcome::Stale)
                }
            }
            Err(e) => {
                let mut view = self.view.write().await;
                let newest = self.switch_generation.load(Ordering::SeqCst) == generation;
                if !newest || self.context.current_thread().await.as_ref() != Some(&thread_id) {
                    debug!("Discarding stale failure for thread {thread_id}: {e}");
                    return Ok(SwitchOutcome::Stale);
                }
                error!("Error loading thread {thread_id}: {e}");
                view.error = Some(e.user_message("open this thread"));
                Err(e)
            }
        }
    }

    /// Delete a thread after asking for confirmation.
    ///
    /// When the deleted thread was selected, a new chat is started.
    ///
    /// # Errors
    /// Returns the store error; the view's `error` is set and the list is left as is.
    pub async fn delete_thread(
        &self,
        thread_id: ThreadId,
        confirm: &dyn Confirm,
    ) -> SidebarResult<DeleteOutcome> {
        let label = self
            .context
            .snapshot()
            .await
            .threads
            .get(&thread_id)
            .map_or_else(|| thread_id.to_string(), |t| t.title.clone());

        if !confirm.confirm(&format!("Delete \"{label}\"? This cannot be undone.")) {
            debug!("Delete of {thread_id} cancelled");
            return Ok(DeleteOutcome::Cancelled);
        }

        if let Err(e) = self.store.delete_thread(thread_id.clone()).await {
            error!("Error deleting thread {thread_id}: {e}");
            self.view.write().await.error = Some(e.user_message("delete this thread"));
            return Err(e);
        }

        let was_current = self
            .context
            .update(|state| {
                state.threads.apply(ListEvent::Deleted(thread_id.clone()));
                state.current_thread.as_ref() == Some(&thread_id)
            })
            .await;
        info!("Deleted thread: {thread_id}");

        let reselected = if was_current {
            Some(self.create_new_chat().await)
        } else {
            None
        };
        Ok(DeleteOutcome::Deleted { reselected })
    }

    /// Refresh in the background; failures are already reflected in the view.
    #[must_use = "dropping the handle detaches the refresh"]
    pub fn spawn_refresh(self: &Arc<Self>) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = this.refresh().await {
                debug!("Background refresh failed: {e}");
            }
        })
    }

    /// Refresh on mount, then again whenever the selected thread changes.
    ///
    /// Refreshes run concurrently; the newest one wins. Returns when `shutdown` resolves.
    pub async fn run_until<F>(self: Arc<Self>, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut current = self.context.subscribe_current_thread();
        drop(self.spawn_refresh());

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                () = &mut shutdown => break,
                changed = current.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    drop(self.spawn_refresh());
                }
            }
        }
        debug!("Thread list watcher stopped");
    }
}
