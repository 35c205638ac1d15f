//! Chat sidebar: the list of conversation threads.
//!
//! This module provides:
//! - Title derivation from a thread's first record
//! - Reduction of raw store records into a deduplicated, sorted thread list
//! - A shared, observable chat context
//! - The thread-list controller (refresh, create, switch, delete)
//! - HTTP and in-memory thread stores

pub mod config;
pub mod context;
pub mod controller;
pub mod error;
pub mod ids;
pub mod reconcile;
pub mod store;
pub mod title;
pub mod types;

pub use config::{SidebarConfig, TitleRules};
pub use context::{ContextState, SidebarContext};
pub use controller::{
    Confirm, DeleteOutcome, RefreshOutcome, SwitchOutcome, ThreadListController, ViewState,
};
pub use error::{SidebarError, SidebarResult};
pub use ids::ThreadId;
pub use reconcile::{ListEvent, ThreadList};
pub use store::{HttpThreadStore, MemoryThreadStore, ThreadStore};
pub use types::{ChatRecord, ThreadSummary};
