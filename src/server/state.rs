//! Application state shared across all request handlers.

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::sidebar::{ChatRecord, MemoryThreadStore};

/// Environment variable that pre-fills the store with demo threads.
const SEED_ENV: &str = "SIDEBAR_STORE_SEED";

/// Shared application state.
pub struct AppState {
    /// Record log served by the `/api/thread` routes.
    pub store: Arc<MemoryThreadStore>,
}

impl AppState {
    /// Create state over an empty store.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Self::with_store(Arc::new(MemoryThreadStore::new()))
    }

    /// Create state over an existing store.
    #[must_use]
    pub fn with_store(store: Arc<MemoryThreadStore>) -> Arc<Self> {
        Arc::new(Self { store })
    }

    /// Create state from the environment, seeding demo threads when `SIDEBAR_STORE_SEED` is set.
    #[must_use]
    pub fn from_env() -> Arc<Self> {
        let seed = std::env::var(SEED_ENV).is_ok_and(|v| !matches!(v.trim(), "" | "0" | "false"));
        if seed {
            tracing::info!("Seeding thread store with demo threads");
            Self::with_store(Arc::new(MemoryThreadStore::with_records(demo_records())))
        } else {
            Self::new()
        }
    }
}

/// A few threads to make the sidebar non-empty during development.
fn demo_records() -> Vec<ChatRecord> {
    let now = Utc::now();
    vec![
        ChatRecord::new("demo-rust")
            .with_message("How do lifetimes work in Rust? I keep fighting the borrow checker.")
            .with_response("Lifetimes describe how long references stay valid.")
            .with_timestamp(now - Duration::hours(3)),
        ChatRecord::new("demo-trip")
            .with_message("Plan a weekend in Lisbon")
            .with_response("Day one: Alfama and the castle.")
            .with_timestamp(now - Duration::hours(1)),
        ChatRecord::new("demo-rust")
            .with_message("Can you show an example with structs?")
            .with_timestamp(now - Duration::minutes(90)),
        ChatRecord::new("demo-empty").with_timestamp(now - Duration::days(1)),
    ]
}
