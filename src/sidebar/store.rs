//! Thread-store collaborators: the HTTP client and an in-memory store.

use std::future::Future;
use std::pin::Pin;

use reqwest::StatusCode;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

use super::config::SidebarConfig;
use super::error::{SidebarError, SidebarResult};
use super::ids::ThreadId;
use super::types::ChatRecord;

/// Boxed future type for store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait for the service that holds chat records.
pub trait ThreadStore: Send + Sync {
    /// All raw records, in store order.
    fn list_records(&self) -> StoreFuture<'_, SidebarResult<Vec<ChatRecord>>>;

    /// Messages of one thread.
    fn thread_messages(&self, thread_id: ThreadId)
    -> StoreFuture<'_, SidebarResult<Vec<ChatRecord>>>;

    /// Delete a thread and all its records.
    fn delete_thread(&self, thread_id: ThreadId) -> StoreFuture<'_, SidebarResult<()>>;
}

/// Thread store reached over HTTP (`/api/thread` routes).
pub struct HttpThreadStore {
    client: reqwest::Client,
    base: Url,
}

impl HttpThreadStore {
    /// Create a store client from the sidebar configuration.
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the HTTP client cannot be built.
    pub fn new(config: &SidebarConfig) -> SidebarResult<Self> {
        let base = config.base_url()?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .gzip(true)
            .build()
            .map_err(|e| SidebarError::HttpClient(e.to_string()))?;

        Ok(Self { client, base })
    }

    /// Base URL the store talks to.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base
    }

    /// `{base}/api/thread`, or `{base}/api/thread/{id}` with the id as one encoded segment.
    fn endpoint(&self, thread_id: Option<&ThreadId>) -> SidebarResult<Url> {
        let mut url = self.base.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                SidebarError::Config(format!("api_url cannot be used as a base: {}", self.base))
            })?;
            segments.pop_if_empty().push("api").push("thread");
            if let Some(id) = thread_id {
                segments.push(id.as_str());
            }
        }
        Ok(url)
    }

    async fn fetch_records(
        &self,
        url: Url,
        endpoint: &str,
        thread_id: Option<&ThreadId>,
    ) -> SidebarResult<Vec<ChatRecord>> {
        debug!("{endpoint} -> {url}");
        let response = self.client.get(url).send().await?;
        let response = check_status(response, endpoint, thread_id)?;
        let values: Vec<Value> = response.json().await?;
        Ok(ChatRecord::decode_lenient(values))
    }
}

/// Map non-success statuses to errors.
///
/// A 404 on a thread-specific endpoint means the thread is gone.
fn check_status(
    response: reqwest::Response,
    endpoint: &str,
    thread_id: Option<&ThreadId>,
) -> SidebarResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if let (StatusCode::NOT_FOUND, Some(id)) = (status, thread_id) {
        return Err(SidebarError::ThreadNotFound(id.to_string()));
    }
    Err(SidebarError::Status {
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
    })
}

impl ThreadStore for HttpThreadStore {
    fn list_records(&self) -> StoreFuture<'_, SidebarResult<Vec<ChatRecord>>> {
        Box::pin(async move {
            let url = self.endpoint(None)?;
            self.fetch_records(url, "GET /api/thread", None).await
        })
    }

    fn thread_messages(
        &self,
        thread_id: ThreadId,
    ) -> StoreFuture<'_, SidebarResult<Vec<ChatRecord>>> {
        Box::pin(async move {
            let url = self.endpoint(Some(&thread_id))?;
            let endpoint = format!("GET /api/thread/{thread_id}");
            self.fetch_records(url, &endpoint, Some(&thread_id)).await
        })
    }

    fn delete_thread(&self, thread_id: ThreadId) -> StoreFuture<'_, SidebarResult<()>> {
        Box::pin(async move {
            let url = self.endpoint(Some(&thread_id))?;
            let endpoint = format!("DELETE /api/thread/{thread_id}");
            debug!("{endpoint} -> {url}");

            let response = self.client.delete(url).send().await?;
            let response = check_status(response, &endpoint, Some(&thread_id))?;
            debug!("Delete acknowledged for {thread_id}: {}", response.status());
            Ok(())
        })
    }
}

/// Thread store kept in memory, in insertion order.
#[derive(Default)]
pub struct MemoryThreadStore {
    records: RwLock<Vec<ChatRecord>>,
}

impl MemoryThreadStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-filled with records.
    #[must_use]
    pub fn with_records(records: Vec<ChatRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Append a record.
    pub async fn append(&self, record: ChatRecord) {
        self.records.write().await.push(record);
    }

    /// Number of records held.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl ThreadStore for MemoryThreadStore {
    fn list_records(&self) -> StoreFuture<'_, SidebarResult<Vec<ChatRecord>>> {
        Box::pin(async move { Ok(self.records.read().await.clone()) })
    }

    fn thread_messages(
        &self,
        thread_id: ThreadId,
    ) -> StoreFuture<'_, SidebarResult<Vec<ChatRecord>>> {
        Box::pin(async move {
            let messages: Vec<ChatRecord> = self
                .records
                .read()
                .await
                .iter()
                .filter(|r| r.thread_id == thread_id)
                .cloned()
                .collect();

            if messages.is_empty() {
                return Err(SidebarError::ThreadNotFound(thread_id.into_string()));
            }
            Ok(messages)
        })
    }

    fn delete_thread(&self, thread_id: ThreadId) -> StoreFuture<'_, SidebarResult<()>> {
        Box::pin(async move {
            let mut records = self.records.write().await;
            let before = records.len();
            records.retain(|r| r.thread_id != thread_id);
            if records.len() == before {
                return Err(SidebarError::ThreadNotFound(thread_id.into_string()));
            }
            Ok(())
        })
    }
}
