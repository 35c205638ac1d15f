//! HTTP route handlers for the thread store.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{Value, json};

use crate::sidebar::{ChatRecord, SidebarError, ThreadId, ThreadStore};

use super::state::AppState;

/// Error body returned by the handlers.
type ApiError = (StatusCode, Json<Value>);

/// Create the API router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/thread", get(list_threads).post(append_record))
        .route(
            "/api/thread/{thread_id}",
            get(thread_messages).delete(delete_thread),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "thread-store",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

fn api_error(err: &SidebarError) -> ApiError {
    let status = match err {
        SidebarError::ThreadNotFound(_) => StatusCode::NOT_FOUND,
        SidebarError::JsonParse(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": err.to_string() })))
}

/// All records, in insertion order.
async fn list_threads(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ChatRecord>>, ApiError> {
    let records = state.store.list_records().await.map_err(|e| api_error(&e))?;
    Ok(Json(records))
}

/// Records of one thread.
async fn thread_messages(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> Result<Json<Vec<ChatRecord>>, ApiError> {
    let messages = state
        .store
        .thread_messages(ThreadId::new(thread_id))
        .await
        .map_err(|e| api_error(&e))?;
    Ok(Json(messages))
}

/// Delete every record of a thread.
async fn delete_thread(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let thread_id = ThreadId::new(thread_id);
    state
        .store
        .delete_thread(thread_id.clone())
        .await
        .map_err(|e| api_error(&e))?;

    tracing::info!("Deleted thread {thread_id}");
    Ok(Json(json!({ "success": "Thread deleted successfully" })))
}

/// Append one record; this is how threads come into existence.
async fn append_record(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<ChatRecord>), ApiError> {
    let mut record: ChatRecord = serde_json::from_value(body)
        .map_err(|e| api_error(&SidebarError::JsonParse(e)))?;

    if record.thread_id.is_blank() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "threadId must not be blank" })),
        ));
    }
    if record.activity_time().is_none() {
        record.timestamp = Some(Value::String(Utc::now().to_rfc3339()));
    }

    state.store.append(record.clone()).await;
    tracing::debug!("Appended record to thread {}", record.thread_id);
    Ok((StatusCode::CREATED, Json(record)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request};
    use tower::ServiceExt;

    use crate::sidebar::MemoryThreadStore;

    fn app_with(records: Vec<ChatRecord>) -> (Arc<AppState>, Router) {
        let state = AppState::with_store(Arc::new(MemoryThreadStore::with_records(records)));
        (state.clone(), create_router(state))
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (_, app) = app_with(Vec::new());
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], json!("ok"));
    }

    #[tokio::test]
    async fn test_list_and_fetch() {
        let (_, app) = app_with(vec![
            ChatRecord::new("t1").with_message("hello"),
            ChatRecord::new("t2").with_message("other"),
        ]);

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/api/thread").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let all = body_json(response).await;
        assert_eq!(all.as_array().map(Vec::len), Some(2));
        assert_eq!(all[0]["threadId"], json!("t1"));

        let response = app
            .oneshot(Request::builder().uri("/api/thread/t2").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await[0]["message"], json!("other"));
    }

    #[tokio::test]
    async fn test_unknown_thread_is_404() {
        let (_, app) = app_with(Vec::new());
        let response = app
            .clone()
            .oneshot(Request::builder().uri("/api/thread/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_json(response).await["error"].is_string());

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::DELETE)
                    .uri("/api/thread/nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_removes_thread() {
        let (state, app) = app_with(vec![
            ChatRecord::new("t1").with_message("a"),
            ChatRecord::new("t1").with_message("b"),
            ChatRecord::new("t2").with_message("c"),
        ]);
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::DELETE)
                    .uri("/api/thread/t1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await["success"],
            json!("Thread deleted successfully")
        );
        assert_eq!(state.store.len().await, 1);
    }

    #[tokio::test]
    async fn test_append_sets_timestamp_and_rejects_blank_id() {
        let (state, app) = app_with(Vec::new());

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/thread")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"threadId":"t9","message":"hi","role":"user"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        assert!(created["timestamp"].is_string());
        assert_eq!(created["role"], json!("user"));
        assert_eq!(state.store.len().await, 1);

        for body in [r#"{"threadId":"  "}"#, r#"{"message":"no id"}"#] {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .method(Method::POST)
                        .uri("/api/thread")
                        .header("content-type", "application/json")
                        .body(Body::from(body))
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
        assert_eq!(state.store.len().await, 1);
    }
}
