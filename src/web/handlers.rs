//! HTTP handlers for the key-value API
//!
//! Every request is answered by one of two entry points (root path or key
//! path) that share the same method dispatch.

use axum::{
    body::{to_bytes, Body},
    extract::{Path, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
};
use std::fmt::Display;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::store::{StorageError, Store};

/// Shared application state
pub type AppState = Arc<dyn Store>;

/// Body of a successful write
const SAVED: &str = "saved.\n";

/// Requests on `/`, no key
pub async fn root_handler(
    State(store): State<AppState>,
    method: Method,
    body: Body,
) -> Response {
    handle_request(store.as_ref(), method, "", body).await
}

/// Requests on `/{key}`
pub async fn key_handler(
    State(store): State<AppState>,
    method: Method,
    Path(key): Path<String>,
    body: Body,
) -> Response {
    handle_request(store.as_ref(), method, &key, body).await
}

async fn handle_request(store: &dyn Store, method: Method, key: &str, body: Body) -> Response {
    match method {
        Method::GET if key.is_empty() => handle_get_list(store).await,
        Method::GET => handle_get_single(store, key).await,
        Method::PUT => handle_put(store, key, body).await,
        other => text_error(
            StatusCode::METHOD_NOT_ALLOWED,
            format!("Unknown method: {}", other),
        ),
    }
}

async fn handle_get_list(store: &dyn Store) -> Response {
    let keys = match store.list().await {
        Ok(keys) => keys,
        Err(e) => {
            warn!("Listing keys failed: {}", e);
            return text_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", e),
            );
        }
    };
    debug!("Listing {} keys", keys.len());

    match serde_json::to_string(&keys) {
        Ok(mut json) => {
            json.push('\n');
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                json,
            )
                .into_response()
        }
        Err(e) => text_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error encoding keys: {}", e),
        ),
    }
}

async fn handle_get_single(store: &dyn Store, key: &str) -> Response {
    debug!("Getting key {}", key);

    match store.get(key).await {
        Ok(Some(value)) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/octet-stream")],
            value,
        )
            .into_response(),
        Ok(None) => text_error(StatusCode::NOT_FOUND, format!("not found: {}", key)),
        Err(e) => storage_error("Error getting content", e),
    }
}

async fn handle_put(store: &dyn Store, key: &str, body: Body) -> Response {
    if key.is_empty() {
        return text_error(StatusCode::BAD_REQUEST, "Key can not be empty!");
    }

    let value = match to_bytes(body, usize::MAX).await {
        Ok(value) => value,
        Err(e) => {
            return text_error(
                StatusCode::BAD_REQUEST,
                format!("Error reading body: {}", e),
            )
        }
    };
    debug!("Putting key {} ({} bytes)", key, value.len());

    match store.put(key, value).await {
        Ok(()) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            SAVED,
        )
            .into_response(),
        Err(e) => storage_error("Error writing content", e),
    }
}

/// Map a storage failure from `get` or `put` onto a response
fn storage_error(prefix: &str, err: StorageError) -> Response {
    match err {
        StorageError::InvalidKey { .. } => {
            text_error(StatusCode::BAD_REQUEST, format!("Invalid key: {}", err))
        }
        err => {
            warn!("{}: {}", prefix, err);
            text_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("{}: {}", prefix, err),
            )
        }
    }
}

/// Plain text error body terminated by a newline
fn text_error(status: StatusCode, message: impl Display) -> Response {
    (
        status,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        ],
        format!("{}\n", message),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use http_body_util::BodyExt;

    async fn body_string(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_text_error_format() {
        let response = text_error(StatusCode::NOT_FOUND, "not found: key");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        assert_eq!(body_string(response).await, "not found: key\n");
    }

    #[tokio::test]
    async fn test_invalid_key_is_bad_request() {
        let err = StorageError::invalid_key("a/b", "key contains a path separator");
        let response = storage_error("Error writing content", err);

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_string(response).await,
            "Invalid key: \"a/b\": key contains a path separator\n"
        );
    }

    #[tokio::test]
    async fn test_put_empty_key_skips_storage() {
        let store = MemoryStore::new();
        let response = handle_request(&store, Method::PUT, "", Body::from("value")).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_string(response).await, "Key can not be empty!\n");
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_unknown_method_names_method() {
        let store = MemoryStore::new();
        let response = handle_request(&store, Method::POST, "key", Body::empty()).await;

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body_string(response).await, "Unknown method: POST\n");
    }
}
