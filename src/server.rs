//! HTTP access layer exposing the store with role-gated mutation.

use std::{future::Future, net::SocketAddr, sync::Arc};

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::{
    auth::{self, Credential, AUTH_HEADER},
    error::StoreError,
    model::{CircularDraft, Comment, ReadReceipt, Role},
    storage::{ListFilter, Store},
};

#[derive(Clone)]
struct HttpState {
    store: Store,
    auth_secret: String,
}

/// Start the HTTP server exposing the circular endpoints.
pub async fn serve_http(
    addr: SocketAddr,
    store: Store,
    auth_secret: String,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let state = Arc::new(HttpState { store, auth_secret });
    axum::serve(listener, app(state).into_make_service())
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

fn app(state: Arc<HttpState>) -> Router {
    Router::new()
        .route("/", get(service_info))
        .route("/healthz", get(healthz))
        .route("/circulars", get(list_circulars).post(create_circular))
        .route("/circulars/:id", get(get_circular))
        .route("/circulars/:id/comments", post(add_comment))
        .route("/circulars/:id/read", post(mark_read))
        .with_state(state)
}

/// Response body for the `/healthz` endpoint.
#[derive(Serialize, Deserialize)]
struct Health {
    /// Always "ok" when the server is running.
    status: String,
}

/// Health check endpoint.
async fn healthz() -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
    })
}

/// Service information document served at the root.
#[derive(Serialize, Deserialize)]
struct ServiceInfo {
    name: String,
    software: String,
    version: String,
}

async fn service_info() -> impl IntoResponse {
    (
        [(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")],
        Json(ServiceInfo {
            name: "circlr".into(),
            software: "circlr".into(),
            version: env!("CARGO_PKG_VERSION").into(),
        }),
    )
}

/// Static error body shared by every failure response.
#[derive(Serialize, Deserialize)]
struct ErrorBody {
    message: String,
}

fn fail(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorBody {
            message: message.into(),
        }),
    )
        .into_response()
}

/// Map a store failure onto its fixed status and message.
fn store_failure(err: StoreError) -> Response {
    match err {
        StoreError::Validation(msg) => fail(StatusCode::BAD_REQUEST, &msg),
        StoreError::Forbidden => fail(StatusCode::FORBIDDEN, "Access denied. Admin only."),
        StoreError::NotFound => fail(StatusCode::NOT_FOUND, "Circular not found"),
        StoreError::Storage(e) => {
            error!("storage failure: {e:#}");
            fail(StatusCode::INTERNAL_SERVER_ERROR, "Server error")
        }
    }
}

/// Extract and verify the caller credential from the request headers.
fn authenticate(state: &HttpState, headers: &HeaderMap) -> Option<Credential> {
    let token = headers.get(AUTH_HEADER)?.to_str().ok()?;
    auth::verify(&state.auth_secret, token)
}

/// URL query parameters accepted by the list endpoint.
#[derive(Deserialize, Default)]
struct ListParams {
    /// Exact department value, e.g. `CSE` or `All`.
    department: Option<String>,
    /// Priority wire name, e.g. `urgent`.
    priority: Option<String>,
    /// Single tag value.
    tag: Option<String>,
}

/// Return circulars newest-first, optionally narrowed by classification.
async fn list_circulars(
    State(state): State<Arc<HttpState>>,
    Query(params): Query<ListParams>,
) -> Response {
    // Unparseable priority values are dropped rather than rejected.
    let filter = ListFilter {
        department: params.department,
        priority: params.priority.and_then(|p| p.parse().ok()),
        tag: params.tag,
    };
    match state.store.query(filter) {
        Ok(circulars) => {
            debug!("GET /circulars -> {} circulars", circulars.len());
            Json(circulars).into_response()
        }
        Err(e) => store_failure(e),
    }
}

/// Create a circular. Admin only; `author` is taken from the payload.
async fn create_circular(
    State(state): State<Arc<HttpState>>,
    headers: HeaderMap,
    Json(draft): Json<CircularDraft>,
) -> Response {
    let Some(cred) = authenticate(&state, &headers) else {
        return fail(StatusCode::UNAUTHORIZED, "Invalid or missing token");
    };
    if cred.role != Role::Admin {
        return store_failure(StoreError::Forbidden);
    }
    match state.store.insert(draft) {
        Ok(circular) => {
            debug!("POST /circulars -> {} by {}", circular.id, cred.name);
            Json(circular).into_response()
        }
        Err(e) => store_failure(e),
    }
}

async fn get_circular(State(state): State<Arc<HttpState>>, Path(id): Path<String>) -> Response {
    match state.store.get(&id) {
        Ok(circular) => Json(circular).into_response(),
        Err(e) => store_failure(e),
    }
}

/// Comment payload. A `role` field in the body is ignored; the stored role
/// always comes from the verified credential.
#[derive(Deserialize)]
struct CommentPayload {
    #[serde(default)]
    author: String,
    #[serde(default)]
    content: String,
}

/// Append a comment. Any authenticated caller; returns the updated
/// comment sequence.
async fn add_comment(
    State(state): State<Arc<HttpState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<CommentPayload>,
) -> Response {
    let Some(cred) = authenticate(&state, &headers) else {
        return fail(StatusCode::UNAUTHORIZED, "Invalid or missing token");
    };
    for (field, value) in [("author", &payload.author), ("content", &payload.content)] {
        if value.trim().is_empty() {
            return store_failure(StoreError::Validation(format!(
                "missing required field: {field}"
            )));
        }
    }
    let comment = Comment {
        author: payload.author,
        role: cred.role,
        content: payload.content,
        timestamp: Utc::now(),
    };
    match state.store.append_comment(&id, comment) {
        Ok(comments) => Json(comments).into_response(),
        Err(e) => store_failure(e),
    }
}

/// Record that the authenticated caller read the circular.
///
/// Appends a receipt under the caller's verified name; repeated calls
/// append repeated entries.
async fn mark_read(
    State(state): State<Arc<HttpState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let Some(cred) = authenticate(&state, &headers) else {
        return fail(StatusCode::UNAUTHORIZED, "Invalid or missing token");
    };
    let receipt = ReadReceipt {
        name: cred.name,
        read_at: Utc::now(),
    };
    match state.store.append_read(&id, receipt) {
        Ok(circular) => Json(circular).into_response(),
        Err(e) => store_failure(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Circular, CircularDraft};
    use chrono::{Duration, Utc};
    use reqwest::header::ACCESS_CONTROL_ALLOW_ORIGIN;
    use serde_json::json;
    use tempfile::TempDir;
    use tokio::task::JoinHandle;

    const SECRET: &str = "test-secret";

    fn draft(title: &str, priority: &str) -> CircularDraft {
        CircularDraft {
            title: title.into(),
            content: "body".into(),
            priority: Some(priority.into()),
            department: "All".into(),
            year: "All".into(),
            author: "Dean".into(),
            ..CircularDraft::default()
        }
    }

    async fn spawn_app(store: Store) -> (String, JoinHandle<()>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(HttpState {
            store,
            auth_secret: SECRET.into(),
        });
        let server = axum::serve(listener, app(state).into_make_service());
        let handle = tokio::task::spawn(async move {
            server.await.unwrap();
        });
        (format!("http://{}", addr), handle)
    }

    fn temp_store(dir: &TempDir) -> Store {
        let store = Store::new(dir.path().to_path_buf());
        store.init().unwrap();
        store
    }

    #[tokio::test]
    async fn health_endpoint() {
        let dir = TempDir::new().unwrap();
        let (base, handle) = spawn_app(temp_store(&dir)).await;
        let body: Health = reqwest::get(format!("{base}/healthz"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body.status, "ok");
        handle.abort();
    }

    #[tokio::test]
    async fn service_info_endpoint() {
        let dir = TempDir::new().unwrap();
        let (base, handle) = spawn_app(temp_store(&dir)).await;
        let resp = reqwest::get(format!("{base}/")).await.unwrap();
        assert_eq!(
            resp.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
        let info: ServiceInfo = resp.json().await.unwrap();
        assert_eq!(info.name, "circlr");
        handle.abort();
    }

    #[tokio::test]
    async fn list_returns_newest_first() {
        let dir = TempDir::new().unwrap();
        let store = temp_store(&dir);
        let now = Utc::now();
        for (title, age_days) in [("old", 3), ("new", 0), ("mid", 1)] {
            let mut d = draft(title, "informational");
            d.published_at = Some(now - Duration::days(age_days));
            store.insert(d).unwrap();
        }
        let (base, handle) = spawn_app(store).await;
        let list: Vec<Circular> = reqwest::get(format!("{base}/circulars"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let titles: Vec<&str> = list.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, ["new", "mid", "old"]);
        handle.abort();
    }

    #[tokio::test]
    async fn list_filters_by_classification() {
        let dir = TempDir::new().unwrap();
        let store = temp_store(&dir);
        let mut d = draft("cse", "urgent");
        d.department = "CSE".into();
        store.insert(d).unwrap();
        store.insert(draft("all", "informational")).unwrap();
        let (base, handle) = spawn_app(store).await;

        let list: Vec<Circular> =
            reqwest::get(format!("{base}/circulars?department=CSE&priority=urgent"))
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].title, "cse");

        // invalid priority values are dropped, not rejected
        let resp = reqwest::get(format!("{base}/circulars?priority=bogus"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let list: Vec<Circular> = resp.json().await.unwrap();
        assert_eq!(list.len(), 2);
        handle.abort();
    }

    #[tokio::test]
    async fn create_requires_admin() {
        let dir = TempDir::new().unwrap();
        let store = temp_store(&dir);
        let (base, handle) = spawn_app(store.clone()).await;
        let client = reqwest::Client::new();

        // no token
        let resp = client
            .post(format!("{base}/circulars"))
            .json(&draft("t", "urgent"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 401);

        // student token
        let token = auth::mint(SECRET, "Priya Sharma", Role::Student);
        let resp = client
            .post(format!("{base}/circulars"))
            .header(AUTH_HEADER, token)
            .json(&draft("t", "urgent"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 403);
        let body: ErrorBody = resp.json().await.unwrap();
        assert_eq!(body.message, "Access denied. Admin only.");

        // the store was never mutated
        assert!(store.list().unwrap().is_empty());
        handle.abort();
    }

    #[tokio::test]
    async fn create_validates_and_persists() {
        let dir = TempDir::new().unwrap();
        let store = temp_store(&dir);
        let (base, handle) = spawn_app(store.clone()).await;
        let client = reqwest::Client::new();
        let token = auth::mint(SECRET, "Dr. Rajesh Kumar", Role::Admin);

        let resp = client
            .post(format!("{base}/circulars"))
            .header(AUTH_HEADER, &token)
            .json(&json!({ "content": "no title", "priority": "urgent" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);

        let resp = client
            .post(format!("{base}/circulars"))
            .header(AUTH_HEADER, &token)
            .json(&draft("Exam Schedule", "urgent"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let created: Circular = resp.json().await.unwrap();
        assert!(!created.id.is_empty());

        let fetched: Circular = reqwest::get(format!("{base}/circulars/{}", created.id))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(fetched, created);
        handle.abort();
    }

    #[tokio::test]
    async fn get_unknown_circular_is_404() {
        let dir = TempDir::new().unwrap();
        let (base, handle) = spawn_app(temp_store(&dir)).await;
        let resp = reqwest::get(format!("{base}/circulars/unknown1"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);
        let body: ErrorBody = resp.json().await.unwrap();
        assert_eq!(body.message, "Circular not found");
        handle.abort();
    }

    #[tokio::test]
    async fn comment_role_comes_from_credential() {
        let dir = TempDir::new().unwrap();
        let store = temp_store(&dir);
        let created = store.insert(draft("t", "urgent")).unwrap();
        let (base, handle) = spawn_app(store).await;
        let client = reqwest::Client::new();
        let token = auth::mint(SECRET, "Priya Sharma", Role::Student);

        // the payload claims admin; the stored role must stay student
        let resp = client
            .post(format!("{base}/circulars/{}/comments", created.id))
            .header(AUTH_HEADER, &token)
            .json(&json!({
                "author": "Priya Sharma",
                "content": "Will practicals be first?",
                "role": "admin"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let comments: Vec<Comment> = resp.json().await.unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].role, Role::Student);
        assert_eq!(comments[0].author, "Priya Sharma");
        handle.abort();
    }

    #[tokio::test]
    async fn comment_requires_token_and_target() {
        let dir = TempDir::new().unwrap();
        let store = temp_store(&dir);
        let created = store.insert(draft("t", "urgent")).unwrap();
        let (base, handle) = spawn_app(store.clone()).await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{base}/circulars/{}/comments", created.id))
            .json(&json!({ "author": "x", "content": "y" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 401);

        let token = auth::mint(SECRET, "Priya", Role::Student);
        let resp = client
            .post(format!("{base}/circulars/ffffffffffffffffffffffffffffffff/comments"))
            .header(AUTH_HEADER, &token)
            .json(&json!({ "author": "x", "content": "y" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);

        let resp = client
            .post(format!("{base}/circulars/{}/comments", created.id))
            .header(AUTH_HEADER, &token)
            .json(&json!({ "author": "", "content": "y" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);

        assert!(store.get(&created.id).unwrap().comments.is_empty());
        handle.abort();
    }

    #[tokio::test]
    async fn read_receipts_append_per_call() {
        let dir = TempDir::new().unwrap();
        let store = temp_store(&dir);
        let created = store.insert(draft("t", "urgent")).unwrap();
        let (base, handle) = spawn_app(store).await;
        let client = reqwest::Client::new();
        let token = auth::mint(SECRET, "Priya Sharma", Role::Student);

        for expected in 1..=2 {
            let resp = client
                .post(format!("{base}/circulars/{}/read", created.id))
                .header(AUTH_HEADER, &token)
                .send()
                .await
                .unwrap();
            assert_eq!(resp.status(), 200);
            let updated: Circular = resp.json().await.unwrap();
            assert_eq!(updated.read_by.len(), expected);
            assert_eq!(updated.read_by[0].name, "Priya Sharma");
        }
        handle.abort();
    }

    #[tokio::test]
    async fn serve_http_bind_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path().to_path_buf());
        // binding to the same address should error because it's already taken
        assert!(
            serve_http(addr, store, SECRET.into(), std::future::pending())
                .await
                .is_err()
        );
    }
}
