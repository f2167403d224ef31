use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, Method, StatusCode},
    routing::{any, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;
use tracing::info;

pub const ACCESS_TOKEN_HEADER: &str = "x-access-token";

/// Last frames pushed to a widget.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WidgetState {
    pub frames: Vec<Value>,
    pub version: Option<String>,
}

#[derive(Deserialize)]
pub struct WidgetUpdate {
    pub frames: Vec<Value>,
}

pub type Db = Arc<RwLock<HashMap<String, WidgetState>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/api/v1/dev/widget/update/{widget_id}", post(update_widget))
        .route(
            "/api/v1/dev/widget/update/{widget_id}/{version}",
            post(update_widget_version),
        )
        .route("/api/v1/dev/widget/{widget_id}", get(get_widget))
        .route("/api/v1/dev/echo", any(echo))
        .layer(TraceLayer::new_for_http())
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

type ApiReply = (StatusCode, Json<Value>);

fn errors(status: StatusCode, message: &str) -> ApiReply {
    (status, Json(json!({ "errors": [{ "message": message }] })))
}

fn has_access_token(headers: &HeaderMap) -> bool {
    headers
        .get(ACCESS_TOKEN_HEADER)
        .is_some_and(|value| !value.is_empty())
}

async fn update_widget(
    State(db): State<Db>,
    Path(widget_id): Path<String>,
    headers: HeaderMap,
    body: String,
) -> ApiReply {
    store_frames(db, widget_id, None, &headers, &body).await
}

async fn update_widget_version(
    State(db): State<Db>,
    Path((widget_id, version)): Path<(String, String)>,
    headers: HeaderMap,
    body: String,
) -> ApiReply {
    store_frames(db, widget_id, Some(version), &headers, &body).await
}

async fn store_frames(
    db: Db,
    widget_id: String,
    version: Option<String>,
    headers: &HeaderMap,
    body: &str,
) -> ApiReply {
    if !has_access_token(headers) {
        return errors(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    let Ok(update) = serde_json::from_str::<WidgetUpdate>(body) else {
        return errors(StatusCode::BAD_REQUEST, "body must contain a frames array");
    };

    let count = update.frames.len();
    info!(%widget_id, ?version, frames = count, "widget updated");
    db.write().await.insert(
        widget_id,
        WidgetState {
            frames: update.frames,
            version,
        },
    );
    (
        StatusCode::OK,
        Json(json!({ "success": { "data": { "frames": count } } })),
    )
}

async fn get_widget(State(db): State<Db>, Path(widget_id): Path<String>) -> ApiReply {
    match db.read().await.get(&widget_id) {
        Some(state) => (StatusCode::OK, Json(json!(state))),
        None => errors(StatusCode::NOT_FOUND, "widget not found"),
    }
}

/// Reflect the request back so clients can inspect what they sent.
async fn echo(
    method: Method,
    Query(query): Query<Vec<(String, String)>>,
    headers: HeaderMap,
    body: String,
) -> Json<Value> {
    let headers: serde_json::Map<String, Value> = headers
        .iter()
        .filter_map(|(name, value)| {
            let value = value.to_str().ok()?;
            Some((name.as_str().to_string(), Value::from(value)))
        })
        .collect();
    let body = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&body).unwrap_or(Value::String(body))
    };

    Json(json!({
        "method": method.as_str(),
        "query": query,
        "headers": headers,
        "body": body,
    }))
}
