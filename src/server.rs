//! HTTP surface: one stateless handler per panel endpoint.
//!
//! Handlers only read the shared [`Registry`]. Polars work runs on the
//! blocking pool so it never stalls the reactor.

use crate::chart_export::render_svg;
use crate::dashboard::{Dashboard, Layout, PanelOutput, Registry};
use crate::error_display::user_message_from_report;
use crate::page;
use crate::selection::Selection;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct AppState {
    registry: Arc<Registry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SelectionQuery {
    pub country: Option<String>,
}

impl SelectionQuery {
    fn selection(&self) -> Selection {
        Selection::parse(self.country.as_deref())
    }
}

/// An error returned to the client as `{"error": message}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

pub fn router(registry: Registry) -> Router {
    let state = AppState {
        registry: Arc::new(registry),
    };
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/{dashboard}", get(dashboard_page))
        .route("/api/{dashboard}/layout", get(layout))
        .route("/api/{dashboard}/panels", get(all_panels))
        .route("/api/{dashboard}/panels/{key}", get(one_panel))
        .route("/api/{dashboard}/svg/{key}", get(svg_panel))
        .with_state(state)
}

/// Bind `addr` and serve until the process stops.
pub async fn serve(addr: SocketAddr, registry: Registry) -> color_eyre::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    serve_on(listener, registry).await
}

/// Serve on an already bound listener.
pub async fn serve_on(listener: TcpListener, registry: Registry) -> color_eyre::Result<()> {
    let local = listener.local_addr()?;
    for id in registry.ids() {
        info!("dashboard available at http://{}/{}", local, id);
    }
    axum::serve(listener, router(registry)).await?;
    Ok(())
}

fn dashboard(state: &AppState, id: &str) -> Result<Arc<dyn Dashboard>, ApiError> {
    state
        .registry
        .get(id)
        .ok_or_else(|| ApiError::not_found(format!("Unknown dashboard '{}'", id)))
}

/// Run `f` on the blocking pool, mapping failures to a 500 with a readable message.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> color_eyre::Result<T> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(report)) => {
            warn!(error = %report, "panel computation failed");
            Err(ApiError::internal(user_message_from_report(&report, None)))
        }
        Err(join) => {
            warn!(error = %join, "panel task did not complete");
            Err(ApiError::internal("Panel computation was interrupted"))
        }
    }
}

async fn index(State(state): State<AppState>) -> Html<String> {
    let entries: Vec<(&str, &str)> = state
        .registry
        .iter()
        .map(|d| (d.id(), d.title()))
        .collect();
    Html(page::render_index(&entries))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn dashboard_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, ApiError> {
    let dashboard = dashboard(&state, &id)?;
    Ok(Html(page::render_dashboard(dashboard.layout())))
}

async fn layout(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Layout>, ApiError> {
    let dashboard = dashboard(&state, &id)?;
    Ok(Json(dashboard.layout().clone()))
}

async fn all_panels(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<SelectionQuery>,
) -> Result<Json<BTreeMap<String, PanelOutput>>, ApiError> {
    let dashboard = dashboard(&state, &id)?;
    let selection = query.selection();
    let started = Instant::now();
    let label = selection.label().to_string();

    let outputs = blocking(move || dashboard.render_all(&selection)).await?;
    info!(
        dashboard = %id,
        selection = %label,
        panels = outputs.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "rendered all panels"
    );
    Ok(Json(outputs))
}

async fn render_panel(
    state: &AppState,
    id: &str,
    key: &str,
    query: &SelectionQuery,
) -> Result<PanelOutput, ApiError> {
    let dashboard = dashboard(state, id)?;
    if dashboard.panel(key).is_none() {
        return Err(ApiError::not_found(format!(
            "Unknown panel '{}' on dashboard '{}'",
            key, id
        )));
    }
    let selection = query.selection();
    let started = Instant::now();
    let label = selection.label().to_string();

    let key_owned = key.to_string();
    let output = blocking(move || dashboard.render(&key_owned, &selection)).await?;
    info!(
        dashboard = %id,
        panel = %key,
        selection = %label,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "rendered panel"
    );
    Ok(output)
}

async fn one_panel(
    State(state): State<AppState>,
    Path((id, key)): Path<(String, String)>,
    Query(query): Query<SelectionQuery>,
) -> Result<Json<PanelOutput>, ApiError> {
    let output = render_panel(&state, &id, &key, &query).await?;
    Ok(Json(output))
}

async fn svg_panel(
    State(state): State<AppState>,
    Path((id, key)): Path<(String, String)>,
    Query(query): Query<SelectionQuery>,
) -> Result<Response, ApiError> {
    let dashboard = dashboard(&state, &id)?;
    match dashboard.panel(&key) {
        None => {
            return Err(ApiError::not_found(format!(
                "Unknown panel '{}' on dashboard '{}'",
                key, id
            )))
        }
        Some(panel) if !panel.renders_to_svg() => {
            return Err(ApiError::bad_request(format!(
                "Panel '{}' has no SVG rendering",
                key
            )))
        }
        Some(_) => {}
    }

    let output = render_panel(&state, &id, &key, &query).await?;
    let spec = match output {
        PanelOutput::Chart(spec) => spec,
        PanelOutput::Card(_) => {
            return Err(ApiError::bad_request(format!(
                "Panel '{}' has no SVG rendering",
                key
            )))
        }
    };
    let svg = blocking(move || render_svg(&spec)).await?;
    debug!(dashboard = %id, panel = %key, bytes = svg.len(), "svg rendered");
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response())
}
