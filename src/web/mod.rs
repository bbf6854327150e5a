//! HTTP surface of the console.

use axum::{
    extract::{Query, Request, State},
    middleware::{self as axum_middleware, Next},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::api::BatchApi;
use crate::console::Console;
use crate::gate::{AccessGate, GateState};
use crate::html::Nav;

pub mod error;
pub mod handlers;
pub mod page;

pub const PERMISSION_PATH: &str = "/permission";

/// Shared server state. There is one `Console` for the whole server, so every
/// operator with a valid token sees the same draft and delete confirmation.
pub struct AppState {
    pub api: Arc<dyn BatchApi>,
    pub gate: AccessGate,
    pub console: Mutex<Console>,
}

impl AppState {
    pub fn new(api: Arc<dyn BatchApi>, gate: AccessGate) -> Self {
        Self {
            api,
            gate,
            console: Mutex::new(Console::new()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    token: Option<String>,
}

/// Run the access gate for this navigation; denied requests go to the
/// permission page.
pub async fn require_token(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TokenQuery>,
    mut req: Request,
    next: Next,
) -> Response {
    let gate = state.gate.evaluate(query.token.as_deref()).await;
    debug!(path = %req.uri().path(), ?gate, "gate evaluated navigation");

    match (gate, query.token) {
        (GateState::Granted, Some(token)) => {
            req.extensions_mut().insert(Nav::new(token));
            next.run(req).await
        }
        _ => Redirect::to(PERMISSION_PATH).into_response(),
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let management = Router::new()
        .route("/", get(handlers::index))
        .route("/refresh", post(handlers::refresh))
        .route("/batches/new", get(handlers::new_batch))
        .route("/batches/form", post(handlers::submit_form))
        .route("/batches/form/cancel", post(handlers::cancel_form))
        .route("/batches/delete/cancel", post(handlers::cancel_delete))
        .route("/batches/{key}/edit", get(handlers::edit_batch))
        .route(
            "/batches/{key}/delete",
            get(handlers::confirm_delete).post(handlers::delete_batch),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_token,
        ));

    Router::new()
        .merge(management)
        .route(PERMISSION_PATH, get(handlers::permission_denied))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
