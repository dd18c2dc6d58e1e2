//! HTTP routes

use crate::handler::IndexHandler;
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
struct AppState {
    handler: IndexHandler,
    requests: CancellationToken,
}

/// Build the repository routes
///
/// `/index.yaml` goes through `handler`; `/charts/*` serves archives from
/// `charts_dir`. Each index request runs under a child of `requests`, so
/// cancelling `requests` aborts every in-flight delay and admission wait.
/// A client that disconnects has its handler future dropped by hyper, which
/// ends the same waits and returns the permit.
#[must_use]
pub fn router(handler: IndexHandler, charts_dir: &Path, requests: CancellationToken) -> Router {
    let state = AppState { handler, requests };

    Router::new()
        .route("/index.yaml", get(index_yaml))
        .nest_service("/charts", ServeDir::new(charts_dir))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn index_yaml(State(state): State<AppState>) -> Response {
    let cancel = state.requests.child_token();
    state.handler.respond(&cancel).await
}
