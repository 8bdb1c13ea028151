//! Fileserver hit counter and admin page.
//!
//! Process-wide state with an explicit reset, shared through `AppState` the
//! same way the datastore is.

use std::sync::atomic::Ordering;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{Html, Response};

use crate::config::AppState;

/// Middleware wrapped around the `/app` static mount.
pub async fn count_hits(State(state): State<AppState>, request: Request, next: Next) -> Response {
    state.fileserver_hits.fetch_add(1, Ordering::Relaxed);
    next.run(request).await
}

/// GET /admin/metrics
pub async fn metrics_page(State(state): State<AppState>) -> Html<String> {
    let hits = state.fileserver_hits.load(Ordering::Relaxed);
    Html(format!(
        "<html>\n\n<body>\n\t<h1>Welcome, Chirpy Admin</h1>\n\t<p>Chirpy has been visited {hits} times!</p>\n</body>\n\n</html>\n"
    ))
}

/// /api/reset
pub async fn metrics_reset(State(state): State<AppState>) -> StatusCode {
    state.fileserver_hits.store(0, Ordering::Relaxed);
    StatusCode::OK
}
