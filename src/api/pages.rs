//! Static presentation pages
//!
//! `/` serves the landing page, `/app` the chat page; other files come from
//! the static directory and anything unknown redirects to `/`, including a
//! GET to an API route.

use std::path::{Path, PathBuf};

use axum::{
    Router,
    handler::HandlerWithoutStateExt,
    http::{Method, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use tower_http::services::ServeDir;

/// Landing page file name inside the static directory
pub const LANDING_PAGE: &str = "landing.html";

/// Chat application page file name inside the static directory
pub const APP_PAGE: &str = "index.html";

/// Build the page router, with the static directory as fallback
pub fn router(static_dir: &Path) -> Router {
    let landing = static_dir.join(LANDING_PAGE);
    let app = static_dir.join(APP_PAGE);

    let serve_dir = ServeDir::new(static_dir).fallback(redirect_home.into_service());

    Router::new()
        .route(
            "/",
            get(move || serve_page(landing.clone(), "Landing page not found")),
        )
        .route(
            "/app",
            get(move || serve_page(app.clone(), "Main application page not found")),
        )
        .fallback_service(serve_dir)
}

async fn serve_page(path: PathBuf, missing: &'static str) -> Response {
    match tokio::fs::read_to_string(&path).await {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "page not found");
            (StatusCode::NOT_FOUND, missing).into_response()
        }
    }
}

/// Known path, wrong method: GET goes home like any unmatched page
pub async fn unmatched_method(method: Method) -> Response {
    if method == Method::GET {
        redirect_home().await.into_response()
    } else {
        StatusCode::METHOD_NOT_ALLOWED.into_response()
    }
}

async fn redirect_home() -> Redirect {
    tracing::debug!("unmatched route, redirecting to landing page");
    Redirect::to("/")
}
