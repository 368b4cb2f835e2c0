use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod cache;
pub mod error;
pub mod export;
pub mod handlers;
pub mod pages;
pub mod render;
pub mod session;
pub mod state;

pub use error::WebError;
pub use export::{export, ExportSummary};
pub use state::{AppState, CommentsConfig};

pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/", get(handlers::home))
        .route("/post/:slug", get(handlers::post))
        .route("/api/posts", get(handlers::api_posts))
        .route("/api/preview", get(handlers::enter_preview))
        .route("/api/exit-preview", get(handlers::exit_preview))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub mod prelude {
    pub use crate::{create_app, export, AppState, CommentsConfig, ExportSummary};
    pub use st_core::{Error, Preview, Result, SiteSettings};
}
