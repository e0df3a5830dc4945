mod fact_check;
mod health;

use axum::Router;
use fact_check::fact_check_router;
use health::health_router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub use fact_check::{FactCheckRequest, FactCheckResponse};

pub fn build_router(state: AppState) -> Router {
    let static_dir = state.static_dir();
    let static_files = ServeDir::new(static_dir.as_path()).append_index_html_on_directories(true);

    Router::new()
        .nest("/health", health_router())
        .merge(fact_check_router())
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
