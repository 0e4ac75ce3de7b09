pub mod routes;
pub mod state;
pub mod ws;

use axum::{
    routing::{get, post},
    Router,
};

use crate::adapters::http::state::HttpState;
use crate::adapters::http::ws::ws_handler;

pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/api/detect", post(routes::detect_upload))
        .route("/api/history", get(routes::list_history))
        .route("/api/history/stats", get(routes::history_stats))
        .route("/api/history/clear", post(routes::clear_history))
        .route(
            "/api/history/clear-filtered",
            post(routes::clear_history_filtered),
        )
        .route(
            "/api/history/:id",
            get(routes::get_history_item).delete(routes::delete_history_item),
        )
        .route("/api/export/csv", get(routes::export_csv))
        .route("/ws", get(ws_handler))
        .with_state(state)
}
