mod adapters;
mod application;
mod domain;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::adapters::{
    http::{router, state::HttpState},
    onnx::engine::OnnxDetector,
    sqlite::store::SqliteVerdictStore,
};
use crate::application::services::{HistoryService, InspectionService};

/// Visual quality-control server: object detection plus rule-based
/// pass/fail reasoning, with persisted verdict history.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Port to listen on.
    #[arg(long, env = "QC_PORT", default_value_t = 8000)]
    port: u16,

    /// SQLite history database path (created if missing).
    #[arg(long, env = "QC_DB", default_value = "history.db")]
    db: PathBuf,

    /// ONNX detector weights.
    #[arg(long, env = "QC_MODEL", default_value = "models/best.onnx")]
    model: PathBuf,

    /// Directory of static frontend files.
    #[arg(long, env = "QC_FRONTEND", default_value = "frontend")]
    frontend: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let store = Arc::new(SqliteVerdictStore::open(&args.db).await?);
    tracing::info!(db = %args.db.display(), "history store ready");

    let detector = Arc::new(OnnxDetector::load(&args.model)?);
    tracing::info!(model = %args.model.display(), "detector loaded");

    let state = HttpState {
        inspection: Arc::new(InspectionService::new(detector, store.clone())),
        history: Arc::new(HistoryService::new(store)),
    };

    let app = router(state)
        .fallback_service(ServeDir::new(&args.frontend))
        .layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", args.port);
    tracing::info!("listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
