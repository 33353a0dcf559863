//! Browser UI: an upload form, a result view and an example gallery on top
//! of the detect-and-retrieve pipeline.

mod error;
mod handlers;
pub mod page;

pub use error::{ApiError, ApiErrorResponse, ErrorResponse};
pub use handlers::{DetectReply, ExampleSummary};

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::catalog::ExampleCatalog;
use crate::pipeline::DetectPipeline;

/// Largest accepted upload
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: DetectPipeline,
    pub catalog: Arc<ExampleCatalog>,
    index_html: Arc<str>,
}

impl AppState {
    pub fn new(pipeline: DetectPipeline, catalog: ExampleCatalog) -> Self {
        let index_html = page::render_index(&catalog).into();
        Self {
            pipeline,
            catalog: Arc::new(catalog),
            index_html,
        }
    }

    pub fn index_html(&self) -> &str {
        &self.index_html
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index_handler))
        .route("/health", get(handlers::health_handler))
        .route("/api/examples", get(handlers::list_examples_handler))
        .route("/api/detect", post(handlers::detect_upload_handler))
        .route("/api/examples/:id/detect", post(handlers::detect_example_handler))
        .route("/examples/:id/image", get(handlers::example_image_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the UI until Ctrl-C
pub async fn serve(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("FoD detection UI listening on http://{}", listener.local_addr()?);

    axum::serve(listener, create_app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}
