//! HTTP surface: routes, shared state and server startup.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod schema;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::{Config, ServerConfig};
use crate::error::Result;
use crate::media::MediaProcessorFactory;
use crate::storage::Storage;
use crate::workflow::Workflow;
use schema::{CompressForm, CropForm, CutForm, ResizeForm, VolumeForm};

pub struct AppState {
    pub workflow: Workflow,
}

impl AppState {
    pub fn new(workflow: Workflow) -> Self {
        Self { workflow }
    }

    /// Open the storage directories and wire the ffmpeg processor
    pub async fn from_config(config: &Config) -> Result<Self> {
        let storage = Storage::new(&config.storage).await?;
        let media = MediaProcessorFactory::create_processor(config.media.clone());
        Ok(Self::new(Workflow::new(storage, media)))
    }
}

/// Build the application router
pub fn router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/upload", post(handlers::upload))
        .route("/process/compress", post(handlers::process::<CompressForm>))
        .route("/process/resize", post(handlers::process::<ResizeForm>))
        .route("/process/cut", post(handlers::process::<CutForm>))
        .route("/process/audio-volume", post(handlers::process::<VolumeForm>))
        .route("/process/crop-image", post(handlers::process::<CropForm>))
        .route("/process/create-video", post(handlers::create_video))
        .route("/download/{filename}", get(handlers::download))
        .route("/files", get(handlers::list_files))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes()))
        .layer(setup_cors(config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn setup_cors(config: &ServerConfig) -> CorsLayer {
    if config.allows_any_origin() {
        warn!("CORS configured to allow all origins");
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Bind and serve until Ctrl+C or SIGTERM
pub async fn serve(config: &Config) -> Result<()> {
    let state = Arc::new(AppState::from_config(config).await?);

    if !state.workflow.media().is_available().await {
        warn!(
            "Media processor {} is not available; processing requests will fail",
            config.media.binary_path
        );
    }

    let app = router(state, &config.server);
    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        addr = %addr,
        upload_dir = %config.storage.upload_dir.display(),
        output_dir = %config.storage.output_dir.display(),
        ffmpeg = %config.media.binary_path,
        max_upload_mb = config.server.max_upload_mb,
        "Server ready and accepting connections"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }

    info!("Shutting down gracefully...");
}
