mod config;
mod dto;
mod extractor;
mod handlers;
mod llm;
mod models;
mod repository;
mod service;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use handlers::rest::{self, AppState};
use llm::OpenAiClient;
use repository::{JsonFileRepository, NoteRepository};
use service::{NoteService, SummaryService};

#[tokio::main]
async fn main() {
    // Log setup
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load config
    let cfg = config::load_config().unwrap_or_else(|e| {
        tracing::error!("Failed to load config: {e}");
        panic!("failed to load config: {e}");
    });

    // Repository creation, loads the last snapshot
    let repo = JsonFileRepository::open(&cfg.notes_file)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to open notes file: {e}");
            panic!("failed to open notes file: {e}");
        });
    tracing::info!("Notes are stored in {}", repo.path().display());
    let repo: Box<dyn NoteRepository> = Box::new(repo);
    let repo_ptr = Arc::new(tokio::sync::Mutex::new(repo));

    // Service creation
    let client = OpenAiClient::new(&cfg.summarizer).unwrap_or_else(|e| {
        tracing::error!("Failed to build completion client: {e}");
        panic!("failed to build completion client: {e}");
    });
    let state = AppState {
        notes: Arc::new(NoteService::new(repo_ptr)),
        summaries: Arc::new(SummaryService::new(
            Arc::new(client),
            cfg.summarizer.clone(),
        )),
    };

    // Router config
    let router = rest::router(state, cfg.max_upload_size);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", cfg.port))
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to bind port {}: {e}", cfg.port);
            panic!("failed to bind port {}: {e}", cfg.port);
        });
    let addr = listener
        .local_addr()
        .expect("bound listener has a local address");

    tracing::info!("StudyBuddy server starting, listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap_or_else(|e| {
            tracing::error!("HTTP server error: {e}");
            panic!("failed to start HTTP server: {e}");
        });

    tracing::info!("Server stopped");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
