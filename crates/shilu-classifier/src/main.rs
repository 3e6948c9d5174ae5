mod api;
mod batch;
mod config;
mod error;
mod server;
mod storage;

use rmcp::{ServiceExt, transport::stdio};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;
use server::{AppState, ShiluServer};
use shilu_core::taxonomy::Taxonomy;
use storage::Storage;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing to stderr (stdout is reserved for MCP JSON-RPC)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting shilu-classifier MCP server");

    // 1. Load config from environment
    let config = Config::from_env()?;
    info!(
        data_dir = %config.data_dir.display(),
        classified = %config.classified_file,
        keywords = %config.keyword_file,
        history = %config.history_file,
        "configuration loaded"
    );

    // 2. Load persisted state (missing or corrupt files fall back to empty defaults)
    let storage = Storage::open(&config)?;
    let state = AppState::load(&storage)?;
    let taxonomy = Taxonomy::builtin();
    info!(
        articles = state.classified.total_count(),
        keyword_categories = state.keywords.merged_keywords().len(),
        history = state.history.len(),
        "state loaded"
    );

    // 3. Build MCP server and serve on TCP or stdio
    let server = ShiluServer::new(state, taxonomy, storage);

    if let Ok(addr) = std::env::var("MCP_TCP_LISTEN_ADDR") {
        let listener = TcpListener::bind(&addr).await?;
        info!(listen_addr = %addr, "MCP server ready, serving on TCP");
        loop {
            let (stream, peer) = listener.accept().await?;
            let server = server.clone();
            tokio::spawn(async move {
                tracing::info!(peer = %peer, "MCP client connected");
                let service = server.serve(stream).await.inspect_err(|e| {
                    tracing::error!(error = %e, "MCP server error");
                })?;
                service.waiting().await?;
                tracing::info!(peer = %peer, "MCP client disconnected");
                Ok::<(), anyhow::Error>(())
            });
        }
    } else {
        info!("MCP server ready, serving on stdio");
        let service = server.serve(stdio()).await.inspect_err(|e| {
            tracing::error!(error = %e, "MCP server error");
        })?;
        service.waiting().await?;
        info!("MCP server shut down");
    }
    Ok(())
}
