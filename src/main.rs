use agent_hub::config::AppConfig;
use agent_hub::mcp::McpHub;
use agent_hub::state::AppState;
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::streamable_http_server::StreamableHttpService;
use std::sync::Arc;

/// Runs the MCP tool surface on its own HTTP listener (spec §4.8), separate
/// from Rocket's REST/WS port — rmcp's streamable-http transport wants its
/// own hyper stack rather than sharing Rocket's.
async fn spawn_mcp_server(state: AppState, port: u16) {
    let service = StreamableHttpService::new(
        move || Ok(McpHub::new(state.clone())),
        Arc::new(LocalSessionManager::default()),
        Default::default(),
    );
    let router = axum::Router::new().nest_service("/mcp", service);

    let addr = format!("0.0.0.0:{port}");
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "failed to bind MCP listener");
            return;
        }
    };
    tracing::info!(%addr, "MCP tool surface listening");
    if let Err(e) = axum::serve(listener, router).await {
        tracing::error!(error = %e, "MCP server exited");
    }
}

#[rocket::main]
async fn main() -> Result<(), rocket::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = AppConfig::from_env();
    if let Some(parent) = std::path::Path::new(&config.database_path).parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let state = AppState::new(config).expect("failed to build application state");
    state.registry.spawn_ghost_sweep();

    let mcp_port: u16 = std::env::var("MCP_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8090);
    tokio::spawn(spawn_mcp_server(state.clone(), mcp_port));

    agent_hub::rocket_with_state(state).launch().await?;
    Ok(())
}
