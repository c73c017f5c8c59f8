use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use codechat::core::config::AppPaths;
use codechat::core::logging;
use codechat::server;
use codechat::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let paths = Arc::new(AppPaths::new());
    logging::init(&paths, "server.log");

    let state = AppState::initialize(paths).context("Failed to initialize application state")?;

    let bind_addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;

    tracing::info!("Listening on http://{}", addr);

    let app: Router = server::router(state);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
