use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;

use crate::config::initialize_app_state_with_url;
use crate::router::create_router;
use crate::schemas::AppState;

/// Start the HTTP server against an already-migrated database.
pub async fn serve(database_url: &str, bind_address: &str) -> Result<()> {
    let state = initialize_app_state_with_url(database_url).await?;
    run(state, bind_address).await
}

/// Bind the listener and run the router until shutdown.
pub(super) async fn run(state: AppState, bind_address: &str) -> Result<()> {
    info!(
        otp_ttl_minutes = state.otp_ttl_minutes,
        "Application state ready"
    );
    let app = create_router(state);

    let listener = TcpListener::bind(bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;

    info!("Budget Buddy API listening on http://{}", bind_address);
    info!("Swagger UI at http://{}/swagger-ui", bind_address);

    axum::serve(listener, app).await.context("server error")?;
    info!("Server shut down");
    Ok(())
}
