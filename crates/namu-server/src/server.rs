//! Server startup.

use std::net::SocketAddr;
use tokio::net::TcpListener;

use namu_core::Result;

use crate::routing::create_router;
use crate::state::AppState;

/// Bind `addr` and serve until the process exits.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "namu server listening");
    axum::serve(listener, create_router(state)).await?;
    Ok(())
}
