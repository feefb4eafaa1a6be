mod routes;
pub mod schemas;
mod state;

use std::sync::Arc;
use axum::Router;
use log::info;
use tokio::net::TcpListener;
use crate::backend::routes::api_routes;
use crate::backend::state::AppState;
use crate::config::AppConfig;

pub async fn serve(conf: AppConfig) -> anyhow::Result<()> {
    let state = AppState::new(&conf).await?;

    let app = Router::new()
        .merge(api_routes())
        .with_state(Arc::new(state));

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], conf.port));

    info!("Starting render server on port {}", conf.port);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
