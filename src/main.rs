mod chatroom;
mod config;
mod error;
mod playback;
mod routes;
mod state;
mod utils {
    pub mod clock;
}

use std::sync::Arc;

use anyhow::Context;
use axum::{extract::DefaultBodyLimit, Extension, Router};
use tower_http::{limit::RequestBodyLimitLayer, services::ServeDir};
use tracing_subscriber::EnvFilter;

use crate::chatroom::RoomRegistry;
use crate::config::Config;
use crate::playback::Coordinator;
use crate::state::{OutboxSize, Rooms, Stage};

const BODY_LIMIT: usize = 64 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = Config::from_env()?;
    let rooms: Rooms = Arc::new(RoomRegistry::new(cfg.room));
    let stage: Stage = Arc::new(Coordinator::new());

    let app = Router::new()
        .merge(routes::router())
        .fallback_service(ServeDir::new(&cfg.static_dir))
        .layer(Extension(rooms))
        .layer(Extension(stage))
        .layer(Extension(OutboxSize(cfg.outbox_size)))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT));

    let listener = tokio::net::TcpListener::bind(cfg.bind_addr)
        .await
        .with_context(|| format!("binding {}", cfg.bind_addr))?;
    tracing::info!(addr = %cfg.bind_addr, static_dir = %cfg.static_dir.display(), "listening");

    axum::serve(listener, app.into_make_service()).await.context("serving")?;
    Ok(())
}
