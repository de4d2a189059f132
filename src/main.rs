// ── Chatmark: Entry Point ──────────────────────────────────────────────────
// Wire-up only: logging, config, fixture store, router, serve.

use std::path::Path;

use anyhow::Context;
use log::info;

use chatmark::api::{self, AppState};
use chatmark::{fixtures, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path =
        std::env::var("CHATMARK_CONFIG").unwrap_or_else(|_| "chatmark.toml".to_string());
    let config = ServerConfig::load(Path::new(&config_path))?;

    std::fs::create_dir_all(&config.upload_dir)
        .with_context(|| format!("create upload dir {}", config.upload_dir.display()))?;

    let store = fixtures::demo_store().context("build demo store")?;
    let chatbox = fixtures::load_chatbox(config.chatbox_path.as_deref());

    let addr = format!("{}:{}", config.bind_address, config.port);
    let state = AppState::new(config, store, chatbox);
    let app = api::router(state)?;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    info!("[chatmark] Listening on http://{addr}");

    axum::serve(listener, app).await.context("server exited")?;
    Ok(())
}
