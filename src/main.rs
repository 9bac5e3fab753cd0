use std::sync::Arc;

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use dotenv::dotenv;
use tokio::sync::Mutex;
use tracing::info;

use review_comments::{
    config::settings::Settings, document::MemoryDocument, fetch::HttpCommentsSource,
    session::Session,
};

mod bridge;

use bridge::SharedSession;

async fn load_document(settings: &Settings) -> anyhow::Result<MemoryDocument> {
    let Some(path) = &settings.document_path else {
        info!("no DOCUMENT_PATH set, starting with an empty document");
        return Ok(MemoryDocument::new());
    };

    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading document snapshot {}", path.display()))?;
    let document = MemoryDocument::from_json(&json)
        .with_context(|| format!("parsing document snapshot {}", path.display()))?;

    info!("document loaded from {}", path.display());
    Ok(document)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let settings = Settings::new();

    let document = load_document(&settings).await?;
    let source = HttpCommentsSource::new(&settings.api_base, settings.http_timeout)
        .context("building comments client")?;
    let session = Session::new(document, source, settings.file_key.clone())
        .with_token(settings.token.clone());

    info!("{:?}", session.ready_message());

    let shared: SharedSession = Arc::new(Mutex::new(session));

    let api_router = Router::new()
        .route("/ready", get(bridge::ready::<HttpCommentsSource>))
        .route("/messages", post(bridge::post_message::<HttpCommentsSource>))
        .route("/window", get(bridge::get_window::<HttpCommentsSource>));

    let app = Router::new()
        .route("/", get(|| async { "Review comments bridge" }))
        .nest("/api", api_router)
        .with_state(shared);

    info!("Bridge running on http://localhost:{}", settings.port);

    let listener = tokio::net::TcpListener::bind(settings.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
