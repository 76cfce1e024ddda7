use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use contactscan_core::ServiceConfig;
use contactscan_ocr::{ContactPipeline, OcrBackend};
use tokio::net::TcpListener;
use tracing::info;

mod error;
mod routes;
mod state;
mod telemetry;

use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args_os()
        .nth(1)
        .or_else(|| std::env::var_os("CONTACTSCAN_CONFIG"))
        .map(PathBuf::from);
    let mut config = ServiceConfig::load(config_path.as_deref())?;
    if let Ok(port) = std::env::var("CONTACTSCAN_PORT") {
        config.server.port = port.parse().context("CONTACTSCAN_PORT must be a port number")?;
    }

    telemetry::init(&config.log);

    tokio::fs::create_dir_all(&config.upload.dir)
        .await
        .with_context(|| format!("Failed to create upload directory {}", config.upload.dir.display()))?;

    let pipeline = ContactPipeline::from_config(build_recognizer(&config), &config);
    let phone_pattern = pipeline.phone_pattern();
    let app = routes::router(AppState::new(pipeline, &config));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!(
        language = %config.ocr.language,
        phone_pattern = %phone_pattern,
        "Server is running at http://{addr}"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

#[cfg(feature = "tesseract")]
fn build_recognizer(config: &ServiceConfig) -> Arc<dyn OcrBackend> {
    Arc::new(contactscan_ocr::TesseractRecognizer::new(Some(config.ocr.tessdata_path.clone())))
}

#[cfg(not(feature = "tesseract"))]
fn build_recognizer(_config: &ServiceConfig) -> Arc<dyn OcrBackend> {
    Arc::new(contactscan_ocr::TesseractCli::new())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
