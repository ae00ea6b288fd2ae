mod api;
mod auth;
mod card;
mod catalog;
mod config;
mod error;
mod extract;
mod filter;
mod http;
mod model;
mod seed;
mod server;
mod store;

use std::sync::Arc;

use rmcp::{ServiceExt, transport::stdio};
use tracing::info;
use tracing_subscriber::EnvFilter;

use catalog_common::gemini::{GeminiClient, GeminiClientConfig};

use auth::AdminAuth;
use card::CardBuilder;
use catalog::CatalogService;
use config::Config;
use extract::GeminiExtractor;
use server::CourseCatalogServer;
use store::CourseStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting course-catalog");

    let config = Config::from_env()?;

    let gemini_config = GeminiClientConfig::from_env();
    info!(
        base_url = %gemini_config.base_url,
        model = %gemini_config.model,
        timeout_ms = gemini_config.default_timeout.as_millis(),
        api_key_set = gemini_config.api_key.is_some(),
        "gemini client configured"
    );
    let extractor = Arc::new(GeminiExtractor::new(GeminiClient::new(gemini_config)?));

    let store = CourseStore::from_config(&config);
    info!(backend = store.kind(), "course snapshot store configured");
    if let Some(url) = config.redis_url.as_deref() {
        let probe = catalog_common::redis::RedisCache::new(Some(url));
        if probe.is_available().await {
            info!("redis connected");
        } else {
            info!("redis unavailable, course snapshot will not persist");
        }
    }

    let catalog = CatalogService::load(store, extractor).await;
    let auth = Arc::new(AdminAuth::new(
        config.admin_username.clone(),
        config.admin_password.clone(),
    ));
    let cards = CardBuilder::new(config.whatsapp_number.clone());

    if let Some(addr) = config.http_listen_addr.as_deref() {
        let app = http::router(http::HttpContext {
            catalog,
            auth,
            cards,
            max_upload_bytes: config.max_upload_bytes,
        });
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, "HTTP API ready");
        axum::serve(listener, app).await.inspect_err(|e| {
            tracing::error!(error = %e, "HTTP server error");
        })?;
        info!("HTTP server shut down");
        return Ok(());
    }

    let server = CourseCatalogServer::new(catalog, auth, cards);

    info!("MCP server ready, serving on stdio");
    let service = server.serve(stdio()).await.inspect_err(|e| {
        tracing::error!(error = %e, "MCP server error");
    })?;

    service.waiting().await?;
    info!("MCP server shut down");
    Ok(())
}
