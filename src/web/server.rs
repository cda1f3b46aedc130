//! Web server setup and routing

use anyhow::Context;
use axum::{
    handler::HandlerWithoutStateExt,
    middleware,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::info;

use super::access_log::access_log;
use super::error::unknown_endpoint;
use super::handlers;
use super::state::AppState;
use crate::cli::ServerConfig;
use crate::store::PersonGateway;

/// Where the router mounts the API and which directory backs the fallback
#[derive(Debug, Clone, Default)]
pub struct RouterOptions {
    /// Empty mounts the API at the root
    pub api_prefix: String,
    pub static_dir: Option<PathBuf>,
}

fn api_routes() -> Router<Arc<AppState>> {
    // Wrong methods on known paths answer like unknown paths do
    Router::new()
        .route(
            "/persons",
            get(handlers::list_persons)
                .post(handlers::create_person)
                .fallback(unknown_endpoint),
        )
        .route(
            "/persons/:id",
            get(handlers::get_person)
                .put(handlers::update_person)
                .delete(handlers::delete_person)
                .fallback(unknown_endpoint),
        )
        .route("/info", get(handlers::info).fallback(unknown_endpoint))
}

/// Build the full application router
pub fn build_router(gateway: PersonGateway, options: &RouterOptions) -> Router {
    let state = Arc::new(AppState::new(gateway));

    let api = api_routes();
    let router = if options.api_prefix.is_empty() {
        Router::new().merge(api)
    } else {
        Router::new().nest(&options.api_prefix, api)
    };

    // Static assets are tried after the API, the JSON 404 after both
    let router = match &options.static_dir {
        Some(dir) => router.fallback_service(
            ServeDir::new(dir)
                .call_fallback_on_method_not_allowed(true)
                .fallback(unknown_endpoint.into_service()),
        ),
        None => router.fallback(unknown_endpoint),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router
        .layer(middleware::from_fn(access_log))
        .layer(cors)
        .with_state(state)
}

/// Open the store, bind the port and serve until Ctrl-C
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    let store_uri = config.store_uri()?;
    let store = store_uri
        .open()
        .with_context(|| format!("Failed to open store {}", store_uri))?;
    let gateway = PersonGateway::new(store);
    info!("Using {} store", gateway.backend());

    let options = RouterOptions {
        api_prefix: config.api_prefix.clone(),
        static_dir: config.static_dir.clone(),
    };
    let app = build_router(gateway, &options);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Server running on port {}", config.port);
    if let Some(dir) = &options.static_dir {
        info!("Serving static assets from {:?}", dir);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
