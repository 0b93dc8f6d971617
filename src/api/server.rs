#[cfg(test)]
#[path = "server_test.rs"]
mod tests;

use std::sync::Arc;

use axum::{
    Router,
    http::HeaderValue,
    middleware as axum_middleware,
    routing::get,
    routing::post,
};
use eyre::{Context, Result};
use tower_http::cors::{Any, CorsLayer};

use crate::api::{handlers, middleware::log_requests};
use crate::backend::ProviderRouter;
use crate::config::ServerConfig;
use crate::services::{BotService, ChatService};
use crate::storage::ArcStorage;

/// Shared state for the request handlers.
pub struct AppState {
    pub bots: BotService,
    pub chat: ChatService,
    pub storage: ArcStorage,
}

impl AppState {
    pub fn new(storage: ArcStorage, router: ProviderRouter) -> Self {
        let router = Arc::new(router);
        Self {
            bots: BotService::new(storage.clone(), router.clone()),
            chat: ChatService::new(storage.clone(), router),
            storage,
        }
    }
}

pub fn new_router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/generate", post(handlers::generate))
        .route("/bots", get(handlers::list_bots))
        .route(
            "/bots/{id}",
            get(handlers::get_bot)
                .put(handlers::update_bot)
                .delete(handlers::delete_bot),
        )
        .route("/chat", post(handlers::chat))
        .route("/conversations", post(handlers::create_conversation))
        .route(
            "/conversations/{id}",
            get(handlers::get_conversation).delete(handlers::delete_conversation),
        )
        .route(
            "/conversations/bot/{bot_id}",
            get(handlers::list_conversations),
        )
        .route("/admin/tables", get(handlers::list_tables))
        .route("/admin/tables/{table}", get(handlers::view_table))
        .layer(axum_middleware::from_fn(log_requests))
        .layer(cors_layer(&config.cors_origins))
        .with_state(state)
}

/// Binds `config.listen` and serves until ctrl-c.
pub async fn serve(config: &ServerConfig, state: Arc<AppState>) -> Result<()> {
    let app = new_router(state, config);

    let listener = tokio::net::TcpListener::bind(&config.listen)
        .await
        .wrap_err(format!("binding {}", config.listen))?;
    log::info!("Listening on {}", config.listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("serving http")?;

    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", err);
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                log::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
