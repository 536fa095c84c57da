//! HTTP server for mindcoachd

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware::from_fn_with_state,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::ai_service::AiService;
use crate::config::Config;
use crate::llm_client::{HttpLlmClient, LlmClient};
use crate::middleware::{self, RateLimiter};
use crate::routes;
use crate::store::Store;

/// How often idle rate-limiter keys are swept
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub ai: Arc<AiService>,
    pub config: Arc<Config>,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    pub fn new(config: Config, store: Store, client: Option<Arc<dyn LlmClient>>) -> Self {
        let ai = AiService::new(client, store.clone(), config.llm.clone());
        Self {
            store,
            ai: Arc::new(ai),
            config: Arc::new(config),
            rate_limiter: RateLimiter::new(),
        }
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
        .max_age(Duration::from_secs(60 * 60))
}

/// Full application router: `/api/v1` routes plus middleware.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::root_routes())
        .merge(routes::auth_routes())
        .merge(routes::user_routes())
        .merge(routes::mood_routes())
        .merge(routes::error_routes())
        .merge(routes::messenger_routes())
        .merge(routes::painting_routes())
        .merge(routes::report_routes())
        .merge(routes::ai_routes())
        .merge(routes::emotional_aid_routes());

    let max_body = state.config.server.max_body_bytes;
    let cors = cors_layer(&state.config.server.cors_origins);

    Router::new()
        .nest("/api/v1", api)
        .layer(DefaultBodyLimit::max(max_body))
        .layer(from_fn_with_state(state.clone(), middleware::rate_limit))
        .layer(from_fn_with_state(state.clone(), middleware::body_size_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Build the LLM client when a key is configured.
pub fn llm_client(config: &Config) -> Result<Option<Arc<dyn LlmClient>>> {
    if !config.llm.is_configured() {
        warn!("No LLM API key configured, AI features will use fallback responses");
        return Ok(None);
    }
    let client = HttpLlmClient::new(config.llm.clone())?;
    info!("LLM: {} via {}", config.llm.model, config.llm.base_url);
    Ok(Some(Arc::new(client)))
}

/// Run the HTTP server until Ctrl+C or SIGTERM
pub async fn run(config: Config) -> Result<()> {
    let store = Store::open(&config.database.path)?;
    info!("Database: {}", config.database.path.display());

    let client = llm_client(&config)?;
    let bind_addr = config.server.bind_addr.clone();
    let state = AppState::new(config, store, client);

    let limiter = state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            limiter.cleanup().await;
        }
    });

    let app = build_router(state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
