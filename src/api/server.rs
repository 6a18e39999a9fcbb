use std::net::SocketAddr;
use std::sync::{Arc, RwLock};

use anyhow::{Result, anyhow};
use axum::middleware;
use axum::{Router, extract::Request, response::Response};
use http::{HeaderValue, header};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use super::routes;
use crate::api::state::AppState;
use crate::core::{
    AppConfig,
    db::{async_db, initialize_db},
};
use crate::gemini::GeminiClient;
use crate::jobs::{SweepRateLimits, spawn_periodic_job};

async fn set_static_cache_control(request: Request, next: middleware::Next) -> Response {
    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    response
}

pub fn app(shared_state: Arc<RwLock<AppState>>) -> Router {
    let cors = CorsLayer::permissive();
    let static_path = shared_state
        .read()
        .expect("Unable to read share state")
        .config
        .static_path
        .clone();

    Router::new()
        // API routes
        .nest("/api", routes::router())
        // Static server of the chat front end
        .fallback_service(
            ServiceBuilder::new()
                .layer(middleware::from_fn(set_static_cache_control))
                .service(
                    ServeDir::new(static_path)
                        .precompressed_br()
                        .precompressed_gzip(),
                ),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::clone(&shared_state))
}

// Run the server
pub async fn serve(host: String, port: String, config: AppConfig) -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                // axum logs rejections from built-in extractors with the `axum::rejection`
                // target, at `TRACE` level. `axum::rejection=trace` enables showing those events
                format! {
                    "{}=debug,tower_http=debug,axum::rejection=trace",
                    env!("CARGO_CRATE_NAME")
                }
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db = async_db(&config.db_path)
        .await
        .map_err(|e| anyhow!("Failed to connect to async db: {}", e))?;
    db.call(|conn| Ok(initialize_db(conn)?)).await?;
    tracing::info!("Database tables created successfully");

    let llm = GeminiClient::new(
        &config.gemini_api_hostname,
        &config.gemini_api_key,
        &config.gemini_model,
        config.llm_timeout,
    );
    if llm.is_configured() {
        tracing::info!("Gemini API configured with model: {}", config.gemini_model);
    } else {
        tracing::warn!("GEMINI_API_KEY is not set in environment variables!");
    }

    let app_state = AppState::new(db.clone(), config.clone(), Arc::new(llm));
    let limiter = app_state.chat.limiter().clone();
    let shared_state = Arc::new(RwLock::new(app_state));
    let app = app(Arc::clone(&shared_state));

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;

    tracing::debug!("Server started. Listening on {}", listener.local_addr()?);

    // Evict idle clients from the rate limiter so memory doesn't grow
    // with every address ever seen
    let sweep = SweepRateLimits::new(limiter, config.rate_limit_sweep_interval);
    spawn_periodic_job(config, db, sweep);

    // Peer addresses are needed to rate limit by client
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
