use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod config;
mod dto;
mod error;
mod handlers;
mod models;
mod services;

use config::Config;
use services::blob::{self, BlobStore};
use services::day_buckets::DayBuckets;
use services::outcome::SpinConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub buckets: DayBuckets,
    pub blob: Arc<dyn BlobStore>,
}

impl AppState {
    pub fn new(config: Arc<Config>, blob: Arc<dyn BlobStore>) -> Self {
        let buckets = DayBuckets::new(config.blob_prefix.clone());
        Self {
            config,
            buckets,
            blob,
        }
    }

    pub fn spin_config(&self) -> SpinConfig {
        SpinConfig {
            duration: self.config.spin_duration(),
            tick: self.config.spin_tick(),
        }
    }
}

pub fn build_app(state: AppState) -> Router {
    let allowed_origins: Vec<HeaderValue> = {
        let mut origins = Vec::new();
        match state.config.frontend_url.parse::<HeaderValue>() {
            Ok(hv) => origins.push(hv),
            Err(_) => tracing::warn!(
                origin = %state.config.frontend_url,
                "FRONTEND_URL is not a valid origin"
            ),
        }
        if let Ok(extra) = std::env::var("CORS_EXTRA_ORIGINS") {
            for o in extra.split(',') {
                if let Ok(hv) = o.trim().parse::<HeaderValue>() {
                    origins.push(hv);
                }
            }
        }
        origins
    };
    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route(
            "/api/default",
            post(handlers::submissions::submit_survey).get(handlers::submissions::list_buckets),
        )
        .route("/api/score", post(handlers::score::score_answers))
        .route("/ws/spin", get(handlers::spin::spin_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "deer_draw_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env());

    let blob_store = blob::from_config(&config).expect("Failed to build blob store");

    // Unarchived buckets live only as long as this process.
    let state = AppState::new(config.clone(), blob_store);
    let app = build_app(state);

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app).await.expect("Server error");
}
