use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::session::{Recorder, Session};

use super::api::fixes as fix_handlers;
use super::api::track as track_handlers;
use super::api_doc::ApiDoc;
use super::auth::AppState;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Location API endpoints
        .route("/api/fixes", post(fix_handlers::submit_fix))
        .route("/api/location", get(fix_handlers::current_location))
        // Recording API endpoints
        .route("/api/recording/start", post(track_handlers::start_recording))
        .route("/api/recording/stop", post(track_handlers::stop_recording))
        .route("/api/recording/mode", get(track_handlers::recording_mode))
        // Track API endpoints
        .route("/api/track", get(track_handlers::track_summary))
        .route("/api/track/waypoints", get(track_handlers::track_waypoints))
        .route("/api/track/steps", put(track_handlers::set_step_count))
        .route("/api/track/duration", put(track_handlers::set_duration))
        // OpenAPI / Swagger
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(config: Config) -> std::io::Result<()> {
    let bind_addr = config.web.bind.clone();
    if config.api_keys.is_empty() {
        log::warn!("No API keys configured, every request will be rejected");
    }

    let recorder = Recorder::spawn(Session::new(config.location, config.stopover));
    let state = AppState {
        config: Arc::new(config),
        recorder: recorder.handle(),
    };
    let app = router(state);

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if let Some(session) = recorder.shutdown().await {
        if let Some(summary) = session.summary() {
            log::info!(
                "Last track {}: {} waypoints, {:.0} m",
                summary.id,
                summary.waypoint_count,
                summary.total_distance_m
            );
        }
    }
    result
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
    }
    log::info!("Shutting down");
}
