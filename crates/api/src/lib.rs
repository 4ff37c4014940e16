pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;

use axum::{
    Router,
    routing::{get, post},
};
use state::AppState;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Authoring routes (token required)
    let transcript_routes = Router::new()
        .route("/check", get(routes::transcripts::check))
        .route("/upload", post(routes::transcripts::upload))
        .route("/download", get(routes::transcripts::download))
        .route("/choose", post(routes::transcripts::choose))
        .route("/replace", post(routes::transcripts::replace))
        .route("/rename", post(routes::transcripts::rename))
        .route("/save", post(routes::transcripts::save));

    // Learner routes (public)
    let video_routes = Router::new()
        .route(
            "/translation",
            get(routes::video::translation_without_language),
        )
        .route("/translation/{lang}", get(routes::video::translation))
        .route(
            "/available_translations",
            get(routes::video::available_translations),
        )
        .route("/download", get(routes::video::download));

    let api = Router::new()
        .nest("/transcripts", transcript_routes)
        .nest("/video/{locator}/transcript", video_routes);

    let health = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api)
        .merge(health)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
