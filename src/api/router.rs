use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::catalog::VideoAggregator;
use crate::core::auth::AdminAuth;
use crate::core::config::AppConfig;
use crate::interactions::{CommentRepository, LikeRepository};
use crate::metadata::MetadataStore;
use crate::storage::ObjectStore;

use super::handlers;

// ---------------------------------------------------------------------------
// Application state and router
// ---------------------------------------------------------------------------

/// Application state shared across all handlers.
///
/// Storage and the interaction repositories are trait objects: the backend
/// behind each seam (S3 vs in-memory, persistent vs process-local) is chosen
/// at startup from configuration without touching the handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ObjectStore>,
    pub metadata: Arc<MetadataStore>,
    pub aggregator: Arc<VideoAggregator>,
    pub likes: Arc<dyn LikeRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub auth: Arc<AdminAuth>,
    pub config: AppConfig,
    pub start_time: std::time::Instant,
    /// Prometheus metrics handle for rendering the /metrics endpoint.
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
}

/// Build the full Axum router with all routes.
///
/// Route table:
///
/// **Catalog (unauthenticated):**
/// - `GET  /api/v1/videos`                      — Locale-resolved, paged listing
/// - `GET  /api/v1/videos/presign-play`         — Presigned playback URL
/// - `POST /api/v1/videos/presign-upload`       — Presigned upload URL
/// - `GET|POST /api/v1/videos/{key}/likes`      — Like state / toggle
/// - `GET|POST /api/v1/videos/{key}/comments`   — Comment list / create
/// - `GET  /api/v1/ads/config`                  — Ad slot availability
/// - `GET  /api/v1/ads/vast`                    — VAST URL for one position
///
/// **Admin (session cookie):**
/// - `POST /api/v1/admin/login` / `logout`, `GET /api/v1/admin/auth`
/// - `GET|PUT /api/v1/admin/videos/{key}/metadata` (write authenticated)
/// - `POST /api/v1/admin/videos/{key}/cover`
/// - `DELETE /api/v1/admin/videos/{key}`
///
/// **Health (unauthenticated):**
/// - `GET /healthz`, `GET /readyz`, `GET /metrics`
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            http::Method::GET,
            http::Method::POST,
            http::Method::PUT,
            http::Method::DELETE,
            http::Method::OPTIONS,
        ])
        .allow_headers([http::header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(86400));

    let body_limit = DefaultBodyLimit::max(state.config.security.max_json_body_bytes);

    Router::new()
        // Catalog
        .route("/api/v1/videos", get(handlers::list_videos))
        .route("/api/v1/videos/presign-play", get(handlers::presign_play))
        .route(
            "/api/v1/videos/presign-upload",
            post(handlers::presign_upload),
        )
        .route(
            "/api/v1/videos/{key}/likes",
            get(handlers::get_likes).post(handlers::post_likes),
        )
        .route(
            "/api/v1/videos/{key}/comments",
            get(handlers::list_comments).post(handlers::add_comment),
        )
        // Ads
        .route("/api/v1/ads/config", get(handlers::ad_config))
        .route("/api/v1/ads/vast", get(handlers::ad_vast))
        // Admin
        .route("/api/v1/admin/login", post(handlers::admin_login))
        .route("/api/v1/admin/logout", post(handlers::admin_logout))
        .route("/api/v1/admin/auth", get(handlers::admin_auth_check))
        .route(
            "/api/v1/admin/videos/{key}/metadata",
            get(handlers::get_metadata).put(handlers::put_metadata),
        )
        .route(
            "/api/v1/admin/videos/{key}/cover",
            post(handlers::upload_cover),
        )
        .route(
            "/api/v1/admin/videos/{key}",
            delete(handlers::delete_video),
        )
        // Health + metrics
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        .route("/metrics", get(handlers::metrics_handler))
        .layer(cors)
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}
