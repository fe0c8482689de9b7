use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use base64::Engine;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::ads::{self, AdPosition};
use crate::catalog::VideoListQuery;
use crate::core::auth::LoginError;
use crate::core::error::{ApiError, CatalogError};
use crate::core::redact::redact_token;
use crate::core::security;
use crate::metadata::MetadataPatch;
use crate::observability::metrics as obs;

use super::identity::{client_ip_from_headers, user_id_from_headers};
use super::router::AppState;

/// Name of the admin session cookie.
pub const ADMIN_SESSION_COOKIE: &str = "reelshelf_admin_session";

// ---------------------------------------------------------------------------
// Error responses
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    status: u16,
}

fn error_json(status: StatusCode, error: &str, message: &str) -> Response {
    let body = ErrorResponse {
        error: error.to_string(),
        message: message.to_string(),
        status: status.as_u16(),
    };
    (status, Json(body)).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        error_json(status, self.error_code(), &self.safe_message())
    }
}

// ---------------------------------------------------------------------------
// Catalog handlers
// ---------------------------------------------------------------------------

/// `GET /api/v1/videos` — locale-resolved, searchable, paged listing.
pub async fn list_videos(
    State(state): State<AppState>,
    Query(query): Query<VideoListQuery>,
) -> Response {
    let start = std::time::Instant::now();

    match state.aggregator.list_videos(&query).await {
        Ok(page) => {
            obs::inc_catalog_request("ok");
            obs::record_catalog_duration(start.elapsed().as_secs_f64());
            Json(page).into_response()
        }
        Err(e) => {
            let outcome = match &e {
                CatalogError::Validation { .. } => "invalid_query",
                CatalogError::UpstreamUnavailable { .. } => "upstream_error",
            };
            obs::inc_catalog_request(outcome);
            ApiError::from(e).into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignPlayQuery {
    pub key: String,
    pub expires: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignResponse {
    pub url: String,
    pub expires_in: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

/// `GET /api/v1/videos/presign-play` — short-lived signed playback URL.
pub async fn presign_play(
    State(state): State<AppState>,
    Query(query): Query<PresignPlayQuery>,
) -> Result<Json<PresignResponse>, ApiError> {
    if query.key.is_empty() {
        return Err(ApiError::Validation {
            field: "key".to_string(),
            reason: "must not be empty".to_string(),
        });
    }
    let expires = query.expires.unwrap_or(security::PRESIGN_DEFAULT_TTL_SECS);
    security::validate_presign_ttl(expires).map_err(|reason| ApiError::Validation {
        field: "expires".to_string(),
        reason,
    })?;

    let url = state.store.presign_get(&query.key, expires).await?;
    obs::inc_presign_issued("get");

    Ok(Json(PresignResponse {
        url,
        expires_in: expires,
        key: None,
    }))
}

fn default_upload_content_type() -> String {
    "video/mp4".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignUploadRequest {
    pub key: String,
    #[serde(default = "default_upload_content_type")]
    pub content_type: String,
    pub expires: Option<u64>,
}

/// `POST /api/v1/videos/presign-upload` — short-lived signed upload URL.
pub async fn presign_upload(
    State(state): State<AppState>,
    Json(body): Json<PresignUploadRequest>,
) -> Result<Json<PresignResponse>, ApiError> {
    if body.key.is_empty() {
        return Err(ApiError::Validation {
            field: "key".to_string(),
            reason: "must not be empty".to_string(),
        });
    }
    let expires = body.expires.unwrap_or(security::PRESIGN_DEFAULT_TTL_SECS);
    security::validate_presign_ttl(expires).map_err(|reason| ApiError::Validation {
        field: "expires".to_string(),
        reason,
    })?;

    let url = state
        .store
        .presign_put(&body.key, &body.content_type, expires)
        .await?;
    obs::inc_presign_issued("put");

    Ok(Json(PresignResponse {
        url,
        expires_in: expires,
        key: Some(body.key),
    }))
}

// ---------------------------------------------------------------------------
// Like handlers
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub liked: bool,
    pub count: usize,
}

/// `GET /api/v1/videos/{key}/likes` — like count and this visitor's state.
pub async fn get_likes(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> Json<LikeResponse> {
    let user_id = user_id_from_headers(&headers);
    Json(LikeResponse {
        liked: state.likes.has_liked(&key, &user_id).await,
        count: state.likes.count(&key).await,
    })
}

#[derive(Debug, Deserialize)]
pub struct ToggleLikeRequest {
    pub action: Option<String>,
}

/// `POST /api/v1/videos/{key}/likes` — toggle this visitor's like.
///
/// Body is optional; `{"action": "get"}` reads the state without toggling.
pub async fn post_likes(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
    body: Option<Json<ToggleLikeRequest>>,
) -> Json<LikeResponse> {
    let user_id = user_id_from_headers(&headers);
    let action = body
        .and_then(|Json(b)| b.action)
        .unwrap_or_else(|| "toggle".to_string());

    if action == "get" {
        return Json(LikeResponse {
            liked: state.likes.has_liked(&key, &user_id).await,
            count: state.likes.count(&key).await,
        });
    }

    let result = state.likes.toggle(&key, &user_id).await;
    Json(LikeResponse {
        liked: result.liked,
        count: result.count,
    })
}

// ---------------------------------------------------------------------------
// Comment handlers
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CommentListQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct CommentListResponse {
    pub comments: Vec<crate::core::types::CommentRecord>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

/// `GET /api/v1/videos/{key}/comments` — newest-first comment page.
pub async fn list_comments(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<CommentListQuery>,
) -> Result<Json<CommentListResponse>, ApiError> {
    if let Some(limit) = query.limit {
        if limit == 0 || limit > security::MAX_COMMENT_PAGE_LIMIT {
            return Err(ApiError::Validation {
                field: "limit".to_string(),
                reason: format!(
                    "must be between 1 and {}",
                    security::MAX_COMMENT_PAGE_LIMIT
                ),
            });
        }
    }

    let comments = state.comments.list(&key, query.limit, query.offset).await;
    let total = state.comments.count(&key).await;
    let limit = query.limit.unwrap_or(comments.len());

    Ok(Json(CommentListResponse {
        comments,
        total,
        limit,
        offset: query.offset.unwrap_or(0),
    }))
}

#[derive(Debug, Deserialize)]
pub struct AddCommentRequest {
    pub username: Option<String>,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct AddCommentResponse {
    pub comment: crate::core::types::CommentRecord,
    pub success: bool,
}

/// `POST /api/v1/videos/{key}/comments` — append a comment.
pub async fn add_comment(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
    Json(body): Json<AddCommentRequest>,
) -> Result<Json<AddCommentResponse>, ApiError> {
    security::validate_comment(body.username.as_deref(), &body.content)
        .map_err(|reason| ApiError::InvalidBody { reason })?;

    let user_id = user_id_from_headers(&headers);
    let comment = state
        .comments
        .add(&key, &user_id, body.username.as_deref().unwrap_or(""), &body.content)
        .await;

    Ok(Json(AddCommentResponse {
        comment,
        success: true,
    }))
}

// ---------------------------------------------------------------------------
// Ad handlers
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdConfigResponse {
    pub enabled: bool,
    pub positions: AdPositionsAvailable,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdPositionsAvailable {
    pub pre_roll: bool,
    pub mid_roll: bool,
    pub post_roll: bool,
}

/// `GET /api/v1/ads/config` — which slots are active.
///
/// Only booleans: the actual VAST URLs stay server-side and are handed out
/// one position at a time by the vast endpoint.
pub async fn ad_config(State(state): State<AppState>) -> Json<AdConfigResponse> {
    let slots = ads::resolve_ad_config(&state.config.ads);
    Json(AdConfigResponse {
        enabled: slots.is_some(),
        positions: AdPositionsAvailable {
            pre_roll: slots.as_ref().is_some_and(|s| s.pre_roll.is_some()),
            mid_roll: slots.as_ref().is_some_and(|s| s.mid_roll.is_some()),
            post_roll: slots.as_ref().is_some_and(|s| s.post_roll.is_some()),
        },
    })
}

#[derive(Debug, Deserialize)]
pub struct VastQuery {
    pub position: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VastResponse {
    pub vast_url: Option<String>,
    pub enabled: bool,
}

/// `GET /api/v1/ads/vast?position=` — VAST tag URL for one position.
pub async fn ad_vast(
    State(state): State<AppState>,
    Query(query): Query<VastQuery>,
) -> Result<Json<VastResponse>, ApiError> {
    let position: AdPosition =
        query
            .position
            .parse()
            .map_err(|reason: String| ApiError::Validation {
                field: "position".to_string(),
                reason,
            })?;

    let vast_url = ads::resolve_ad_config(&state.config.ads)
        .and_then(|slots| slots.url_for(position).map(String::from));

    Ok(Json(VastResponse {
        enabled: vast_url.is_some(),
        vast_url,
    }))
}

// ---------------------------------------------------------------------------
// Admin session handlers
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

/// `POST /api/v1/admin/login` — password login, sets the session cookie.
pub async fn admin_login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> Response {
    let client_ip = client_ip_from_headers(&headers);

    match state.auth.login(&body.password, client_ip) {
        Ok(token) => {
            obs::inc_admin_login("success");
            info!(token = %redact_token(&token), "admin session issued");
            let cookie = session_cookie(&token, state.config.admin.session_ttl_secs);
            (
                [(header::SET_COOKIE, cookie)],
                Json(serde_json::json!({
                    "success": true,
                    "message": "Login successful",
                })),
            )
                .into_response()
        }
        Err(LoginError::TooManyAttempts) => {
            obs::inc_admin_login("blocked");
            error_json(
                StatusCode::TOO_MANY_REQUESTS,
                "too_many_attempts",
                "Too many failed attempts. Try again later.",
            )
        }
        Err(LoginError::InvalidPassword) | Err(LoginError::Disabled) => {
            obs::inc_admin_login("failure");
            error_json(StatusCode::UNAUTHORIZED, "invalid_password", "Invalid password.")
        }
    }
}

/// `POST /api/v1/admin/logout` — revoke the session, clear the cookie.
pub async fn admin_logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token_from_headers(&headers) {
        state.auth.revoke_session(&token);
    }
    (
        [(header::SET_COOKIE, clear_session_cookie())],
        Json(serde_json::json!({
            "success": true,
            "message": "Logout successful",
        })),
    )
        .into_response()
}

/// `GET /api/v1/admin/auth` — session check.
pub async fn admin_auth_check(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<serde_json::Value> {
    let token = session_token_from_headers(&headers);
    Json(serde_json::json!({
        "authenticated": state.auth.verify_session(token.as_deref()),
    }))
}

// ---------------------------------------------------------------------------
// Admin metadata handlers
// ---------------------------------------------------------------------------

/// `GET /api/v1/admin/videos/{key}/metadata` — full sidecar record.
pub async fn get_metadata(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, ApiError> {
    match state.metadata.get(&key).await? {
        Some(record) => Ok(Json(record).into_response()),
        None => Err(ApiError::NotFound {
            what: "Metadata".to_string(),
        }),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertMetadataRequest {
    pub locale: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub cover_url: Option<String>,
}

/// `PUT /api/v1/admin/videos/{key}/metadata` — upsert one locale's fields
/// (authenticated).
pub async fn put_metadata(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
    Json(body): Json<UpsertMetadataRequest>,
) -> Result<Response, ApiError> {
    require_admin(&state, &headers)?;

    let locale = body
        .locale
        .parse()
        .map_err(|e: crate::core::types::UnknownLocale| ApiError::Validation {
            field: "locale".to_string(),
            reason: e.to_string(),
        })?;
    security::validate_metadata_patch(&body.title, &body.description)
        .map_err(|reason| ApiError::InvalidBody { reason })?;

    let record = state
        .metadata
        .upsert(
            &key,
            locale,
            MetadataPatch {
                title: body.title,
                description: body.description,
                cover_url: body.cover_url,
            },
        )
        .await?;

    info!(video_key = %key, locale = %locale, "metadata updated");
    Ok(Json(record).into_response())
}

fn default_cover_content_type() -> String {
    "image/jpeg".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadCoverRequest {
    pub locale: String,
    /// Base64-encoded image; a `data:image/...;base64,` prefix is tolerated.
    pub cover_data: String,
    #[serde(default = "default_cover_content_type")]
    pub content_type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadCoverResponse {
    pub cover_url: String,
    pub cover_key: String,
}

/// `POST /api/v1/admin/videos/{key}/cover` — store a cover image beside the
/// videos and point the locale's `coverUrl` at it (authenticated).
pub async fn upload_cover(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
    Json(body): Json<UploadCoverRequest>,
) -> Result<Json<UploadCoverResponse>, ApiError> {
    require_admin(&state, &headers)?;

    let locale: crate::core::types::Locale =
        body.locale
            .parse()
            .map_err(|e: crate::core::types::UnknownLocale| ApiError::Validation {
                field: "locale".to_string(),
                reason: e.to_string(),
            })?;

    let encoded = match body.cover_data.find("base64,") {
        Some(idx) => &body.cover_data[idx + "base64,".len()..],
        None => body.cover_data.as_str(),
    };
    let image = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| ApiError::InvalidBody {
            reason: format!("coverData is not valid base64: {}", e),
        })?;

    let ext = if body.content_type.contains("png") {
        "png"
    } else if body.content_type.contains("webp") {
        "webp"
    } else {
        "jpg"
    };
    let cover_key = format!("covers/{}-{}.{}", key, locale, ext);

    state
        .store
        .put(&cover_key, Bytes::from(image), &body.content_type)
        .await?;

    // Point the locale's coverUrl at the stored image, preserving whatever
    // title/description the locale already has.
    let existing = state.metadata.get(&key).await?;
    let (title, description) = existing
        .as_ref()
        .and_then(|record| record.locales.get(&locale))
        .map(|entry| (entry.title.clone(), entry.description.clone()))
        .unwrap_or_else(|| (key.clone(), String::new()));

    state
        .metadata
        .upsert(
            &key,
            locale,
            MetadataPatch {
                title,
                description,
                cover_url: Some(cover_key.clone()),
            },
        )
        .await?;

    info!(video_key = %key, locale = %locale, cover_key = %cover_key, "cover uploaded");
    Ok(Json(UploadCoverResponse {
        cover_url: cover_key.clone(),
        cover_key,
    }))
}

/// `DELETE /api/v1/admin/videos/{key}` — delete the video object
/// (authenticated). Deleting the object does not cascade to the metadata
/// sidecar.
pub async fn delete_video(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_admin(&state, &headers)?;

    state.store.delete(&key).await?;
    info!(video_key = %key, "video deleted");

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Video deleted successfully",
        "key": key,
    })))
}

// ---------------------------------------------------------------------------
// Health endpoints
// ---------------------------------------------------------------------------

/// `GET /metrics` — Prometheus metrics endpoint.
pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    let metrics = state.metrics_handle.render();
    (
        StatusCode::OK,
        [(
            header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        metrics,
    )
        .into_response()
}

/// `GET /healthz` — liveness probe.
pub async fn healthz(State(state): State<AppState>) -> Json<serde_json::Value> {
    let uptime = state.start_time.elapsed().as_secs();
    Json(serde_json::json!({
        "status": "healthy",
        "uptime_secs": uptime,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// `GET /readyz` — readiness probe: one cheap LIST against the bucket.
pub async fn readyz(State(state): State<AppState>) -> Response {
    match state.store.list("__health_check_nonexistent__", 1, None).await {
        Ok(_) => Json(serde_json::json!({
            "status": "ready",
            "checks": { "storage": { "status": "ok" } },
        }))
        .into_response(),
        Err(e) => {
            warn!(error = %e, "readiness probe failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "not_ready",
                    "checks": { "storage": { "status": "error" } },
                })),
            )
                .into_response()
        }
    }
}

// ---------------------------------------------------------------------------
// Session cookie helpers
// ---------------------------------------------------------------------------

fn session_cookie(token: &str, max_age_secs: u64) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        ADMIN_SESSION_COOKIE, token, max_age_secs
    )
}

fn clear_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", ADMIN_SESSION_COOKIE)
}

/// Pull the admin session token out of the `Cookie` header, if present.
fn session_token_from_headers(headers: &HeaderMap) -> Option<String> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    for pair in cookie_header.split(';') {
        let Some((name, value)) = pair.trim().split_once('=') else {
            continue;
        };
        if name == ADMIN_SESSION_COOKIE && !value.is_empty() {
            return Some(value.to_string());
        }
    }
    None
}

fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let token = session_token_from_headers(headers);
    if state.auth.verify_session(token.as_deref()) {
        Ok(())
    } else {
        Err(ApiError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::router::{build_router, AppState};
    use crate::catalog::VideoAggregator;
    use crate::core::auth::AdminAuth;
    use crate::core::config::AppConfig;
    use crate::core::types::Locale;
    use crate::interactions::memory::{InMemoryCommentStore, InMemoryLikeStore};
    use crate::metadata::MetadataStore;
    use crate::storage::memory::InMemoryObjectStore;
    use crate::storage::ObjectStore;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state(config: AppConfig) -> (AppState, Arc<InMemoryObjectStore>) {
        let store = Arc::new(InMemoryObjectStore::new());
        let metadata = Arc::new(MetadataStore::new(store.clone(), &config.metadata_cache));
        let aggregator = Arc::new(VideoAggregator::new(store.clone(), metadata.clone()));
        let state = AppState {
            store: store.clone(),
            metadata,
            aggregator,
            likes: Arc::new(InMemoryLikeStore::new()),
            comments: Arc::new(InMemoryCommentStore::new()),
            auth: Arc::new(AdminAuth::new(&config.admin)),
            config,
            start_time: std::time::Instant::now(),
            metrics_handle: metrics_exporter_prometheus::PrometheusBuilder::new()
                .build_recorder()
                .handle(),
        };
        (state, store)
    }

    fn admin_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.admin.password = "hunter2".to_string();
        config
    }

    async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = build_router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json = if body.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, json)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn login_cookie(state: &AppState) -> String {
        let response = build_router(state.clone())
            .oneshot(post_json(
                "/api/v1/admin/login",
                serde_json::json!({"password": "hunter2"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_listing_returns_camel_case_page() {
        let (state, store) = test_state(AppConfig::default());
        store
            .put("shows/a.mp4", Bytes::from("x"), "video/mp4")
            .await
            .unwrap();
        state
            .metadata
            .upsert(
                "shows/a.mp4",
                Locale::En,
                MetadataPatch {
                    title: "Episode One".to_string(),
                    description: String::new(),
                    cover_url: None,
                },
            )
            .await
            .unwrap();

        let (status, json) = send(&state, get("/api/v1/videos?locale=en")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["keyCount"], 1);
        assert_eq!(json["isTruncated"], false);
        assert_eq!(json["videos"][0]["key"], "shows/a.mp4");
        assert_eq!(json["videos"][0]["title"], "Episode One");
        assert_eq!(json["videos"][0]["availableLocales"][0], "en");
    }

    #[tokio::test]
    async fn test_listing_rejects_bad_max_keys() {
        let (state, _store) = test_state(AppConfig::default());
        let (status, json) = send(&state, get("/api/v1/videos?maxKeys=0")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "invalid_query");
        assert!(json["message"].as_str().unwrap().contains("maxKeys"));
    }

    #[tokio::test]
    async fn test_listing_rejects_unknown_locale() {
        let (state, _store) = test_state(AppConfig::default());
        let (status, json) = send(&state, get("/api/v1/videos?locale=de")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["message"].as_str().unwrap().contains("locale"));
    }

    #[tokio::test]
    async fn test_like_toggle_round_trip_over_http() {
        let (state, _store) = test_state(AppConfig::default());

        let (status, json) = send(
            &state,
            post_json("/api/v1/videos/a.mp4/likes", serde_json::json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["liked"], true);
        assert_eq!(json["count"], 1);

        // Same visitor (same headers) toggles back off.
        let (_, json) = send(
            &state,
            post_json("/api/v1/videos/a.mp4/likes", serde_json::json!({})),
        )
        .await;
        assert_eq!(json["liked"], false);
        assert_eq!(json["count"], 0);
    }

    #[tokio::test]
    async fn test_like_post_with_get_action_does_not_toggle() {
        let (state, _store) = test_state(AppConfig::default());
        let (_, json) = send(
            &state,
            post_json(
                "/api/v1/videos/a.mp4/likes",
                serde_json::json!({"action": "get"}),
            ),
        )
        .await;
        assert_eq!(json["liked"], false);
        assert_eq!(json["count"], 0);
    }

    #[tokio::test]
    async fn test_comment_create_and_list() {
        let (state, _store) = test_state(AppConfig::default());

        let (status, json) = send(
            &state,
            post_json(
                "/api/v1/videos/a.mp4/comments",
                serde_json::json!({"content": "first!"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["comment"]["username"], "Anonymous");

        let (status, json) = send(&state, get("/api/v1/videos/a.mp4/comments")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["total"], 1);
        assert_eq!(json["comments"][0]["content"], "first!");
    }

    #[tokio::test]
    async fn test_blank_comment_rejected() {
        let (state, _store) = test_state(AppConfig::default());
        let (status, json) = send(
            &state,
            post_json(
                "/api/v1/videos/a.mp4/comments",
                serde_json::json!({"content": "   "}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "invalid_body");
    }

    #[tokio::test]
    async fn test_presign_play_validates_expiry() {
        let (state, _store) = test_state(AppConfig::default());

        let (status, json) =
            send(&state, get("/api/v1/videos/presign-play?key=a.mp4&expires=30")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["message"].as_str().unwrap().contains("expires"));

        let (status, json) =
            send(&state, get("/api/v1/videos/presign-play?key=a.mp4")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["url"].as_str().unwrap().contains("a.mp4"));
        assert_eq!(json["expiresIn"], 900);
    }

    #[tokio::test]
    async fn test_presign_upload_returns_key() {
        let (state, _store) = test_state(AppConfig::default());
        let (status, json) = send(
            &state,
            post_json(
                "/api/v1/videos/presign-upload",
                serde_json::json!({"key": "uploads/new.mp4", "expires": 600}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["key"], "uploads/new.mp4");
        assert_eq!(json["expiresIn"], 600);
    }

    #[tokio::test]
    async fn test_admin_write_requires_session() {
        let (state, _store) = test_state(admin_config());
        let request = Request::builder()
            .method("PUT")
            .uri("/api/v1/admin/videos/a.mp4/metadata")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                serde_json::json!({"locale": "en", "title": "X", "description": ""}).to_string(),
            ))
            .unwrap();
        let (status, json) = send(&state, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"], "unauthorized");
    }

    #[tokio::test]
    async fn test_admin_login_and_metadata_upsert_flow() {
        let (state, _store) = test_state(admin_config());
        let cookie = login_cookie(&state).await;

        let request = Request::builder()
            .method("PUT")
            .uri("/api/v1/admin/videos/a.mp4/metadata")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::COOKIE, &cookie)
            .body(Body::from(
                serde_json::json!({
                    "locale": "en",
                    "title": "Episode One",
                    "description": "Pilot",
                })
                .to_string(),
            ))
            .unwrap();
        let (status, json) = send(&state, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["videoKey"], "a.mp4");
        assert_eq!(json["locales"]["en"]["title"], "Episode One");

        // The read side is public.
        let (status, json) = send(&state, get("/api/v1/admin/videos/a.mp4/metadata")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["locales"]["en"]["description"], "Pilot");
    }

    #[tokio::test]
    async fn test_admin_login_rejects_wrong_password() {
        let (state, _store) = test_state(admin_config());
        let (status, json) = send(
            &state,
            post_json(
                "/api/v1/admin/login",
                serde_json::json!({"password": "wrong"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"], "invalid_password");
    }

    #[tokio::test]
    async fn test_logout_invalidates_session() {
        let (state, _store) = test_state(admin_config());
        let cookie = login_cookie(&state).await;

        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/admin/logout")
            .header(header::COOKIE, &cookie)
            .body(Body::empty())
            .unwrap();
        let (status, _json) = send(&state, request).await;
        assert_eq!(status, StatusCode::OK);

        let request = Request::builder()
            .uri("/api/v1/admin/auth")
            .header(header::COOKIE, &cookie)
            .body(Body::empty())
            .unwrap();
        let (_, json) = send(&state, request).await;
        assert_eq!(json["authenticated"], false);
    }

    #[tokio::test]
    async fn test_cover_upload_updates_metadata() {
        let (state, store) = test_state(admin_config());
        let cookie = login_cookie(&state).await;
        let image = base64::engine::general_purpose::STANDARD.encode([0xFF, 0xD8, 0xFF, 0xE0]);

        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/admin/videos/a.mp4/cover")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::COOKIE, &cookie)
            .body(Body::from(
                serde_json::json!({
                    "locale": "en",
                    "coverData": format!("data:image/jpeg;base64,{}", image),
                })
                .to_string(),
            ))
            .unwrap();
        let (status, json) = send(&state, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["coverKey"], "covers/a.mp4-en.jpg");
        assert!(store.exists("covers/a.mp4-en.jpg").await);

        let record = state.metadata.get("a.mp4").await.unwrap().unwrap();
        assert_eq!(
            record.locales[&Locale::En].cover_url.as_deref(),
            Some("covers/a.mp4-en.jpg")
        );
    }

    #[tokio::test]
    async fn test_delete_video_leaves_sidecar() {
        let (state, store) = test_state(admin_config());
        let cookie = login_cookie(&state).await;
        store
            .put("a.mp4", Bytes::from("x"), "video/mp4")
            .await
            .unwrap();
        state
            .metadata
            .upsert(
                "a.mp4",
                Locale::En,
                MetadataPatch {
                    title: "X".to_string(),
                    description: String::new(),
                    cover_url: None,
                },
            )
            .await
            .unwrap();

        let request = Request::builder()
            .method("DELETE")
            .uri("/api/v1/admin/videos/a.mp4")
            .header(header::COOKIE, &cookie)
            .body(Body::empty())
            .unwrap();
        let (status, json) = send(&state, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);

        assert!(!store.exists("a.mp4").await);
        assert!(store.exists("a.mp4.metadata.json").await);
    }

    #[tokio::test]
    async fn test_ads_endpoints() {
        let mut config = AppConfig::default();
        config.ads.enabled = true;
        config.ads.provider = "exoclick".to_string();
        config.ads.exoclick_pre_roll = Some("https://ads.example.com/pre".to_string());
        let (state, _store) = test_state(config);

        let (status, json) = send(&state, get("/api/v1/ads/config")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["enabled"], true);
        assert_eq!(json["positions"]["preRoll"], true);
        assert_eq!(json["positions"]["midRoll"], false);

        let (status, json) = send(&state, get("/api/v1/ads/vast?position=pre-roll")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["vastUrl"], "https://ads.example.com/pre");

        let (status, json) = send(&state, get("/api/v1/ads/vast?position=banner")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["message"].as_str().unwrap().contains("position"));
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let (state, _store) = test_state(AppConfig::default());

        let (status, json) = send(&state, get("/healthz")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");

        let (status, json) = send(&state, get("/readyz")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ready");
    }
}
