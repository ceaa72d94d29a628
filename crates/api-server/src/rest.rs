//! REST handlers for banner rotation and operational endpoints.

use crate::error::ApiError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use rotation_core::ids::{parse_id, parse_rotation_key};
use rotation_core::{Banner, EntityKind, Event, Group, Rotation, RotationResult, Slot};
use rotation_engine::RotationService;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;
use utoipa::ToSchema;

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RotationService>,
    pub request_timeout: Duration,
    pub start_time: Instant,
}

impl AppState {
    /// Run a service call under the per-request deadline.
    async fn bounded<T>(
        &self,
        call: impl Future<Output = RotationResult<T>>,
    ) -> Result<T, ApiError> {
        match tokio::time::timeout(self.request_timeout, call).await {
            Ok(result) => Ok(result?),
            Err(_) => {
                warn!(timeout = ?self.request_timeout, "Request deadline exceeded");
                Err(ApiError::Timeout(self.request_timeout))
            }
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DescriptionBody {
    /// Free-form description of the entity.
    pub description: String,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
}

#[derive(Serialize, ToSchema)]
pub struct VersionResponse {
    pub name: String,
    pub version: String,
}

// ─── Banners ────────────────────────────────────────────────────────────

/// POST /banners — Create a banner.
#[utoipa::path(
    post,
    path = "/banners",
    tag = "Banners",
    request_body = DescriptionBody,
    responses(
        (status = 200, description = "Banner created", body = Banner),
        (status = 400, description = "Malformed request body", body = crate::error::ErrorResponse),
        (status = 503, description = "Store unavailable", body = crate::error::ErrorResponse),
    )
)]
pub async fn add_banner(
    State(state): State<AppState>,
    body: Result<Json<DescriptionBody>, JsonRejection>,
) -> Result<Json<Banner>, ApiError> {
    let Json(body) = body?;
    let banner = state
        .bounded(state.service.add_banner(&body.description))
        .await?;
    Ok(Json(banner))
}

/// GET /banners/{banner_id} — Fetch a live banner.
#[utoipa::path(
    get,
    path = "/banners/{banner_id}",
    tag = "Banners",
    params(("banner_id" = String, Path, description = "Banner UUID")),
    responses(
        (status = 200, description = "Banner found", body = Banner),
        (status = 400, description = "Malformed identifier", body = crate::error::ErrorResponse),
        (status = 404, description = "Banner not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn get_banner(
    State(state): State<AppState>,
    Path(banner_id): Path<String>,
) -> Result<Json<Banner>, ApiError> {
    let banner_id = parse_id(EntityKind::Banner, &banner_id)?;
    let banner = state.bounded(state.service.get_banner(banner_id)).await?;
    Ok(Json(banner))
}

/// DELETE /banners/{banner_id} — Soft-delete a banner and its rotations.
#[utoipa::path(
    delete,
    path = "/banners/{banner_id}",
    tag = "Banners",
    params(("banner_id" = String, Path, description = "Banner UUID")),
    responses(
        (status = 204, description = "Banner deleted"),
        (status = 400, description = "Malformed identifier", body = crate::error::ErrorResponse),
        (status = 404, description = "Banner not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn delete_banner(
    State(state): State<AppState>,
    Path(banner_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let banner_id = parse_id(EntityKind::Banner, &banner_id)?;
    state.bounded(state.service.delete_banner(banner_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ─── Slots ──────────────────────────────────────────────────────────────

/// POST /slots — Create a slot.
#[utoipa::path(
    post,
    path = "/slots",
    tag = "Slots",
    request_body = DescriptionBody,
    responses(
        (status = 200, description = "Slot created", body = Slot),
        (status = 400, description = "Malformed request body", body = crate::error::ErrorResponse),
        (status = 503, description = "Store unavailable", body = crate::error::ErrorResponse),
    )
)]
pub async fn add_slot(
    State(state): State<AppState>,
    body: Result<Json<DescriptionBody>, JsonRejection>,
) -> Result<Json<Slot>, ApiError> {
    let Json(body) = body?;
    let slot = state.bounded(state.service.add_slot(&body.description)).await?;
    Ok(Json(slot))
}

/// GET /slots/{slot_id} — Fetch a live slot.
#[utoipa::path(
    get,
    path = "/slots/{slot_id}",
    tag = "Slots",
    params(("slot_id" = String, Path, description = "Slot UUID")),
    responses(
        (status = 200, description = "Slot found", body = Slot),
        (status = 400, description = "Malformed identifier", body = crate::error::ErrorResponse),
        (status = 404, description = "Slot not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn get_slot(
    State(state): State<AppState>,
    Path(slot_id): Path<String>,
) -> Result<Json<Slot>, ApiError> {
    let slot_id = parse_id(EntityKind::Slot, &slot_id)?;
    let slot = state.bounded(state.service.get_slot(slot_id)).await?;
    Ok(Json(slot))
}

/// DELETE /slots/{slot_id} — Soft-delete a slot and its rotations.
#[utoipa::path(
    delete,
    path = "/slots/{slot_id}",
    tag = "Slots",
    params(("slot_id" = String, Path, description = "Slot UUID")),
    responses(
        (status = 204, description = "Slot deleted"),
        (status = 400, description = "Malformed identifier", body = crate::error::ErrorResponse),
        (status = 404, description = "Slot not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn delete_slot(
    State(state): State<AppState>,
    Path(slot_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let slot_id = parse_id(EntityKind::Slot, &slot_id)?;
    state.bounded(state.service.delete_slot(slot_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ─── Groups ─────────────────────────────────────────────────────────────

/// POST /groups — Create a social group.
#[utoipa::path(
    post,
    path = "/groups",
    tag = "Groups",
    request_body = DescriptionBody,
    responses(
        (status = 200, description = "Group created", body = Group),
        (status = 400, description = "Malformed request body", body = crate::error::ErrorResponse),
        (status = 503, description = "Store unavailable", body = crate::error::ErrorResponse),
    )
)]
pub async fn add_group(
    State(state): State<AppState>,
    body: Result<Json<DescriptionBody>, JsonRejection>,
) -> Result<Json<Group>, ApiError> {
    let Json(body) = body?;
    let group = state
        .bounded(state.service.add_group(&body.description))
        .await?;
    Ok(Json(group))
}

/// GET /groups/{group_id} — Fetch a live group.
#[utoipa::path(
    get,
    path = "/groups/{group_id}",
    tag = "Groups",
    params(("group_id" = String, Path, description = "Group UUID")),
    responses(
        (status = 200, description = "Group found", body = Group),
        (status = 400, description = "Malformed identifier", body = crate::error::ErrorResponse),
        (status = 404, description = "Group not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn get_group(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> Result<Json<Group>, ApiError> {
    let group_id = parse_id(EntityKind::Group, &group_id)?;
    let group = state.bounded(state.service.get_group(group_id)).await?;
    Ok(Json(group))
}

/// DELETE /groups/{group_id} — Soft-delete a group and its rotations.
#[utoipa::path(
    delete,
    path = "/groups/{group_id}",
    tag = "Groups",
    params(("group_id" = String, Path, description = "Group UUID")),
    responses(
        (status = 204, description = "Group deleted"),
        (status = 400, description = "Malformed identifier", body = crate::error::ErrorResponse),
        (status = 404, description = "Group not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn delete_group(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let group_id = parse_id(EntityKind::Group, &group_id)?;
    state.bounded(state.service.delete_group(group_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ─── Rotations ──────────────────────────────────────────────────────────

/// POST /groups/{group_id}/slots/{slot_id}/banners/{banner_id} — Link a banner into a slot for a group.
#[utoipa::path(
    post,
    path = "/groups/{group_id}/slots/{slot_id}/banners/{banner_id}",
    tag = "Rotations",
    params(
        ("group_id" = String, Path, description = "Group UUID"),
        ("slot_id" = String, Path, description = "Slot UUID"),
        ("banner_id" = String, Path, description = "Banner UUID"),
    ),
    responses(
        (status = 200, description = "Rotation created", body = Rotation),
        (status = 400, description = "Malformed identifier", body = crate::error::ErrorResponse),
        (status = 404, description = "Banner, slot or group not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Rotation already exists", body = crate::error::ErrorResponse),
    )
)]
pub async fn add_rotation(
    State(state): State<AppState>,
    Path((group_id, slot_id, banner_id)): Path<(String, String, String)>,
) -> Result<Json<Rotation>, ApiError> {
    let key = parse_rotation_key(&banner_id, &slot_id, &group_id)?;
    let rotation = state.bounded(state.service.add_rotation(key)).await?;
    Ok(Json(rotation))
}

/// GET /groups/{group_id}/slots/{slot_id}/banners/{banner_id} — Fetch a live rotation with its counters.
#[utoipa::path(
    get,
    path = "/groups/{group_id}/slots/{slot_id}/banners/{banner_id}",
    tag = "Rotations",
    params(
        ("group_id" = String, Path, description = "Group UUID"),
        ("slot_id" = String, Path, description = "Slot UUID"),
        ("banner_id" = String, Path, description = "Banner UUID"),
    ),
    responses(
        (status = 200, description = "Rotation found", body = Rotation),
        (status = 400, description = "Malformed identifier", body = crate::error::ErrorResponse),
        (status = 404, description = "Rotation not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn get_rotation(
    State(state): State<AppState>,
    Path((group_id, slot_id, banner_id)): Path<(String, String, String)>,
) -> Result<Json<Rotation>, ApiError> {
    let key = parse_rotation_key(&banner_id, &slot_id, &group_id)?;
    let rotation = state.bounded(state.service.get_rotation(key)).await?;
    Ok(Json(rotation))
}

/// DELETE /groups/{group_id}/slots/{slot_id}/banners/{banner_id} — Soft-delete a rotation.
#[utoipa::path(
    delete,
    path = "/groups/{group_id}/slots/{slot_id}/banners/{banner_id}",
    tag = "Rotations",
    params(
        ("group_id" = String, Path, description = "Group UUID"),
        ("slot_id" = String, Path, description = "Slot UUID"),
        ("banner_id" = String, Path, description = "Banner UUID"),
    ),
    responses(
        (status = 204, description = "Rotation deleted"),
        (status = 400, description = "Malformed identifier", body = crate::error::ErrorResponse),
        (status = 404, description = "Rotation not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn delete_rotation(
    State(state): State<AppState>,
    Path((group_id, slot_id, banner_id)): Path<(String, String, String)>,
) -> Result<StatusCode, ApiError> {
    let key = parse_rotation_key(&banner_id, &slot_id, &group_id)?;
    state.bounded(state.service.delete_rotation(key)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /groups/{group_id}/slots/{slot_id}/banners/{banner_id}/click — Register a click.
#[utoipa::path(
    post,
    path = "/groups/{group_id}/slots/{slot_id}/banners/{banner_id}/click",
    tag = "Rotations",
    params(
        ("group_id" = String, Path, description = "Group UUID"),
        ("slot_id" = String, Path, description = "Slot UUID"),
        ("banner_id" = String, Path, description = "Banner UUID"),
    ),
    responses(
        (status = 204, description = "Click registered"),
        (status = 400, description = "Malformed identifier", body = crate::error::ErrorResponse),
        (status = 404, description = "No live rotation for the triple", body = crate::error::ErrorResponse),
    )
)]
pub async fn register_click(
    State(state): State<AppState>,
    Path((group_id, slot_id, banner_id)): Path<(String, String, String)>,
) -> Result<StatusCode, ApiError> {
    let key = parse_rotation_key(&banner_id, &slot_id, &group_id)?;
    state.bounded(state.service.register_click(key)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /groups/{group_id}/slots/{slot_id}/banners/{banner_id}/stats — Event history of a rotation.
#[utoipa::path(
    get,
    path = "/groups/{group_id}/slots/{slot_id}/banners/{banner_id}/stats",
    tag = "Rotations",
    params(
        ("group_id" = String, Path, description = "Group UUID"),
        ("slot_id" = String, Path, description = "Slot UUID"),
        ("banner_id" = String, Path, description = "Banner UUID"),
    ),
    responses(
        (status = 200, description = "Events in append order", body = [Event]),
        (status = 400, description = "Malformed identifier", body = crate::error::ErrorResponse),
        (status = 404, description = "Rotation not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn get_stats(
    State(state): State<AppState>,
    Path((group_id, slot_id, banner_id)): Path<(String, String, String)>,
) -> Result<Json<Vec<Event>>, ApiError> {
    let key = parse_rotation_key(&banner_id, &slot_id, &group_id)?;
    let events = state.bounded(state.service.get_stats(key)).await?;
    Ok(Json(events))
}

/// GET /groups/{group_id}/slots/{slot_id}/banner — Pick a banner to show and record the show.
#[utoipa::path(
    get,
    path = "/groups/{group_id}/slots/{slot_id}/banner",
    tag = "Rotations",
    params(
        ("group_id" = String, Path, description = "Group UUID"),
        ("slot_id" = String, Path, description = "Slot UUID"),
    ),
    responses(
        (status = 200, description = "Chosen rotation after the show was recorded", body = Rotation),
        (status = 400, description = "Malformed identifier", body = crate::error::ErrorResponse),
        (status = 409, description = "No candidate rotations", body = crate::error::ErrorResponse),
        (status = 503, description = "Store unavailable", body = crate::error::ErrorResponse),
    )
)]
pub async fn choose_banner(
    State(state): State<AppState>,
    Path((group_id, slot_id)): Path<(String, String)>,
) -> Result<Json<Rotation>, ApiError> {
    let slot_id = parse_id(EntityKind::Slot, &slot_id)?;
    let group_id = parse_id(EntityKind::Group, &group_id)?;
    let rotation = state
        .bounded(state.service.choose_banner(slot_id, group_id))
        .await?;
    Ok(Json(rotation))
}

// ─── Operations ─────────────────────────────────────────────────────────

/// GET /version — Build information.
#[utoipa::path(
    get,
    path = "/version",
    tag = "Operations",
    responses((status = 200, description = "Service name and version", body = VersionResponse))
)]
pub async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        name: "banner-rotator".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /health — Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Operations",
    responses((status = 200, description = "Service is running", body = HealthResponse))
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET /ready — Readiness probe. Returns 200 only when the store answers.
#[utoipa::path(
    get,
    path = "/ready",
    tag = "Operations",
    responses(
        (status = 200, description = "Store reachable"),
        (status = 503, description = "Store unreachable"),
    )
)]
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.bounded(state.service.health_check()).await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// GET /live — Liveness probe.
#[utoipa::path(
    get,
    path = "/live",
    tag = "Operations",
    responses((status = 200, description = "Process is alive"))
)]
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}
