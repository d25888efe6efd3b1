use axum::{extract::State, http::StatusCode, Json};
use chrono::Duration;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::session::RecorderMode;
use crate::track::{TrackSummary, Waypoint};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::auth::{ApiClient, AppState};
use crate::web::config::Permission;

#[derive(Debug, Deserialize, ToSchema)]
pub struct StepCountRequest {
    pub step_count: f64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DurationRequest {
    pub seconds: i64,
}

#[utoipa::path(
    post,
    path = "/api/recording/start",
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Recording started", body = TrackSummary),
        (status = 409, description = "Recording already running", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "recording"
)]
pub async fn start_recording(
    State(state): State<AppState>,
    client: ApiClient,
) -> ApiResult<Json<TrackSummary>> {
    client.require(Permission::ControlRecording)?;
    Ok(Json(state.recorder.start_recording().await?))
}

#[utoipa::path(
    post,
    path = "/api/recording/stop",
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Recording stopped", body = TrackSummary),
        (status = 409, description = "No recording running", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "recording"
)]
pub async fn stop_recording(
    State(state): State<AppState>,
    client: ApiClient,
) -> ApiResult<Json<TrackSummary>> {
    client.require(Permission::ControlRecording)?;
    Ok(Json(state.recorder.stop_recording().await?))
}

#[utoipa::path(
    get,
    path = "/api/recording/mode",
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Recorder mode", body = RecorderMode),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "recording"
)]
pub async fn recording_mode(
    State(state): State<AppState>,
    client: ApiClient,
) -> ApiResult<Json<RecorderMode>> {
    client.require(Permission::ReadTrack)?;
    Ok(Json(state.recorder.mode()))
}

#[utoipa::path(
    get,
    path = "/api/track",
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Summary of the current or last track", body = TrackSummary),
        (status = 404, description = "Nothing recorded yet", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "track"
)]
pub async fn track_summary(
    State(state): State<AppState>,
    client: ApiClient,
) -> ApiResult<Json<TrackSummary>> {
    client.require(Permission::ReadTrack)?;
    state
        .recorder
        .track_summary()
        .map(Json)
        .ok_or(ApiError::NotFound("track_not_found"))
}

#[utoipa::path(
    get,
    path = "/api/track/waypoints",
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Waypoints in recording order", body = Vec<Waypoint>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "track"
)]
pub async fn track_waypoints(
    State(state): State<AppState>,
    client: ApiClient,
) -> ApiResult<Json<Vec<Waypoint>>> {
    client.require(Permission::ReadTrack)?;
    Ok(Json(state.recorder.waypoints()))
}

#[utoipa::path(
    put,
    path = "/api/track/steps",
    request_body = StepCountRequest,
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 204, description = "Step count stored"),
        (status = 400, description = "Invalid step count", body = ErrorResponse),
        (status = 404, description = "Nothing recorded yet", body = ErrorResponse)
    ),
    tag = "track"
)]
pub async fn set_step_count(
    State(state): State<AppState>,
    client: ApiClient,
    Json(request): Json<StepCountRequest>,
) -> ApiResult<StatusCode> {
    client.require(Permission::SubmitFixes)?;
    if !request.step_count.is_finite() || request.step_count < 0.0 {
        return Err(ApiError::Validation("step_count must be a non-negative number".into()));
    }
    state.recorder.set_step_count(request.step_count).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/api/track/duration",
    request_body = DurationRequest,
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 204, description = "Duration stored"),
        (status = 400, description = "Invalid duration", body = ErrorResponse),
        (status = 404, description = "Nothing recorded yet", body = ErrorResponse)
    ),
    tag = "track"
)]
pub async fn set_duration(
    State(state): State<AppState>,
    client: ApiClient,
    Json(request): Json<DurationRequest>,
) -> ApiResult<StatusCode> {
    client.require(Permission::SubmitFixes)?;
    let duration = Duration::try_seconds(request.seconds)
        .filter(|d| *d >= Duration::zero())
        .ok_or_else(|| ApiError::Validation("seconds must be a non-negative duration".into()))?;
    state.recorder.set_duration(duration).await?;
    Ok(StatusCode::NO_CONTENT)
}
