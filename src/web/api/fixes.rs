use axum::{extract::State, Json};
use chrono::Utc;

use crate::location::Fix;
use crate::session::{CurrentLocation, FixOutcome};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::auth::{ApiClient, AppState};
use crate::web::config::Permission;

#[utoipa::path(
    post,
    path = "/api/fixes",
    request_body = Fix,
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Arbiter verdict and appended waypoint", body = FixOutcome),
        (status = 400, description = "Coordinates out of range", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Insufficient permissions", body = ErrorResponse)
    ),
    tag = "location"
)]
pub async fn submit_fix(
    State(state): State<AppState>,
    client: ApiClient,
    Json(fix): Json<Fix>,
) -> ApiResult<Json<FixOutcome>> {
    client.require(Permission::SubmitFixes)?;
    validate_fix(&fix).map_err(ApiError::Validation)?;

    let outcome = state.recorder.submit(fix).await?;
    Ok(Json(outcome))
}

#[utoipa::path(
    get,
    path = "/api/location",
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Best known fix and whether it is still current", body = CurrentLocation),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "location"
)]
pub async fn current_location(
    State(state): State<AppState>,
    client: ApiClient,
) -> ApiResult<Json<CurrentLocation>> {
    client.require(Permission::ReadTrack)?;
    Ok(Json(state.recorder.current_location(Utc::now())))
}

fn validate_fix(fix: &Fix) -> Result<(), String> {
    if !(-90.0..=90.0).contains(&fix.latitude) {
        return Err(format!("latitude out of range: {}", fix.latitude));
    }
    if !(-180.0..=180.0).contains(&fix.longitude) {
        return Err(format!("longitude out of range: {}", fix.longitude));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Provider;

    #[test]
    fn test_validate_fix() {
        let fix = Fix::new(45.0, 7.0, Provider::Gps, Utc::now());
        assert!(validate_fix(&fix).is_ok());

        let bad_lat = Fix::new(91.0, 7.0, Provider::Gps, Utc::now());
        assert!(validate_fix(&bad_lat).is_err());

        let bad_lon = Fix::new(45.0, f64::NAN, Provider::Gps, Utc::now());
        assert!(validate_fix(&bad_lon).is_err());
    }
}
