use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

use super::api::error::ErrorResponse;
use super::api::track::{DurationRequest, StepCountRequest};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::fixes::submit_fix,
        super::api::fixes::current_location,
        super::api::track::start_recording,
        super::api::track::stop_recording,
        super::api::track::recording_mode,
        super::api::track::track_summary,
        super::api::track::track_waypoints,
        super::api::track::set_step_count,
        super::api::track::set_duration,
    ),
    components(
        schemas(
            ErrorResponse,
            StepCountRequest,
            DurationRequest,
            crate::location::Fix,
            crate::location::Provider,
            crate::location::Verdict,
            crate::location::AcceptReason,
            crate::location::RejectReason,
            crate::session::FixOutcome,
            crate::session::CurrentLocation,
            crate::session::RecorderMode,
            crate::track::TrackSummary,
            crate::track::Waypoint,
        )
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Trackbook API",
        description = "Submit location fixes and read the recorded track",
        version = "0.1.0"
    ),
    tags(
        (name = "location", description = "Raw fixes and the best known location"),
        (name = "recording", description = "Recording control"),
        (name = "track", description = "Recorded track")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}
