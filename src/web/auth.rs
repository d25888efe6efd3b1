use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;

use crate::config::Config;
use crate::session::RecorderHandle;

use super::config::Permission;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub recorder: RecorderHandle,
}

/// Caller identified by a configured API key.
#[derive(Debug, Clone)]
pub struct ApiClient {
    pub name: String,
    pub permissions: HashSet<Permission>,
}

impl ApiClient {
    pub fn require(&self, permission: Permission) -> Result<(), PermissionError> {
        if self.permissions.contains(&permission) {
            Ok(())
        } else {
            log::debug!("Client {} lacks {:?}", self.name, permission);
            Err(PermissionError)
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    MissingAuth,
    InvalidFormat,
    InvalidKey,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingAuth => "Missing Authorization header",
            AuthError::InvalidFormat => "Invalid Authorization format",
            AuthError::InvalidKey => "Invalid API key",
        };
        (StatusCode::UNAUTHORIZED, Json(json!({ "error": message }))).into_response()
    }
}

#[derive(Debug)]
pub struct PermissionError;

impl IntoResponse for PermissionError {
    fn into_response(self) -> Response {
        (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "Insufficient permissions" })),
        )
            .into_response()
    }
}

impl FromRequestParts<AppState> for ApiClient {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let key = bearer_key(&parts.headers)?;
        let api_key = state.config.find_api_key(key).ok_or(AuthError::InvalidKey)?;

        Ok(ApiClient {
            name: api_key.name.clone(),
            permissions: api_key.permissions.clone(),
        })
    }
}

fn bearer_key(headers: &HeaderMap) -> Result<&str, AuthError> {
    headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuth)?
        .to_str()
        .map_err(|_| AuthError::InvalidFormat)?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .ok_or(AuthError::InvalidFormat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_key() {
        assert_eq!(bearer_key(&headers("Bearer abc123")), Ok("abc123"));
        assert_eq!(bearer_key(&HeaderMap::new()), Err(AuthError::MissingAuth));
        assert_eq!(bearer_key(&headers("Basic abc")), Err(AuthError::InvalidFormat));
        assert_eq!(bearer_key(&headers("Bearer ")), Err(AuthError::InvalidFormat));
    }

    #[test]
    fn test_require_permission() {
        let client = ApiClient {
            name: "phone".into(),
            permissions: [Permission::SubmitFixes].into_iter().collect(),
        };
        assert!(client.require(Permission::SubmitFixes).is_ok());
        assert!(client.require(Permission::ControlRecording).is_err());
    }
}
