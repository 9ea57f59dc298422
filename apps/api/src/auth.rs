use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use prospectra_core::{AppError, PermissionGrant, Principal, Role};
use serde::Deserialize;
use tower_sessions::Session;

use crate::dto::MeResponse;
use crate::error::ApiResult;
use crate::state::AppState;

pub const SESSION_PRINCIPAL_KEY: &str = "principal";
pub const SESSION_CREATED_AT_KEY: &str = "session_created_at";

#[derive(Debug, Deserialize)]
pub struct BootstrapRoleRequest {
    pub name: String,
    pub grants: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct BootstrapRequest {
    pub subject: String,
    pub token: String,
    #[serde(default)]
    pub roles: Vec<BootstrapRoleRequest>,
}

/// Establishes a development session for a subject.
///
/// The identity-provider integration lives outside this service; callers
/// holding the shared bootstrap token exchange a subject and role grants
/// for an authenticated session.
pub async fn bootstrap_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<BootstrapRequest>,
) -> ApiResult<StatusCode> {
    if payload.token != state.bootstrap_token {
        return Err(AppError::Unauthorized("invalid bootstrap token".to_owned()).into());
    }

    if payload.subject.trim().is_empty() {
        return Err(AppError::Validation("subject must not be empty".to_owned()).into());
    }

    let organization_id = state.bootstrap_organization_id.unwrap_or_default();
    let roles = payload
        .roles
        .into_iter()
        .map(|role| {
            Role::from_grants(
                role.name,
                role.grants
                    .iter()
                    .map(|key| PermissionGrant::parse(key))
                    .collect(),
            )
        })
        .collect();
    let principal = Principal::new(payload.subject, organization_id, roles);

    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session id: {error}")))?;

    session
        .insert(SESSION_PRINCIPAL_KEY, &principal)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session principal: {error}"))
        })?;

    session
        .insert(SESSION_CREATED_AT_KEY, chrono::Utc::now().timestamp())
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session creation time: {error}"))
        })?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn me_handler(Extension(principal): Extension<Principal>) -> Json<MeResponse> {
    Json(MeResponse::from(&principal))
}

pub async fn logout_handler(session: Session) -> ApiResult<StatusCode> {
    session
        .delete()
        .await
        .map_err(|error| AppError::Internal(format!("failed to clear session: {error}")))?;

    Ok(StatusCode::NO_CONTENT)
}
