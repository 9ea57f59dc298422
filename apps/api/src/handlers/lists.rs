use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use prospectra_application::{CreateListInput, ListScope, ListScopeQuery};
use prospectra_core::Principal;
use prospectra_domain::{ListId, ListVisibility};
use uuid::Uuid;

use crate::dto::{CompanyListResponse, CreateListRequest};
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, serde::Deserialize)]
pub struct CompanyListsQuery {
    pub scope: Option<String>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub q: Option<String>,
}

pub async fn list_company_lists_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<CompanyListsQuery>,
) -> ApiResult<Json<Vec<CompanyListResponse>>> {
    let scope = match query.scope.as_deref() {
        None => ListScope::Mine,
        Some(value) => ListScope::parse_transport(value)?,
    };

    let lists = state
        .company_list_service
        .list_lists(
            &principal,
            ListScopeQuery {
                scope,
                page: query.page.unwrap_or(1),
                limit: query.limit.unwrap_or(25),
                search: query.q,
            },
        )
        .await?
        .into_iter()
        .map(CompanyListResponse::from)
        .collect();

    Ok(Json(lists))
}

pub async fn create_company_list_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CreateListRequest>,
) -> ApiResult<(StatusCode, Json<CompanyListResponse>)> {
    let visibility = payload.visibility.parse::<ListVisibility>()?;
    let list = state
        .company_list_service
        .create_list(
            &principal,
            CreateListInput {
                name: payload.name,
                visibility,
                is_shared: payload.is_shared,
                smart_criteria: payload.smart_criteria.map(Into::into),
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(CompanyListResponse::from(list))))
}

pub async fn get_company_list_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(list_id): Path<Uuid>,
) -> ApiResult<Json<CompanyListResponse>> {
    let list = state
        .company_list_service
        .get_list(&principal, ListId::from_uuid(list_id))
        .await?;

    Ok(Json(CompanyListResponse::from(list)))
}

pub async fn delete_company_list_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(list_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .company_list_service
        .delete_list(&principal, ListId::from_uuid(list_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
