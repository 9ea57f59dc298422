use axum::Json;
use axum::extract::{Extension, Path, State};
use prospectra_application::AddCompaniesInput;
use prospectra_core::{AppResult, Principal};
use prospectra_domain::{CompanyId, ListId};
use uuid::Uuid;

use crate::dto::{
    AddCompaniesRequest, AddCompaniesResponse, RemoveCompaniesRequest, RemoveCompaniesResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn add_companies_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(list_id): Path<Uuid>,
    Json(payload): Json<AddCompaniesRequest>,
) -> ApiResult<Json<AddCompaniesResponse>> {
    let outcome = state
        .membership_service
        .add_companies(
            &principal,
            ListId::from_uuid(list_id),
            AddCompaniesInput {
                company_ids: parse_ids(payload.company_ids)?,
                note: payload.note,
            },
        )
        .await?;

    Ok(Json(AddCompaniesResponse::from(outcome)))
}

pub async fn remove_companies_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(list_id): Path<Uuid>,
    Json(payload): Json<RemoveCompaniesRequest>,
) -> ApiResult<Json<RemoveCompaniesResponse>> {
    let outcome = state
        .membership_service
        .remove_companies(
            &principal,
            ListId::from_uuid(list_id),
            parse_ids(payload.company_ids)?,
        )
        .await?;

    Ok(Json(RemoveCompaniesResponse::from(outcome)))
}

fn parse_ids(values: Vec<String>) -> AppResult<Vec<CompanyId>> {
    values.into_iter().map(CompanyId::new).collect()
}
