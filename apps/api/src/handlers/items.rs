use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use prospectra_application::ListItemsRequest;
use prospectra_core::Principal;
use prospectra_domain::{ListId, ScoreCriteria};
use uuid::Uuid;

use crate::dto::{ListItemsResponse, RankedCompanyResponse, ScoreCriteriaDto};
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItemsQueryParams {
    pub limit: Option<usize>,
    pub next_cursor: Option<String>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
    pub province: Option<String>,
    pub tag_key: Option<String>,
    pub tsic: Option<String>,
    pub q: Option<String>,
}

pub async fn list_items_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(list_id): Path<Uuid>,
    Query(query): Query<ListItemsQueryParams>,
) -> ApiResult<Json<ListItemsResponse>> {
    let page = state
        .item_query_service
        .list_items(
            &principal,
            ListId::from_uuid(list_id),
            ListItemsRequest {
                limit: query.limit,
                cursor: query.next_cursor,
                sort_by: query.sort_by,
                sort_dir: query.sort_dir,
                province: query.province,
                tag_key: query.tag_key,
                tsic: query.tsic,
                search: query.q,
            },
        )
        .await?;

    Ok(Json(ListItemsResponse::from(page)))
}

pub async fn ranked_items_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(list_id): Path<Uuid>,
    Json(payload): Json<ScoreCriteriaDto>,
) -> ApiResult<Json<Vec<RankedCompanyResponse>>> {
    let criteria = ScoreCriteria::from(payload);
    let ranked = state
        .item_query_service
        .ranked_items(&principal, ListId::from_uuid(list_id), &criteria)
        .await?
        .into_iter()
        .map(RankedCompanyResponse::from)
        .collect();

    Ok(Json(ranked))
}
